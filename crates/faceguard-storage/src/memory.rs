//! 인메모리 키-값 저장소.
//!
//! 테스트와 영속화가 필요 없는 실행(`--ephemeral`)에서 사용.

use std::collections::HashMap;

use async_trait::async_trait;
use faceguard_core::error::CoreError;
use faceguard_core::ports::kv::KeyValueStore;
use parking_lot::RwLock;
use serde_json::Value;

/// 인메모리 저장소 — `KeyValueStore` 포트 구현
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 키 수
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.entries.write().remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.entries.write().remove(key))
    }
}
