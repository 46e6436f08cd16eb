//! 프로세스 전역 영속 키-값 저장소 포트.
//!
//! 구현: `faceguard-storage` crate (rusqlite, 인메모리)

use async_trait::async_trait;

use crate::error::CoreError;

/// 키-값 저장소 (JSON 값)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 값 조회 (없으면 `None`)
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError>;

    /// 값 저장 (기존 값 덮어쓰기)
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), CoreError>;

    /// 값 삭제 (없어도 성공)
    async fn remove(&self, key: &str) -> Result<(), CoreError>;

    /// 값을 꺼내면서 삭제 (조회와 삭제가 하나의 원자적 단계)
    async fn take(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError>;
}
