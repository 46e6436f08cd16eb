//! SQLite 키-값 저장소.
//!
//! `KeyValueStore` 포트 구현. 프로세스 재시작 후에도 값이 유지된다.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use faceguard_core::error::CoreError;
use faceguard_core::ports::kv::KeyValueStore;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::{debug, info};

use crate::migration;

/// SQLite 키-값 저장소 — `KeyValueStore` 포트 구현
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// 파일 기반 저장소 생성 (상위 디렉토리는 호출자가 준비)
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::Storage(format!("SQLite 열기 실패: {e}")))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            ",
        )
        .map_err(|e| CoreError::Storage(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::Storage(format!("인메모리 SQLite 생성 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::Storage(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::Storage(format!("값 조회 실패: {e}")))?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CoreError> {
        let text = serde_json::to_string(&value)?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, text],
        )
        .map_err(|e| CoreError::Storage(format!("값 저장 실패: {e}")))?;

        debug!("키 저장: {key} ({} bytes)", text.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let removed = conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(|e| CoreError::Storage(format!("값 삭제 실패: {e}")))?;

        debug!("키 삭제: {key} ({removed}건)");
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| CoreError::Internal(format!("잠금 획득 실패: {e}")))?;

        let raw: Option<String> = conn
            .query_row(
                "DELETE FROM kv_store WHERE key = ?1 RETURNING value",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| CoreError::Storage(format!("값 꺼내기 실패: {e}")))?;

        debug!("키 꺼내기: {key} (존재={})", raw.is_some());
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }
}
