//! 결과 핸드오프 저장소.
//!
//! 코디네이터가 완료된 결과(에러 결과 포함)를 단일 레코드로 기록하고,
//! 다음에 열리는 팝업이 한 번만 읽어 간다.
//!
//! - 쓰기는 항상 기존 레코드를 덮어쓴다 (마지막 기록 우선)
//! - 읽기는 신선 여부와 관계없이 레코드를 지운다 (1회 소비)
//! - 신선도 윈도우를 넘긴 레코드는 표시하지 않는다

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use faceguard_core::config::HandoffConfig;
use faceguard_core::error::CoreError;
use faceguard_core::models::analysis::AnalysisResult;
use faceguard_core::models::handoff::HandoffRecord;
use faceguard_core::ports::kv::KeyValueStore;
use tracing::{debug, info, warn};

/// 결과 핸드오프 저장소
#[derive(Clone)]
pub struct HandoffStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    window: Duration,
}

impl HandoffStore {
    /// 설정으로부터 저장소 생성
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &HandoffConfig) -> Self {
        let window = Duration::from_std(config.freshness_window())
            .unwrap_or_else(|_| Duration::days(365));
        Self {
            kv,
            key: config.storage_key.clone(),
            window,
        }
    }

    /// 신선도 윈도우
    pub fn window(&self) -> Duration {
        self.window
    }

    /// 결과 기록 (현재 시각)
    pub async fn write(&self, result: AnalysisResult) -> Result<HandoffRecord, CoreError> {
        self.write_at(result, Utc::now()).await
    }

    /// 결과 기록 (지정 시각)
    pub async fn write_at(
        &self,
        result: AnalysisResult,
        stored_at: DateTime<Utc>,
    ) -> Result<HandoffRecord, CoreError> {
        let record = HandoffRecord::at(result, stored_at);
        self.kv
            .set(&self.key, serde_json::to_value(&record)?)
            .await?;
        info!(
            key = %self.key,
            error = record.result.is_error(),
            "핸드오프 레코드 기록"
        );
        Ok(record)
    }

    /// 신선한 결과가 있으면 반환 (현재 시각 기준)
    pub async fn read_if_fresh(&self) -> Result<Option<AnalysisResult>, CoreError> {
        self.read_if_fresh_at(Utc::now()).await
    }

    /// 신선한 결과가 있으면 반환.
    ///
    /// 레코드가 있으면 결과와 무관하게 삭제한다.
    pub async fn read_if_fresh_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<AnalysisResult>, CoreError> {
        let Some(value) = self.kv.take(&self.key).await? else {
            debug!("핸드오프 레코드 없음");
            return Ok(None);
        };

        let record: HandoffRecord = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("손상된 핸드오프 레코드 폐기: {e}");
                return Ok(None);
            }
        };

        if record.is_fresh_at(now, self.window) {
            debug!("신선한 핸드오프 레코드 소비 (저장 시각 {})", record.stored_at);
            Ok(Some(record.result))
        } else {
            debug!("오래된 핸드오프 레코드 폐기 (저장 시각 {})", record.stored_at);
            Ok(None)
        }
    }
}
