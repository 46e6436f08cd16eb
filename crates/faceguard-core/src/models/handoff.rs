//! 결과 핸드오프 레코드 모델.
//!
//! 팝업이 닫힌 뒤 완료된 결과를 다음 팝업 열림 시 전달하기 위한 단일 레코드.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisResult;

/// 기본 신선도 윈도우 (5분)
pub const DEFAULT_FRESHNESS_SECS: u64 = 300;

/// 미래 저장 시각 허용 오차 (시계 보정)
pub const MAX_CLOCK_SKEW_SECS: i64 = 5;

/// 영속 저장소에 기록되는 핸드오프 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffRecord {
    /// 탐지 결과 (에러 결과 포함)
    pub result: AnalysisResult,
    /// 저장 시각
    pub stored_at: DateTime<Utc>,
}

impl HandoffRecord {
    /// 현재 시각으로 레코드 생성
    pub fn new(result: AnalysisResult) -> Self {
        Self::at(result, Utc::now())
    }

    /// 지정 시각으로 레코드 생성
    pub fn at(result: AnalysisResult, stored_at: DateTime<Utc>) -> Self {
        Self { result, stored_at }
    }

    /// `-skew < now - stored_at < window` 인지 여부.
    ///
    /// 허용 오차보다 미래에 저장된 레코드는 신선하지 않다.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        age < window && age > -Duration::seconds(MAX_CLOCK_SKEW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_boundary_is_exclusive() {
        let stored = Utc::now();
        let record = HandoffRecord::at(AnalysisResult::labeled("Real", 0.9), stored);
        let window = Duration::seconds(DEFAULT_FRESHNESS_SECS as i64);

        assert!(record.is_fresh_at(stored + Duration::seconds(299), window));
        assert!(!record.is_fresh_at(stored + window, window));
        assert!(!record.is_fresh_at(stored + Duration::minutes(6), window));
    }

    #[test]
    fn future_stored_at_is_not_fresh() {
        let now = Utc::now();
        let window = Duration::seconds(DEFAULT_FRESHNESS_SECS as i64);

        // 시계가 뒤로 간 경우: 약간의 오차는 허용
        let skewed = HandoffRecord::at(
            AnalysisResult::labeled("Real", 0.9),
            now + Duration::seconds(2),
        );
        assert!(skewed.is_fresh_at(now, window));

        // 먼 미래의 레코드는 영원히 신선하지 않도록 거부
        let future = HandoffRecord::at(
            AnalysisResult::labeled("Fake", 0.9),
            now + Duration::days(1),
        );
        assert!(!future.is_fresh_at(now, window));
        assert!(!future.is_fresh_at(now + Duration::hours(23), window));
    }

    #[test]
    fn serializes_camel_case() {
        let record = HandoffRecord::new(AnalysisResult::failure("boom"));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("storedAt").is_some());
        assert_eq!(json["result"]["error"], "boom");
    }
}
