//! 외부 탐지 서비스 포트.
//!
//! 단일 외부 I/O 경계. 구현: `faceguard-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::analysis::AnalysisResult;
use crate::models::capture::CapturePayload;

/// 탐지 서비스 클라이언트
#[async_trait]
pub trait DetectionClient: Send + Sync {
    /// 크롭 이미지를 정확히 1회 제출하고 결과 반환.
    ///
    /// 재시도하지 않는다. 연결 실패는 `CoreError::Network`,
    /// 비-2xx 응답은 `CoreError::Service`.
    async fn analyze(&self, payload: &CapturePayload) -> Result<AnalysisResult, CoreError>;

    /// 호출 대상 엔드포인트 (안내 메시지용)
    fn endpoint(&self) -> &str;
}
