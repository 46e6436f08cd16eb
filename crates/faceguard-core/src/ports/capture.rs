//! 특권 뷰포트 캡처 포트.
//!
//! 코디네이터 컨텍스트에서만 사용 가능하다. 페이지 코드는 접근 불가.
//! 구현: `faceguard-vision` crate (xcap, 스크린샷 파일)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::capture::CaptureFormat;
use crate::models::message::TabId;

/// 보이는 뷰포트 캡처
#[async_trait]
pub trait ViewportCapture: Send + Sync {
    /// 탭의 보이는 영역 전체를 캡처하여 인코딩된 이미지 바이트 반환.
    ///
    /// 호스트가 거부하거나 탭이 닫힌/이동한 경우 `CoreError::Capture`.
    async fn capture_visible(&self, tab: TabId, format: CaptureFormat)
        -> Result<Vec<u8>, CoreError>;
}
