//! 캡처 페이로드 모델.
//!
//! 전체 뷰포트 스크린샷과 선택 영역을 결합한 크롭 결과.
//! 크롭을 수행하는 컨텍스트가 일시적으로 소유하며 영속화하지 않는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::region::Region;

/// 특권 캡처 이미지 포맷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    /// 무손실 PNG
    #[default]
    Png,
}

impl CaptureFormat {
    /// MIME 타입
    pub fn mime_type(self) -> &'static str {
        match self {
            CaptureFormat::Png => "image/png",
        }
    }
}

/// 크롭된 이미지 페이로드
#[derive(Clone)]
pub struct CapturePayload {
    /// 무손실 인코딩된 크롭 이미지 (PNG)
    pub image_data: Vec<u8>,
    /// 크롭에 사용된 영역
    pub region: Region,
    /// 원본 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl CapturePayload {
    /// 이미지 포맷 (현재 PNG 고정)
    pub fn format(&self) -> CaptureFormat {
        CaptureFormat::Png
    }
}

impl std::fmt::Debug for CapturePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePayload")
            .field("image_bytes", &self.image_data.len())
            .field("region", &self.region)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}
