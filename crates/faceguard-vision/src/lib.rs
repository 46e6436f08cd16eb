//! # faceguard-vision
//!
//! 코디네이터 측 이미지 처리 크레이트.
//! 특권 뷰포트 캡처(xcap, 스크린샷 파일)와
//! 확정 영역 크롭 + 무손실 PNG 인코딩을 담당한다.

pub mod capture;
pub mod crop;

pub use capture::{FileCapture, ScreenCapture};
pub use crop::RegionProcessor;
