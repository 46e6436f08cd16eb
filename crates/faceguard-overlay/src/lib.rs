//! # faceguard-overlay
//!
//! 페이지 컨텍스트에 주입되는 영역 선택 오버레이.
//! 드래그 제스처를 받아 선택 피드백을 그리고, 확인을 거쳐
//! 확정 영역 또는 취소를 코디네이터로 내보낸다.
//!
//! ## 모듈
//! - `state_machine`: IDLE → DRAGGING → CONFIRMING → {SUBMITTED | CANCELLED}
//! - `surface`: 헤드리스 오버레이 표면 (요소/리스너 추적)

pub mod state_machine;
pub mod surface;

pub use state_machine::{OverlayInput, OverlayState, SelectionOverlay};
pub use surface::HeadlessSurface;
