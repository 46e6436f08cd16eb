//! # faceguard-relay
//!
//! 컨텍스트 간 메시지 릴레이.
//!
//! - [`channel`] — 런타임 메시지 채널 (mpsc + 즉시 응답)
//! - [`coordinator`] — 백그라운드 코디네이터: 캡처, 크롭, 제출, 결과 전달, 핸드오프 기록
//! - [`popup`] — 일시적 UI(팝업) 컨트롤러와 결과 표시 모델

pub mod channel;
pub mod coordinator;
pub mod popup;

pub use channel::{Envelope, PageRuntimePort, RuntimeHandle};
pub use coordinator::{
    Coordinator, CoordinatorDeps, CoordinatorEvent, CoordinatorHandle, PopupLink, SessionOutcome,
};
pub use popup::{ResultsView, StatusKind, StatusLine, TransientUi};
