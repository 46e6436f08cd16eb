//! 페이지(탭) 호스트 포트.
//!
//! 오버레이 주입 능력과 페이지로의 메시지 전달을 추상화한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::message::{MessageAck, RuntimeMessage, TabId};

/// 탭 조회 + 오버레이 주입 능력 (팝업이 사용)
#[async_trait]
pub trait PageHost: Send + Sync {
    /// 현재 창의 활성 탭
    async fn active_tab(&self) -> Option<TabId>;

    /// 선택 오버레이 주입 (시작 요청당 1회)
    async fn inject_overlay(&self, tab: TabId) -> Result<(), CoreError>;

    /// 주입된 오버레이 강제 제거 (남아 있지 않아도 성공)
    async fn remove_overlay(&self, tab: TabId) -> Result<(), CoreError>;
}

/// 페이지 컨텍스트로 메시지 전달 (코디네이터가 사용)
#[async_trait]
pub trait PageMessenger: Send + Sync {
    /// 탭에 메시지 전송. 페이지가 이동/종료되었으면 에러.
    async fn send_to_tab(&self, tab: TabId, message: RuntimeMessage)
        -> Result<MessageAck, CoreError>;
}
