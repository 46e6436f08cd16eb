//! 페이지 → 코디네이터 런타임 채널 포트.
//!
//! 오버레이는 단일 스레드 이벤트 핸들러에서 메시지를 보내므로
//! 응답을 기다리지 않는 동기 전송만 제공한다.
//! 구현: `faceguard-relay` crate (tokio mpsc)

use crate::error::CoreError;
use crate::models::message::RuntimeMessage;

/// 코디네이터로의 단방향 메시지 전송
pub trait RuntimePort: Send + Sync {
    /// 메시지 전송 (응답 대기 없음). 수신 측이 종료되었으면 `CoreError::Channel`.
    fn post(&self, message: RuntimeMessage) -> Result<(), CoreError>;
}
