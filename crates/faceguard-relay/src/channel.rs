//! 런타임 메시지 채널.
//!
//! 각 컨텍스트는 메모리를 공유하지 않고 이 채널로만 코디네이터와 통신한다.
//! 코디네이터는 모든 메시지에 `{received: true}`를 즉시 응답하고,
//! 실제 결과는 나중에 별도 메시지로 전달한다.

use faceguard_core::error::CoreError;
use faceguard_core::models::message::{MessageAck, MessageSender, RuntimeMessage, TabId};
use faceguard_core::ports::runtime::RuntimePort;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// 기본 수신함 크기
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// 코디네이터 수신함 항목
#[derive(Debug)]
pub struct Envelope {
    pub message: RuntimeMessage,
    pub sender: MessageSender,
    /// 즉시 응답 채널 (응답을 기다리지 않는 전송이면 `None`)
    pub reply: Option<oneshot::Sender<MessageAck>>,
}

/// 코디네이터로 메시지를 보내는 핸들 (복제 가능)
#[derive(Debug, Clone)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Envelope>,
}

impl RuntimeHandle {
    /// 핸들과 수신함 생성
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// 메시지 전송 후 즉시 응답 대기
    pub async fn send_message(
        &self,
        message: RuntimeMessage,
        sender: MessageSender,
    ) -> Result<MessageAck, CoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let kind = message.kind();
        self.tx
            .send(Envelope {
                message,
                sender,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| CoreError::Channel("코디네이터 수신함 닫힘".to_string()))?;

        let ack = reply_rx
            .await
            .map_err(|_| CoreError::Channel(format!("{kind} 응답 없이 종료")))?;
        debug!("{kind} 응답 수신: {ack:?}");
        Ok(ack)
    }

    /// 응답을 기다리지 않는 전송 (동기 컨텍스트용)
    pub fn post(&self, message: RuntimeMessage, sender: MessageSender) -> Result<(), CoreError> {
        let kind = message.kind();
        self.tx
            .try_send(Envelope {
                message,
                sender,
                reply: None,
            })
            .map_err(|e| CoreError::Channel(format!("{kind} 전송 실패: {e}")))
    }

    /// 특정 탭의 페이지 컨텍스트용 포트
    pub fn for_page(&self, tab: TabId) -> PageRuntimePort {
        PageRuntimePort {
            handle: self.clone(),
            tab,
        }
    }
}

/// 페이지(오버레이) 컨텍스트의 `RuntimePort` 구현
#[derive(Debug, Clone)]
pub struct PageRuntimePort {
    handle: RuntimeHandle,
    tab: TabId,
}

impl PageRuntimePort {
    pub fn tab(&self) -> TabId {
        self.tab
    }
}

impl RuntimePort for PageRuntimePort {
    fn post(&self, message: RuntimeMessage) -> Result<(), CoreError> {
        self.handle.post(message, MessageSender::Page(self.tab))
    }
}
