//! 헤드리스 페이지 호스트.
//!
//! 브라우저 탭 대신 프로세스 안에서 오버레이를 실행한다.
//! 탭마다 최대 하나의 오버레이를 유지하고, 결과 알림은 호스트 소유의 토스트로 표시한다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use faceguard_core::error::CoreError;
use faceguard_core::models::message::{MessageAck, RuntimeMessage, TabId};
use faceguard_core::ports::page::{PageHost, PageMessenger};
use faceguard_overlay::{HeadlessSurface, OverlayInput, OverlayState, SelectionOverlay};
use faceguard_relay::RuntimeHandle;
use parking_lot::Mutex;
use tracing::{debug, info};

/// 완료 토스트 문구
pub const TOAST_TEXT: &str = "Analysis Complete! Click the extension icon to see results";

/// 토스트 표시 시간
pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// 페이지 내 토스트
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub tab: TabId,
    pub text: String,
    pub shown_at: DateTime<Utc>,
}

impl Toast {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        let ttl = chrono::Duration::from_std(TOAST_TTL).unwrap_or_else(|_| chrono::Duration::seconds(5));
        now.signed_duration_since(self.shown_at) < ttl
    }
}

/// 헤드리스 페이지 호스트 — `PageHost` + `PageMessenger` 구현
pub struct HeadlessPageHost {
    active: Option<TabId>,
    min_dim: u32,
    runtime: Mutex<Option<RuntimeHandle>>,
    overlays: Mutex<HashMap<TabId, SelectionOverlay<HeadlessSurface>>>,
    toasts: Mutex<Vec<Toast>>,
}

impl HeadlessPageHost {
    /// 활성 탭 하나를 가진 호스트 생성
    pub fn new(active: Option<TabId>, min_dim: u32) -> Self {
        Self {
            active,
            min_dim,
            runtime: Mutex::new(None),
            overlays: Mutex::new(HashMap::new()),
            toasts: Mutex::new(Vec::new()),
        }
    }

    /// 오버레이가 메시지를 보낼 코디네이터 채널 연결
    pub fn connect(&self, runtime: RuntimeHandle) {
        *self.runtime.lock() = Some(runtime);
    }

    /// 탭의 오버레이에 입력 전달.
    ///
    /// 오버레이가 종료 상태가 되면 탭에서 제거한다.
    pub fn dispatch(&self, tab: TabId, input: OverlayInput) -> Result<OverlayState, CoreError> {
        let mut overlays = self.overlays.lock();
        let overlay = overlays
            .get_mut(&tab)
            .ok_or_else(|| CoreError::Injection(format!("{tab}에 오버레이 없음")))?;

        let result = overlay.handle(input);
        let state = overlay.state();
        if state.is_terminal() {
            let clean = overlay.surface().is_clean();
            overlays.remove(&tab);
            debug!("{tab} 오버레이 종료 ({state:?}), 잔여 요소 없음={clean}");
        }
        result
    }

    /// 오버레이 존재 여부
    pub fn has_overlay(&self, tab: TabId) -> bool {
        self.overlays.lock().contains_key(&tab)
    }

    /// 오버레이의 마지막 안내 문구
    pub fn overlay_notice(&self, tab: TabId) -> Option<String> {
        self.overlays
            .lock()
            .get(&tab)
            .and_then(|o| o.surface().notice().map(str::to_string))
    }

    /// `now` 시점에 보이는 토스트
    pub fn visible_toasts_at(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut toasts = self.toasts.lock();
        toasts.retain(|t| t.is_visible_at(now));
        toasts.clone()
    }

    fn ensure_tab(&self, tab: TabId) -> Result<(), CoreError> {
        if self.active == Some(tab) {
            Ok(())
        } else {
            Err(CoreError::Channel(format!("{tab}을(를) 찾을 수 없음")))
        }
    }
}

#[async_trait]
impl PageHost for HeadlessPageHost {
    async fn active_tab(&self) -> Option<TabId> {
        self.active
    }

    async fn inject_overlay(&self, tab: TabId) -> Result<(), CoreError> {
        self.ensure_tab(tab)
            .map_err(|e| CoreError::Injection(e.to_string()))?;
        let runtime = self
            .runtime
            .lock()
            .clone()
            .ok_or_else(|| CoreError::Injection("런타임 채널 미연결".to_string()))?;

        let overlay = SelectionOverlay::inject(
            HeadlessSurface::new(),
            Arc::new(runtime.for_page(tab)),
            self.min_dim,
        );

        // 탭당 하나: 기존 오버레이는 메시지 없이 제거
        if let Some(mut previous) = self.overlays.lock().insert(tab, overlay) {
            previous.dismiss();
            debug!("{tab} 기존 오버레이 교체");
        }
        info!("{tab} 오버레이 주입");
        Ok(())
    }

    async fn remove_overlay(&self, tab: TabId) -> Result<(), CoreError> {
        if let Some(mut overlay) = self.overlays.lock().remove(&tab) {
            overlay.dismiss();
            info!("{tab} 오버레이 제거");
        }
        Ok(())
    }
}

#[async_trait]
impl PageMessenger for HeadlessPageHost {
    async fn send_to_tab(
        &self,
        tab: TabId,
        message: RuntimeMessage,
    ) -> Result<MessageAck, CoreError> {
        self.ensure_tab(tab)?;

        if let RuntimeMessage::AnalysisResults { .. } = message {
            self.toasts.lock().push(Toast {
                tab,
                text: TOAST_TEXT.to_string(),
                shown_at: Utc::now(),
            });
            debug!("{tab} 완료 토스트 표시");
        }
        Ok(MessageAck::RECEIVED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceguard_core::models::analysis::AnalysisResult;
    use faceguard_core::models::message::MessageSender;
    use faceguard_core::models::region::Point;

    fn connected_host() -> (HeadlessPageHost, tokio::sync::mpsc::Receiver<faceguard_relay::Envelope>) {
        let host = HeadlessPageHost::new(Some(TabId(1)), 50);
        let (runtime, inbox) = RuntimeHandle::channel(8);
        host.connect(runtime);
        (host, inbox)
    }

    #[tokio::test]
    async fn confirmed_selection_posts_face_selected() {
        let (host, mut inbox) = connected_host();
        host.inject_overlay(TabId(1)).await.unwrap();

        host.dispatch(TabId(1), OverlayInput::PointerDown(Point::new(50, 50)))
            .unwrap();
        host.dispatch(TabId(1), OverlayInput::PointerUp(Point::new(150, 200)))
            .unwrap();
        let state = host.dispatch(TabId(1), OverlayInput::Confirm).unwrap();

        assert_eq!(state, OverlayState::Submitted);
        assert!(!host.has_overlay(TabId(1)));

        let env = inbox.recv().await.unwrap();
        assert_eq!(env.sender, MessageSender::Page(TabId(1)));
        assert!(matches!(env.message, RuntimeMessage::FaceSelected { .. }));
    }

    #[tokio::test]
    async fn reinjection_replaces_overlay_silently() {
        let (host, mut inbox) = connected_host();
        host.inject_overlay(TabId(1)).await.unwrap();
        host.inject_overlay(TabId(1)).await.unwrap();
        assert!(host.has_overlay(TabId(1)));

        host.remove_overlay(TabId(1)).await.unwrap();
        assert!(!host.has_overlay(TabId(1)));
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn small_selection_leaves_notice() {
        let (host, _inbox) = connected_host();
        host.inject_overlay(TabId(1)).await.unwrap();

        host.dispatch(TabId(1), OverlayInput::PointerDown(Point::new(10, 10)))
            .unwrap();
        let err = host
            .dispatch(TabId(1), OverlayInput::PointerUp(Point::new(20, 20)))
            .unwrap_err();

        assert!(matches!(err, CoreError::MinimumSize { .. }));
        assert!(host.has_overlay(TabId(1)));
        assert!(host
            .overlay_notice(TabId(1))
            .unwrap()
            .starts_with("Selection too small"));
    }

    #[tokio::test]
    async fn results_show_toast_for_five_seconds() {
        let (host, _inbox) = connected_host();
        host.send_to_tab(
            TabId(1),
            RuntimeMessage::AnalysisResults {
                data: AnalysisResult::labeled("Real", 0.9),
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        let visible = host.visible_toasts_at(now);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].text, TOAST_TEXT);
        assert!(host
            .visible_toasts_at(now + chrono::Duration::seconds(6))
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_tab_is_rejected() {
        let (host, _inbox) = connected_host();
        assert!(host.inject_overlay(TabId(2)).await.is_err());
        assert!(host
            .send_to_tab(TabId(2), RuntimeMessage::CancelSelection)
            .await
            .is_err());
    }
}
