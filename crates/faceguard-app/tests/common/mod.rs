//! 통합 테스트 공용 픽스처.
//!
//! 실제 코디네이터/팝업/오버레이/핸드오프에 가짜 캡처와 페이지를 연결한다.
//! 탐지 서비스는 mockito 서버가 대신한다.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faceguard_core::config::{DetectionConfig, HandoffConfig};
use faceguard_core::error::CoreError;
use faceguard_core::models::capture::CaptureFormat;
use faceguard_core::models::message::{MessageAck, RuntimeMessage, TabId};
use faceguard_core::models::region::{Point, MIN_DIM};
use faceguard_core::ports::capture::ViewportCapture;
use faceguard_core::ports::kv::KeyValueStore;
use faceguard_core::ports::page::{PageHost, PageMessenger};
use faceguard_network::HttpDetectionClient;
use faceguard_overlay::{HeadlessSurface, OverlayInput, OverlayState, SelectionOverlay};
use faceguard_relay::popup::PopupDeps;
use faceguard_relay::{
    Coordinator, CoordinatorDeps, CoordinatorEvent, CoordinatorHandle, RuntimeHandle, TransientUi,
};
use faceguard_storage::HandoffStore;
use image::{DynamicImage, Rgba, RgbaImage};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};

pub const TAB: TabId = TabId(1);

/// 단색 PNG 스크린샷
pub fn screenshot(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([40, 80, 120, 255])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// 고정 스크린샷을 돌려주는 캡처
pub struct StaticCapture {
    pub bytes: Vec<u8>,
    pub calls: AtomicUsize,
}

impl StaticCapture {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            bytes: screenshot(w, h),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ViewportCapture for StaticCapture {
    async fn capture_visible(
        &self,
        _tab: TabId,
        _format: CaptureFormat,
    ) -> Result<Vec<u8>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}

/// 오버레이 하나를 실행하는 테스트 탭
pub struct TestPage {
    runtime: Mutex<Option<RuntimeHandle>>,
    overlay: Mutex<Option<SelectionOverlay<HeadlessSurface>>>,
    pub received: Mutex<Vec<RuntimeMessage>>,
}

impl TestPage {
    pub fn new() -> Self {
        Self {
            runtime: Mutex::new(None),
            overlay: Mutex::new(None),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn connect(&self, runtime: RuntimeHandle) {
        *self.runtime.lock() = Some(runtime);
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.lock().is_some()
    }

    pub fn input(&self, input: OverlayInput) -> Result<OverlayState, CoreError> {
        let mut slot = self.overlay.lock();
        let overlay = slot
            .as_mut()
            .ok_or_else(|| CoreError::Injection("no overlay".to_string()))?;
        let result = overlay.handle(input);
        if overlay.state().is_terminal() {
            assert!(overlay.surface().is_clean());
            *slot = None;
        }
        result
    }

    /// 드래그 후 확인 대화상자 상태
    pub fn drag(&self, from: (i32, i32), to: (i32, i32)) -> Result<OverlayState, CoreError> {
        self.input(OverlayInput::PointerDown(Point::new(from.0, from.1)))?;
        self.input(OverlayInput::PointerMove(Point::new(to.0, to.1)))?;
        self.input(OverlayInput::PointerUp(Point::new(to.0, to.1)))
    }

    pub fn results_received(&self) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|m| matches!(m, RuntimeMessage::AnalysisResults { .. }))
            .count()
    }
}

#[async_trait]
impl PageHost for TestPage {
    async fn active_tab(&self) -> Option<TabId> {
        Some(TAB)
    }

    async fn inject_overlay(&self, tab: TabId) -> Result<(), CoreError> {
        let runtime = self
            .runtime
            .lock()
            .clone()
            .ok_or_else(|| CoreError::Injection("not connected".to_string()))?;
        let overlay =
            SelectionOverlay::inject(HeadlessSurface::new(), Arc::new(runtime.for_page(tab)), MIN_DIM);
        if let Some(mut previous) = self.overlay.lock().replace(overlay) {
            previous.dismiss();
        }
        Ok(())
    }

    async fn remove_overlay(&self, _tab: TabId) -> Result<(), CoreError> {
        if let Some(mut overlay) = self.overlay.lock().take() {
            overlay.dismiss();
        }
        Ok(())
    }
}

#[async_trait]
impl PageMessenger for TestPage {
    async fn send_to_tab(
        &self,
        _tab: TabId,
        message: RuntimeMessage,
    ) -> Result<MessageAck, CoreError> {
        self.received.lock().push(message);
        Ok(MessageAck::RECEIVED)
    }
}

/// 실행 중인 전체 구성
pub struct Harness {
    pub page: Arc<TestPage>,
    pub capture: Arc<StaticCapture>,
    pub handoff: HandoffStore,
    pub popup_deps: PopupDeps,
    pub coordinator: CoordinatorHandle,
    shutdown: watch::Sender<bool>,
}

impl Harness {
    pub fn start(detection: DetectionConfig, kv: Arc<dyn KeyValueStore>) -> Self {
        let handoff = HandoffStore::new(kv, &HandoffConfig::default());
        let detection = Arc::new(HttpDetectionClient::new(&detection).unwrap());
        let page = Arc::new(TestPage::new());
        let capture = Arc::new(StaticCapture::new(400, 300));

        let (shutdown, shutdown_rx) = watch::channel(false);
        let coordinator = Coordinator::new(
            CoordinatorDeps {
                capture: capture.clone(),
                detection: detection.clone(),
                pages: page.clone(),
                handoff: handoff.clone(),
            },
            CaptureFormat::Png,
        )
        .spawn(shutdown_rx);
        page.connect(coordinator.runtime());

        let popup_deps = PopupDeps {
            pages: page.clone(),
            detection,
            handoff: handoff.clone(),
            real_label: "Real".to_string(),
        };

        Self {
            page,
            capture,
            handoff,
            popup_deps,
            coordinator,
            shutdown,
        }
    }

    pub async fn open_popup(&self) -> TransientUi {
        TransientUi::open(self.popup_deps.clone(), self.coordinator.connect_popup()).await
    }

    pub fn events(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.coordinator.subscribe()
    }

    pub async fn finish(self) {
        let _ = self.shutdown.send(true);
        self.coordinator.join().await.unwrap();
    }
}

/// 세션 종료 이벤트 대기
pub async fn terminal_event(events: &mut broadcast::Receiver<CoordinatorEvent>) -> CoordinatorEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = events.recv().await.unwrap();
            if event.is_terminal() {
                return event;
            }
        }
    })
    .await
    .unwrap()
}

/// mockito 서버를 가리키는 탐지 설정
pub fn detection_config(server_url: &str) -> DetectionConfig {
    DetectionConfig {
        endpoint: format!("{server_url}/analyze/"),
        request_timeout_ms: 5_000,
        ..DetectionConfig::default()
    }
}
