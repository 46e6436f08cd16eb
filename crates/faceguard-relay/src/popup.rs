//! 일시적 UI(팝업) 컨트롤러.
//!
//! 팝업은 열릴 때마다 새로 만들어지고, 닫히면 상태가 모두 사라진다.
//! 열릴 때 핸드오프 저장소에서 최근 결과를 한 번 읽어 표시하고,
//! 선택 세션을 시작/중단하며, 직접 보유한 크롭 이미지를 분석할 수도 있다.

use std::sync::Arc;

use faceguard_core::error::CoreError;
use faceguard_core::models::analysis::AnalysisResult;
use faceguard_core::models::capture::CapturePayload;
use faceguard_core::models::message::{MessageSender, RuntimeMessage, TabId};
use faceguard_core::ports::detection::DetectionClient;
use faceguard_core::ports::page::PageHost;
use faceguard_storage::HandoffStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::coordinator::PopupLink;

pub const STATUS_READY: &str = "Ready to select a face";
pub const STATUS_COMPLETE: &str = "Analysis complete!";
pub const STATUS_SELECTING: &str = "Selection active - click and drag to select a face";
pub const STATUS_STOPPED: &str = "Selection stopped";
pub const STATUS_ANALYZING: &str = "Analyzing for deepfakes...";
pub const STATUS_NO_TAB: &str = "No active tab found";
pub const STATUS_NO_FACE: &str = "No face selected to analyze";
pub const STATUS_SERVER_ERROR: &str = "Server error: service temporarily unavailable";

/// 상태 줄 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Loading,
    Success,
    Warning,
    Error,
}

/// 팝업 상태 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    fn new(text: impl Into<String>, kind: StatusKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Real,
    Deepfake,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Real => "REAL FACE",
            Verdict::Deepfake => "DEEPFAKE DETECTED",
        }
    }
}

/// 신뢰도 수준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// 백분율 기준 분류 (≥80 High, ≥50 Medium)
    pub fn from_percent(percent: i64) -> Self {
        if percent >= 80 {
            ConfidenceLevel::High
        } else if percent >= 50 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::Low => "Low",
        }
    }
}

/// 결과 패널 표시 모델
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub verdict: Option<Verdict>,
    /// 반올림된 백분율과 수준
    pub confidence: Option<(i64, ConfidenceLevel)>,
    pub error: Option<String>,
}

impl ResultsView {
    /// 결과에서 표시 모델 생성. 라벨이 `real_label`과 같으면 Real.
    pub fn from_result(result: &AnalysisResult, real_label: &str) -> Self {
        let verdict = result.result.as_deref().map(|label| {
            if label == real_label {
                Verdict::Real
            } else {
                Verdict::Deepfake
            }
        });
        let confidence = result.probability.map(|p| {
            let percent = (p * 100.0).round() as i64;
            (percent, ConfidenceLevel::from_percent(percent))
        });

        Self {
            verdict,
            confidence,
            error: result.error.clone(),
        }
    }

    /// 표시 줄
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(verdict) = self.verdict {
            lines.push(verdict.label().to_string());
        }
        if let Some((percent, level)) = self.confidence {
            lines.push(format!("Confidence: {percent}% ({})", level.label()));
        }
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
        }
        lines
    }
}

/// 시작/중단 버튼 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub stop_enabled: bool,
}

impl Controls {
    const IDLE: Self = Self {
        start_enabled: true,
        stop_enabled: false,
    };
    const SELECTING: Self = Self {
        start_enabled: false,
        stop_enabled: true,
    };
}

/// 팝업 의존성
#[derive(Clone)]
pub struct PopupDeps {
    pub pages: Arc<dyn PageHost>,
    pub detection: Arc<dyn DetectionClient>,
    pub handoff: HandoffStore,
    /// "진짜"로 판정되는 라벨
    pub real_label: String,
}

/// 팝업 컨트롤러
pub struct TransientUi {
    deps: PopupDeps,
    link: PopupLink,
    status: StatusLine,
    results: Option<ResultsView>,
    controls: Controls,
    selecting: Option<TabId>,
    held: Option<CapturePayload>,
}

impl TransientUi {
    /// 팝업 열기 — 신선한 핸드오프 결과가 있으면 표시
    pub async fn open(deps: PopupDeps, link: PopupLink) -> Self {
        let mut ui = Self {
            deps,
            link,
            status: StatusLine::new(STATUS_READY, StatusKind::Info),
            results: None,
            controls: Controls::IDLE,
            selecting: None,
            held: None,
        };

        match ui.deps.handoff.read_if_fresh().await {
            Ok(Some(result)) => {
                info!("이전 세션 결과 표시");
                ui.show_result(&result);
            }
            Ok(None) => debug!("표시할 핸드오프 결과 없음"),
            Err(e) => warn!("핸드오프 조회 실패: {e}"),
        }
        ui
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn results(&self) -> Option<&ResultsView> {
        self.results.as_ref()
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// 선택 중인 탭
    pub fn selecting(&self) -> Option<TabId> {
        self.selecting
    }

    /// 선택 세션 시작 — 활동 탭에 오버레이 주입
    pub async fn start_selection(&mut self) -> Result<Option<TabId>, CoreError> {
        let Some(tab) = self.deps.pages.active_tab().await else {
            self.set_status(STATUS_NO_TAB, StatusKind::Error);
            return Ok(None);
        };

        if let Err(e) = self.deps.pages.inject_overlay(tab).await {
            self.set_status(
                format!("Failed to start selection: {e}"),
                StatusKind::Error,
            );
            return Err(e);
        }

        self.selecting = Some(tab);
        self.controls = Controls::SELECTING;
        self.set_status(STATUS_SELECTING, StatusKind::Loading);
        info!("{tab} 선택 시작");
        Ok(Some(tab))
    }

    /// 선택 세션 중단 — 오버레이 제거 + 대기 세션 취소 요청
    pub async fn stop_selection(&mut self) -> Result<(), CoreError> {
        let tab = match self.selecting.take() {
            Some(tab) => Some(tab),
            None => self.deps.pages.active_tab().await,
        };

        if let Some(tab) = tab {
            if let Err(e) = self.deps.pages.remove_overlay(tab).await {
                self.set_status(format!("Failed to stop selection: {e}"), StatusKind::Error);
                return Err(e);
            }
            self.link
                .runtime
                .send_message(RuntimeMessage::StopSelection { tab_id: tab }, MessageSender::Popup)
                .await?;
        }

        self.controls = Controls::IDLE;
        self.set_status(STATUS_STOPPED, StatusKind::Warning);
        Ok(())
    }

    /// 코디네이터가 전달한 메시지 하나를 기다려 처리
    pub async fn next_message(&mut self) -> Option<RuntimeMessage> {
        let message = self.link.inbox.recv().await?;
        self.handle_message(message.clone()).await;
        Some(message)
    }

    /// 이미 도착한 메시지를 모두 처리 (대기 없음)
    pub async fn drain_messages(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let message = match self.link.inbox.try_recv() {
                Ok(message) => message,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            };
            self.handle_message(message).await;
            handled += 1;
        }
        handled
    }

    async fn handle_message(&mut self, message: RuntimeMessage) {
        match message {
            RuntimeMessage::CancelSelection => {
                // 오버레이는 이미 스스로 해제됨. 확정된 다른 세션은 건드리지 않는다
                if let Some(tab) = self.selecting.take() {
                    debug!("{tab} 오버레이에서 선택 취소");
                }
                self.controls = Controls::IDLE;
                self.set_status(STATUS_STOPPED, StatusKind::Warning);
            }
            RuntimeMessage::AnalysisResults { data } => {
                self.selecting = None;
                self.controls = Controls::IDLE;
                self.show_result(&data);
            }
            RuntimeMessage::SessionFailed { message } => {
                self.selecting = None;
                self.controls = Controls::IDLE;
                self.set_status(format!("Analysis failed: {message}"), StatusKind::Error);
            }
            other => debug!("팝업이 처리하지 않는 메시지: {}", other.kind()),
        }
    }

    /// 직접 분석할 크롭 이미지 보관
    pub fn set_selection(&mut self, payload: CapturePayload) {
        debug!("분석 대상 보관: {payload:?}");
        self.held = Some(payload);
    }

    /// 보관 중인 크롭 이미지를 직접 분석 (핸드오프 기록 없음)
    pub async fn analyze_selected(&mut self) -> Option<AnalysisResult> {
        if self.held.is_none() {
            self.set_status(STATUS_NO_FACE, StatusKind::Error);
            return None;
        }

        self.set_status(STATUS_ANALYZING, StatusKind::Loading);
        let payload = self.held.as_ref()?;
        let outcome = self.deps.detection.analyze(payload).await;
        match outcome {
            Ok(result) => {
                self.show_result(&result);
                Some(result)
            }
            Err(e) => {
                let text = self.error_guidance(&e);
                warn!("팝업 분석 실패: {e}");
                self.set_status(text, StatusKind::Error);
                None
            }
        }
    }

    fn error_guidance(&self, error: &CoreError) -> String {
        match error {
            CoreError::Network { endpoint, .. } => format!(
                "Unable to connect to deepfake detection service. Make sure it is running at {endpoint}"
            ),
            CoreError::Service { status: 500, .. } => STATUS_SERVER_ERROR.to_string(),
            other => format!("Analysis failed: {other}"),
        }
    }

    fn show_result(&mut self, result: &AnalysisResult) {
        self.results = Some(ResultsView::from_result(result, &self.deps.real_label));
        self.set_status(STATUS_COMPLETE, StatusKind::Success);
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = StatusLine::new(text, kind);
        debug!("팝업 상태: {}", self.status.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RuntimeHandle;
    use async_trait::async_trait;
    use chrono::Utc;
    use faceguard_core::config::HandoffConfig;
    use faceguard_core::models::region::Region;
    use faceguard_storage::MemoryKeyValueStore;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakePages {
        active: Option<TabId>,
        injected: Mutex<Vec<TabId>>,
        removed: Mutex<Vec<TabId>>,
    }

    #[async_trait]
    impl PageHost for FakePages {
        async fn active_tab(&self) -> Option<TabId> {
            self.active
        }

        async fn inject_overlay(&self, tab: TabId) -> Result<(), CoreError> {
            self.injected.lock().push(tab);
            Ok(())
        }

        async fn remove_overlay(&self, tab: TabId) -> Result<(), CoreError> {
            self.removed.lock().push(tab);
            Ok(())
        }
    }

    struct FakeDetection(fn() -> Result<AnalysisResult, CoreError>);

    #[async_trait]
    impl DetectionClient for FakeDetection {
        async fn analyze(&self, _payload: &CapturePayload) -> Result<AnalysisResult, CoreError> {
            (self.0)()
        }

        fn endpoint(&self) -> &str {
            "http://127.0.0.1:8080/analyze/"
        }
    }

    struct Harness {
        pages: Arc<FakePages>,
        handoff: HandoffStore,
        forward: mpsc::UnboundedSender<RuntimeMessage>,
        coordinator_inbox: mpsc::Receiver<crate::channel::Envelope>,
        deps: PopupDeps,
        link: Option<PopupLink>,
    }

    fn harness(
        active: Option<TabId>,
        detection: fn() -> Result<AnalysisResult, CoreError>,
    ) -> Harness {
        let pages = Arc::new(FakePages {
            active,
            ..FakePages::default()
        });
        let handoff = HandoffStore::new(
            Arc::new(MemoryKeyValueStore::new()),
            &HandoffConfig::default(),
        );
        let (runtime, coordinator_inbox) = RuntimeHandle::channel(8);
        let (forward, inbox) = mpsc::unbounded_channel();
        let deps = PopupDeps {
            pages: pages.clone(),
            detection: Arc::new(FakeDetection(detection)),
            handoff: handoff.clone(),
            real_label: "Real".to_string(),
        };
        Harness {
            pages,
            handoff,
            forward,
            coordinator_inbox,
            deps,
            link: Some(PopupLink { runtime, inbox }),
        }
    }

    impl Harness {
        async fn open(&mut self) -> TransientUi {
            let link = self.link.take().unwrap();
            TransientUi::open(self.deps.clone(), link).await
        }

        /// 코디네이터 대역 — 메시지 1개를 받아 즉시 응답
        async fn ack_one(&mut self) -> RuntimeMessage {
            let env = self.coordinator_inbox.recv().await.unwrap();
            if let Some(reply) = env.reply {
                reply
                    .send(faceguard_core::models::message::MessageAck::RECEIVED)
                    .unwrap();
            }
            env.message
        }
    }

    fn real() -> Result<AnalysisResult, CoreError> {
        Ok(AnalysisResult::labeled("Real", 0.93))
    }

    fn payload() -> CapturePayload {
        CapturePayload {
            image_data: vec![1, 2, 3],
            region: Region {
                x: 0,
                y: 0,
                width: 50,
                height: 50,
            },
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn results_view_classification() {
        let view = ResultsView::from_result(&AnalysisResult::labeled("Real", 0.934), "Real");
        assert_eq!(view.verdict, Some(Verdict::Real));
        assert_eq!(view.confidence, Some((93, ConfidenceLevel::High)));

        let view = ResultsView::from_result(&AnalysisResult::labeled("Fake", 0.5), "Real");
        assert_eq!(view.verdict, Some(Verdict::Deepfake));
        assert_eq!(view.confidence, Some((50, ConfidenceLevel::Medium)));

        let view = ResultsView::from_result(&AnalysisResult::labeled("Fake", 0.796), "Real");
        assert_eq!(view.confidence, Some((80, ConfidenceLevel::High)));
    }

    #[test]
    fn failure_result_renders_error_line() {
        let view = ResultsView::from_result(&AnalysisResult::failure("HTTP 500: overloaded"), "Real");
        assert_eq!(view.verdict, None);
        assert_eq!(
            view.lines(),
            vec![
                "Confidence: 0% (Low)".to_string(),
                "Error: HTTP 500: overloaded".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn open_shows_fresh_handoff_once() {
        let mut h = harness(Some(TabId(1)), real);
        h.handoff
            .write(AnalysisResult::labeled("Real", 0.93))
            .await
            .unwrap();

        let ui = h.open().await;
        assert_eq!(ui.status().text, STATUS_COMPLETE);
        assert_eq!(
            ui.results().unwrap().lines(),
            vec!["REAL FACE".to_string(), "Confidence: 93% (High)".to_string()]
        );

        // 소비됨
        assert!(h.handoff.read_if_fresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_without_handoff_is_idle() {
        let mut h = harness(Some(TabId(1)), real);
        let ui = h.open().await;
        assert_eq!(ui.status().text, STATUS_READY);
        assert!(ui.results().is_none());
        assert_eq!(ui.controls(), Controls::IDLE);
    }

    #[tokio::test]
    async fn start_selection_without_tab() {
        let mut h = harness(None, real);
        let mut ui = h.open().await;

        assert_eq!(ui.start_selection().await.unwrap(), None);
        assert_eq!(ui.status().text, STATUS_NO_TAB);
        assert_eq!(ui.status().kind, StatusKind::Error);
        assert!(h.pages.injected.lock().is_empty());
    }

    #[tokio::test]
    async fn start_then_stop_selection() {
        let mut h = harness(Some(TabId(4)), real);
        let mut ui = h.open().await;

        assert_eq!(ui.start_selection().await.unwrap(), Some(TabId(4)));
        assert_eq!(ui.status().text, STATUS_SELECTING);
        assert_eq!(ui.controls(), Controls::SELECTING);
        assert_eq!(h.pages.injected.lock().as_slice(), &[TabId(4)]);

        let (stopped, message) = tokio::join!(ui.stop_selection(), h.ack_one());
        stopped.unwrap();
        assert_eq!(message, RuntimeMessage::StopSelection { tab_id: TabId(4) });
        assert_eq!(h.pages.removed.lock().as_slice(), &[TabId(4)]);
        assert_eq!(ui.status().text, STATUS_STOPPED);
        assert_eq!(ui.controls(), Controls::IDLE);
    }

    #[tokio::test]
    async fn forwarded_cancel_stops_selection() {
        let mut h = harness(Some(TabId(2)), real);
        let mut ui = h.open().await;
        ui.start_selection().await.unwrap();

        h.forward.send(RuntimeMessage::CancelSelection).unwrap();
        assert_eq!(ui.drain_messages().await, 1);
        assert_eq!(ui.status().text, STATUS_STOPPED);
        assert_eq!(ui.controls(), Controls::IDLE);
        assert!(ui.selecting().is_none());

        // 코디네이터로 STOP_SELECTION을 다시 보내지 않는다
        assert!(h.coordinator_inbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn forwarded_results_are_displayed() {
        let mut h = harness(Some(TabId(2)), real);
        let mut ui = h.open().await;

        h.forward
            .send(RuntimeMessage::AnalysisResults {
                data: AnalysisResult::labeled("Fake", 0.42),
            })
            .unwrap();
        ui.next_message().await.unwrap();

        assert_eq!(ui.status().text, STATUS_COMPLETE);
        assert_eq!(
            ui.results().unwrap().lines(),
            vec![
                "DEEPFAKE DETECTED".to_string(),
                "Confidence: 42% (Low)".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn analyze_without_selection() {
        let mut h = harness(Some(TabId(1)), real);
        let mut ui = h.open().await;
        assert!(ui.analyze_selected().await.is_none());
        assert_eq!(ui.status().text, STATUS_NO_FACE);
    }

    #[tokio::test]
    async fn analyze_selected_success() {
        let mut h = harness(Some(TabId(1)), real);
        let mut ui = h.open().await;
        ui.set_selection(payload());

        let result = ui.analyze_selected().await.unwrap();
        assert_eq!(result.result.as_deref(), Some("Real"));
        assert_eq!(ui.status().text, STATUS_COMPLETE);
        // 팝업 자체 분석은 핸드오프를 남기지 않는다
        assert!(h.handoff.read_if_fresh().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn analyze_network_error_guidance() {
        fn unreachable() -> Result<AnalysisResult, CoreError> {
            Err(CoreError::Network {
                endpoint: "http://127.0.0.1:8080/analyze/".to_string(),
                message: "connection refused".to_string(),
            })
        }
        let mut h = harness(Some(TabId(1)), unreachable);
        let mut ui = h.open().await;
        ui.set_selection(payload());

        assert!(ui.analyze_selected().await.is_none());
        assert_eq!(
            ui.status().text,
            "Unable to connect to deepfake detection service. Make sure it is running at http://127.0.0.1:8080/analyze/"
        );
    }

    #[tokio::test]
    async fn analyze_server_error_guidance() {
        fn overloaded() -> Result<AnalysisResult, CoreError> {
            Err(CoreError::Service {
                status: 500,
                body: "overloaded".to_string(),
            })
        }
        let mut h = harness(Some(TabId(1)), overloaded);
        let mut ui = h.open().await;
        ui.set_selection(payload());

        assert!(ui.analyze_selected().await.is_none());
        assert_eq!(ui.status().text, STATUS_SERVER_ERROR);
        assert_eq!(ui.status().kind, StatusKind::Error);
    }
}
