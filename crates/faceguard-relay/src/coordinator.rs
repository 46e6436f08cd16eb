//! 백그라운드 코디네이터.
//!
//! 한 번 생성되어 프로세스 수명 동안 유지되는 단일 인스턴스.
//! 특권 캡처, 크롭, 탐지 서비스 제출, 결과 전달, 핸드오프 기록을 모두 소유한다.
//!
//! # 세션 파이프라인
//!
//! ```text
//! FACE_SELECTED → 등록 → [파이프라인 잠금] → 취소 확인 → 캡처(1회) → 크롭
//!              → 취소 확인 → 제출(1회) → 페이지 알림 + 팝업 전달 + 핸드오프 기록
//! ```
//!
//! 세션은 직렬로 처리되며, 처리 중에도 수신함은 계속 응답한다.
//! 제출 전 취소는 캡처/제출을 막고, 제출 후 취소는 효과가 없다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use faceguard_core::error::CoreError;
use faceguard_core::models::analysis::AnalysisResult;
use faceguard_core::models::capture::{CaptureFormat, CapturePayload};
use faceguard_core::models::message::{MessageAck, MessageSender, RuntimeMessage, TabId};
use faceguard_core::models::region::Region;
use faceguard_core::ports::capture::ViewportCapture;
use faceguard_core::ports::detection::DetectionClient;
use faceguard_core::ports::page::PageMessenger;
use faceguard_storage::HandoffStore;
use faceguard_vision::RegionProcessor;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channel::{Envelope, RuntimeHandle, DEFAULT_INBOX_CAPACITY};

/// 이벤트 버스 크기
const EVENT_CAPACITY: usize = 64;

/// 코디네이터 이벤트 (팝업 상태 표시, 테스트, CLI 대기용)
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// 확정 영역 수신, 세션 등록
    SessionStarted {
        session: Uuid,
        tab: TabId,
        region: Region,
    },
    /// 뷰포트 캡처 완료
    Captured { session: Uuid, bytes: usize },
    /// 탐지 서비스 제출 시작 (이후 취소 불가)
    Submitted { session: Uuid },
    /// 결과 전달 완료. 핸드오프 기록 실패 시 `handoff_error`에 사유
    Delivered {
        session: Uuid,
        result: AnalysisResult,
        handoff_error: Option<String>,
    },
    /// 제출 전 실패 (핸드오프 없음)
    Failed { session: Uuid, reason: String },
    /// 제출 전 취소
    Cancelled { session: Uuid },
}

impl CoordinatorEvent {
    pub fn session(&self) -> Uuid {
        match self {
            CoordinatorEvent::SessionStarted { session, .. }
            | CoordinatorEvent::Captured { session, .. }
            | CoordinatorEvent::Submitted { session }
            | CoordinatorEvent::Delivered { session, .. }
            | CoordinatorEvent::Failed { session, .. }
            | CoordinatorEvent::Cancelled { session } => *session,
        }
    }

    /// 세션 종료 이벤트 여부
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CoordinatorEvent::Delivered { .. }
                | CoordinatorEvent::Failed { .. }
                | CoordinatorEvent::Cancelled { .. }
        )
    }
}

/// 세션 처리 결과
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// 제출 완료 (에러 결과 포함)
    Completed(AnalysisResult),
    /// 제출 전 실패
    Failed(String),
    /// 제출 전 취소
    Cancelled,
}

/// 코디네이터 의존성 (포트)
#[derive(Clone)]
pub struct CoordinatorDeps {
    pub capture: Arc<dyn ViewportCapture>,
    pub detection: Arc<dyn DetectionClient>,
    pub pages: Arc<dyn PageMessenger>,
    pub handoff: HandoffStore,
}

/// 대기 중인 세션 (취소 플래그)
struct PendingSession {
    tab: TabId,
    cancelled: Arc<AtomicBool>,
}

/// 열린 팝업으로의 전달 슬롯 (최대 1개)
#[derive(Default)]
struct PopupSlot {
    tx: Mutex<Option<mpsc::UnboundedSender<RuntimeMessage>>>,
}

impl PopupSlot {
    fn connect(&self) -> mpsc::UnboundedReceiver<RuntimeMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tx.lock() = Some(tx);
        rx
    }

    /// 팝업이 열려 있으면 전달. 닫혔으면 슬롯을 비운다.
    fn forward(&self, message: RuntimeMessage) -> bool {
        let mut slot = self.tx.lock();
        let Some(tx) = slot.as_ref() else {
            return false;
        };
        let kind = message.kind();
        if tx.send(message).is_err() {
            debug!("팝업 닫힘: {kind} 전달 생략");
            *slot = None;
            return false;
        }
        true
    }
}

struct Shared {
    deps: CoordinatorDeps,
    processor: RegionProcessor,
    format: CaptureFormat,
    pending: Mutex<HashMap<Uuid, PendingSession>>,
    pipeline: tokio::sync::Mutex<()>,
    events: broadcast::Sender<CoordinatorEvent>,
    popup: PopupSlot,
}

/// 백그라운드 코디네이터
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// 코디네이터 생성
    pub fn new(deps: CoordinatorDeps, format: CaptureFormat) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                deps,
                processor: RegionProcessor::new(),
                format,
                pending: Mutex::new(HashMap::new()),
                pipeline: tokio::sync::Mutex::new(()),
                events,
                popup: PopupSlot::default(),
            }),
        }
    }

    /// 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.shared.events.subscribe()
    }

    /// 수신함 루프를 백그라운드 태스크로 시작
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> CoordinatorHandle {
        let (runtime, inbox) = RuntimeHandle::channel(DEFAULT_INBOX_CAPACITY);
        let coordinator = self.clone();
        let task = tokio::spawn(async move { coordinator.run(inbox, shutdown).await });
        CoordinatorHandle {
            runtime,
            coordinator: self,
            task,
        }
    }

    /// 수신함 루프.
    ///
    /// 모든 메시지에 즉시 응답하고, 영역 확정은 별도 태스크로 처리하여
    /// 세션 진행 중에도 취소 메시지를 받을 수 있게 한다.
    /// 종료 시 대기 중인 세션을 취소하고 진행 중인 세션이 끝나길 기다린다.
    pub async fn run(self, mut inbox: mpsc::Receiver<Envelope>, mut shutdown: watch::Receiver<bool>) {
        let mut sessions = JoinSet::new();
        info!("코디네이터 시작");

        loop {
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else {
                        debug!("코디네이터 수신함 닫힘");
                        break;
                    };
                    self.dispatch(envelope, &mut sessions);
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        error!("세션 태스크 비정상 종료: {e}");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("코디네이터 종료 신호 수신");
                        break;
                    }
                }
            }
        }

        let cancelled = self.cancel_all();
        if cancelled > 0 {
            info!("대기 중인 세션 {cancelled}개 취소");
        }
        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                error!("세션 태스크 비정상 종료: {e}");
            }
        }
        info!("코디네이터 종료");
    }

    fn dispatch(&self, envelope: Envelope, sessions: &mut JoinSet<SessionOutcome>) {
        let Envelope {
            message,
            sender,
            reply,
        } = envelope;

        // 결과와 무관하게 항상 즉시 응답
        if let Some(reply) = reply {
            let _ = reply.send(MessageAck::RECEIVED);
        }

        debug!("메시지 수신: {} from {sender:?}", message.kind());

        match message {
            RuntimeMessage::FaceSelected { data } => match sender {
                MessageSender::Page(tab) => {
                    // 수신 즉시 등록하여 뒤따르는 STOP_SELECTION이 이 세션을 찾을 수 있게 한다
                    let region = data.region();
                    let (session, cancelled) = self.begin_session(region, tab);
                    let coordinator = self.clone();
                    sessions.spawn(async move {
                        coordinator
                            .run_session(session, region, tab, cancelled)
                            .await
                    });
                }
                MessageSender::Popup => {
                    warn!("팝업에서 온 FACE_SELECTED 무시 (탭 정보 없음)");
                }
            },
            RuntimeMessage::CancelSelection => {
                // 제출하지 않은 오버레이의 취소. 이미 확정된 세션은 그대로 진행
                if let Some(tab) = sender.tab() {
                    debug!("{tab} 오버레이 선택 취소, 팝업에 중계");
                }
                self.shared.popup.forward(RuntimeMessage::CancelSelection);
            }
            RuntimeMessage::StopSelection { tab_id } => {
                self.cancel_pending(tab_id);
            }
            RuntimeMessage::Unknown => {
                debug!("알 수 없는 메시지 타입 무시");
            }
            other => {
                debug!("코디네이터 대상이 아닌 메시지 무시: {}", other.kind());
            }
        }
    }

    /// 확정 영역 처리 — 세션당 캡처 1회, 제출 1회
    pub async fn handle_finalized_region(&self, region: Region, tab: TabId) -> SessionOutcome {
        let (session, cancelled) = self.begin_session(region, tab);
        self.run_session(session, region, tab, cancelled).await
    }

    /// 세션 등록 (취소 플래그 생성)
    fn begin_session(&self, region: Region, tab: TabId) -> (Uuid, Arc<AtomicBool>) {
        let session = Uuid::new_v4();
        let cancelled = self.register(session, tab);
        info!(%session, %tab, ?region, "세션 시작");
        self.publish(CoordinatorEvent::SessionStarted {
            session,
            tab,
            region,
        });
        (session, cancelled)
    }

    async fn run_session(
        &self,
        session: Uuid,
        region: Region,
        tab: TabId,
        cancelled: Arc<AtomicBool>,
    ) -> SessionOutcome {
        let _pipeline = self.shared.pipeline.lock().await;

        if cancelled.load(Ordering::SeqCst) {
            return self.finish_cancelled(session);
        }

        let screenshot = match self.capture_viewport(tab).await {
            Ok(bytes) => bytes,
            Err(e) => return self.finish_failed(session, e),
        };
        let captured_at = Utc::now();
        self.publish(CoordinatorEvent::Captured {
            session,
            bytes: screenshot.len(),
        });

        let payload = match self.shared.processor.process(&screenshot, region, captured_at) {
            Ok(payload) => payload,
            Err(e) => return self.finish_failed(session, e),
        };

        if cancelled.load(Ordering::SeqCst) {
            return self.finish_cancelled(session);
        }

        // 제출 이후에는 취소 대상에서 제외
        self.unregister(session);
        self.publish(CoordinatorEvent::Submitted { session });

        let result = self.submit_for_analysis(&payload).await;
        let handoff_error = match self.deliver_result(result.clone(), tab).await {
            Ok(()) => {
                info!(%session, error = result.is_error(), "세션 완료");
                None
            }
            Err(e) => {
                error!(%session, error = result.is_error(), "세션 완료, 핸드오프 기록 실패: {e}");
                Some(e.to_string())
            }
        };

        self.publish(CoordinatorEvent::Delivered {
            session,
            result: result.clone(),
            handoff_error,
        });
        SessionOutcome::Completed(result)
    }

    /// 특권 뷰포트 캡처 (세션당 정확히 1회)
    pub async fn capture_viewport(&self, tab: TabId) -> Result<Vec<u8>, CoreError> {
        let bytes = self
            .shared
            .deps
            .capture
            .capture_visible(tab, self.shared.format)
            .await?;
        debug!("{tab} 캡처 완료: {} bytes", bytes.len());
        Ok(bytes)
    }

    /// 탐지 서비스 제출 (정확히 1회, 재시도 없음).
    ///
    /// 제출 이후의 에러는 에러 결과로 정규화되어 동일한 전달 경로를 탄다.
    pub async fn submit_for_analysis(&self, payload: &CapturePayload) -> AnalysisResult {
        match self.shared.deps.detection.analyze(payload).await {
            Ok(result) => result,
            Err(e) => {
                if e.is_post_submission() {
                    warn!("탐지 실패: {e}");
                } else {
                    error!("탐지 요청 구성 실패: {e}");
                }
                AnalysisResult::from_error(&e)
            }
        }
    }

    /// 결과 전달.
    ///
    /// 페이지 알림과 팝업 전달은 최선 노력이며, 핸드오프 기록은 항상 수행한다.
    pub async fn deliver_result(&self, result: AnalysisResult, tab: TabId) -> Result<(), CoreError> {
        let message = RuntimeMessage::AnalysisResults {
            data: result.clone(),
        };

        match self.shared.deps.pages.send_to_tab(tab, message.clone()).await {
            Ok(_) => debug!("{tab} 결과 알림 전송"),
            Err(e) => warn!("{tab} 결과 알림 실패 (무시): {e}"),
        }

        if self.shared.popup.forward(message) {
            debug!("열린 팝업으로 결과 전달");
        }

        self.shared.deps.handoff.write(result).await?;
        Ok(())
    }

    /// 탭의 대기 세션 취소. 취소된 세션 수 반환.
    pub fn cancel_pending(&self, tab: TabId) -> usize {
        let pending = self.shared.pending.lock();
        let mut count = 0;
        for session in pending.values().filter(|s| s.tab == tab) {
            session.cancelled.store(true, Ordering::SeqCst);
            count += 1;
        }
        if count > 0 {
            info!("{tab} 대기 세션 {count}개 취소 표시");
        }
        count
    }

    /// 팝업 연결 (이전 연결은 대체)
    pub fn connect_popup(&self, runtime: RuntimeHandle) -> PopupLink {
        PopupLink {
            runtime,
            inbox: self.shared.popup.connect(),
        }
    }

    fn cancel_all(&self) -> usize {
        let pending = self.shared.pending.lock();
        for session in pending.values() {
            session.cancelled.store(true, Ordering::SeqCst);
        }
        pending.len()
    }

    fn register(&self, session: Uuid, tab: TabId) -> Arc<AtomicBool> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.shared.pending.lock().insert(
            session,
            PendingSession {
                tab,
                cancelled: cancelled.clone(),
            },
        );
        cancelled
    }

    fn unregister(&self, session: Uuid) {
        self.shared.pending.lock().remove(&session);
    }

    fn finish_cancelled(&self, session: Uuid) -> SessionOutcome {
        self.unregister(session);
        info!(%session, "세션 취소: 캡처/제출 생략");
        self.publish(CoordinatorEvent::Cancelled { session });
        SessionOutcome::Cancelled
    }

    fn finish_failed(&self, session: Uuid, error: CoreError) -> SessionOutcome {
        self.unregister(session);
        let reason = error.to_string();
        warn!(%session, "세션 실패: {reason}");
        self.shared.popup.forward(RuntimeMessage::SessionFailed {
            message: reason.clone(),
        });
        self.publish(CoordinatorEvent::Failed {
            session,
            reason: reason.clone(),
        });
        SessionOutcome::Failed(reason)
    }

    fn publish(&self, event: CoordinatorEvent) {
        // 구독자가 없어도 무시
        let _ = self.shared.events.send(event);
    }
}

/// 실행 중인 코디네이터 핸들
pub struct CoordinatorHandle {
    runtime: RuntimeHandle,
    coordinator: Coordinator,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// 런타임 채널 핸들
    pub fn runtime(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    /// 이벤트 구독
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.coordinator.subscribe()
    }

    /// 팝업 연결
    pub fn connect_popup(&self) -> PopupLink {
        self.coordinator.connect_popup(self.runtime.clone())
    }

    /// 수신함 루프 종료 대기 (종료 신호 이후)
    pub async fn join(self) -> Result<(), CoreError> {
        drop(self.runtime);
        self.task
            .await
            .map_err(|e| CoreError::Internal(format!("코디네이터 태스크 실패: {e}")))
    }
}

/// 팝업 ↔ 코디네이터 연결
pub struct PopupLink {
    /// 코디네이터로 보내는 채널
    pub runtime: RuntimeHandle,
    /// 코디네이터가 전달하는 메시지 (ANALYSIS_RESULTS, SESSION_FAILED, CANCEL_SELECTION)
    pub inbox: mpsc::UnboundedReceiver<RuntimeMessage>,
}
