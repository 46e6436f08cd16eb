//! 선택 오버레이 상태 머신.
//!
//! 상태: `Idle → Dragging → Confirming → {Submitted | Cancelled}`.
//! 단일 스레드 이벤트 구동. 입력 하나당 `handle` 한 번 호출되며 블로킹하지 않는다.
//! 종료 상태(Submitted/Cancelled)에 들어가면 표면의 모든 요소와 리스너를 제거한다.

use std::sync::Arc;

use faceguard_core::error::CoreError;
use faceguard_core::models::message::{RuntimeMessage, SelectionData};
use faceguard_core::models::region::{Point, Region};
use faceguard_core::ports::overlay::OverlaySurface;
use faceguard_core::ports::runtime::RuntimePort;
use tracing::{debug, info, warn};

/// 취소 키
pub const ESCAPE_KEY: &str = "Escape";

/// 오버레이 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// 주입 직후 / 최소 크기 거부 후 (드래그 가능)
    Idle,
    /// 드래그 중
    Dragging { origin: Point, current: Point },
    /// 확정 대기 (확인 대화상자 표시)
    Confirming { region: Region },
    /// 영역 제출 완료 (종료)
    Submitted,
    /// 취소됨 (종료)
    Cancelled,
}

impl OverlayState {
    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        matches!(self, OverlayState::Submitted | OverlayState::Cancelled)
    }
}

/// 오버레이 입력 이벤트
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayInput {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    /// 키 입력 (`KeyboardEvent.key`)
    KeyDown(String),
    /// 확인 버튼
    Confirm,
    /// 취소 버튼
    Cancel,
}

/// 최소 크기 미달 안내 문구
pub fn minimum_size_notice(min_dim: u32) -> String {
    format!(
        "Selection too small. Please select a larger area (minimum {min_dim}x{min_dim} pixels)."
    )
}

/// 선택 오버레이 — 한 번의 주입 수명 동안의 선택 세션
pub struct SelectionOverlay<S: OverlaySurface> {
    state: OverlayState,
    surface: S,
    runtime: Arc<dyn RuntimePort>,
    min_dim: u32,
}

impl<S: OverlaySurface> SelectionOverlay<S> {
    /// 페이지에 오버레이 주입 (표면 설치 후 Idle)
    pub fn inject(mut surface: S, runtime: Arc<dyn RuntimePort>, min_dim: u32) -> Self {
        surface.mount();
        info!("선택 오버레이 주입 (최소 {min_dim}px)");
        Self {
            state: OverlayState::Idle,
            surface,
            runtime,
            min_dim,
        }
    }

    /// 현재 상태
    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// 아직 종료되지 않았는지 여부
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    /// 오버레이 표면 참조
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// 현재 드래그 사각형 (Dragging일 때)
    pub fn current_rect(&self) -> Option<Region> {
        match self.state {
            OverlayState::Dragging { origin, current } => Some(Region::from_drag(origin, current)),
            _ => None,
        }
    }

    /// 입력 이벤트 처리.
    ///
    /// 최소 크기 미달로 포인터를 놓으면 `CoreError::MinimumSize`를 반환하고
    /// 오버레이는 드래그 가능한 Idle 상태로 남는다.
    pub fn handle(&mut self, input: OverlayInput) -> Result<OverlayState, CoreError> {
        if self.state.is_terminal() {
            debug!("종료된 오버레이 입력 무시: {input:?}");
            return Ok(self.state);
        }

        match (self.state, input) {
            (_, OverlayInput::KeyDown(key)) if key == ESCAPE_KEY => {
                self.cancel()?;
            }
            (_, OverlayInput::KeyDown(_)) => {}
            (OverlayState::Idle, OverlayInput::PointerDown(p)) => {
                self.state = OverlayState::Dragging {
                    origin: p,
                    current: p,
                };
                self.surface.show_selection(Region::from_drag(p, p), p);
            }
            (OverlayState::Dragging { origin, .. }, OverlayInput::PointerMove(p)) => {
                self.state = OverlayState::Dragging { origin, current: p };
                self.surface.show_selection(Region::from_drag(origin, p), p);
            }
            (OverlayState::Dragging { origin, .. }, OverlayInput::PointerUp(p)) => {
                self.surface.hide_selection();
                let rect = Region::from_drag(origin, p);
                match rect.finalize(self.min_dim) {
                    Ok(region) => {
                        debug!(
                            x = region.x,
                            y = region.y,
                            width = region.width,
                            height = region.height,
                            "선택 영역 확정 대기"
                        );
                        self.state = OverlayState::Confirming { region };
                        self.surface.show_confirmation(region);
                    }
                    Err(e) => {
                        warn!("선택 거부: {e}");
                        self.state = OverlayState::Idle;
                        self.surface.show_notice(&minimum_size_notice(self.min_dim));
                        return Err(e);
                    }
                }
            }
            (OverlayState::Confirming { region }, OverlayInput::Confirm) => {
                self.submit(region)?;
            }
            (_, OverlayInput::Cancel) => {
                self.cancel()?;
            }
            (state, input) => {
                debug!("상태 {state:?}에서 입력 무시: {input:?}");
            }
        }

        Ok(self.state)
    }

    /// 메시지 없이 오버레이 제거 (외부에서 선택 중단 시)
    pub fn dismiss(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = OverlayState::Cancelled;
        self.teardown();
    }

    fn submit(&mut self, region: Region) -> Result<(), CoreError> {
        self.state = OverlayState::Submitted;
        self.teardown();
        info!("선택 영역 제출: {}x{} @ ({}, {})", region.width, region.height, region.x, region.y);
        self.runtime.post(RuntimeMessage::FaceSelected {
            data: SelectionData::from_region(region),
        })
    }

    fn cancel(&mut self) -> Result<(), CoreError> {
        self.state = OverlayState::Cancelled;
        self.teardown();
        info!("선택 취소");
        self.runtime.post(RuntimeMessage::CancelSelection)
    }

    fn teardown(&mut self) {
        self.surface.unmount();
        if !self.surface.is_clean() {
            warn!("오버레이 해제 후 잔여 요소 존재");
        }
    }
}
