//! 헤드리스 오버레이 표면.
//!
//! 실제 DOM 대신 주입된 요소와 등록된 리스너를 추적한다.
//! 해제 후 페이지가 원래 상태로 돌아왔는지 검증하는 데 사용한다.

use std::collections::BTreeSet;

use faceguard_core::models::region::{Point, Region};
use faceguard_core::ports::overlay::{OverlayElement, OverlaySurface};
use tracing::debug;

/// 오버레이가 등록하는 입력 리스너 수 (mousedown, mousemove, mouseup, keydown)
pub const LISTENER_COUNT: usize = 4;

/// 안내 배너 문구
pub const INSTRUCTIONS_TEXT: &str = "Face Selection Mode - Click and drag to select a face";

/// 크기 표시 위치 오프셋 (포인터 기준)
const SIZE_LABEL_OFFSET: Point = Point::new(10, -40);

/// 크기 표시 문구 (`W × H px`)
pub fn size_label(region: &Region) -> String {
    format!("{} × {} px", region.width, region.height)
}

/// 헤드리스 표면 — 요소 집합 + 리스너 수
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    elements: BTreeSet<OverlayElement>,
    listeners: usize,
    selection: Option<Region>,
    size_label: Option<(String, Point)>,
    confirmation: Option<Region>,
    notice: Option<String>,
}

impl HeadlessSurface {
    /// 빈 표면 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 현재 주입된 요소
    pub fn elements(&self) -> &BTreeSet<OverlayElement> {
        &self.elements
    }

    /// 요소 존재 여부
    pub fn contains(&self, element: OverlayElement) -> bool {
        self.elements.contains(&element)
    }

    /// 등록된 리스너 수
    pub fn listener_count(&self) -> usize {
        self.listeners
    }

    /// 현재 선택 사각형
    pub fn selection(&self) -> Option<Region> {
        self.selection
    }

    /// 현재 크기 표시 문구와 위치
    pub fn size_label(&self) -> Option<(&str, Point)> {
        self.size_label
            .as_ref()
            .map(|(text, at)| (text.as_str(), *at))
    }

    /// 확인 대화상자에 표시 중인 영역
    pub fn confirmation(&self) -> Option<Region> {
        self.confirmation
    }

    /// 마지막 안내 메시지
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

impl OverlaySurface for HeadlessSurface {
    fn mount(&mut self) {
        self.elements.insert(OverlayElement::CaptureSurface);
        self.elements.insert(OverlayElement::Instructions);
        self.listeners = LISTENER_COUNT;
        debug!("오버레이 표면 설치: {INSTRUCTIONS_TEXT}");
    }

    fn show_selection(&mut self, rect: Region, pointer: Point) {
        // 새 드래그가 시작되면 이전 거부 안내는 치운다
        self.elements.remove(&OverlayElement::Notice);
        self.notice = None;

        self.elements.insert(OverlayElement::SelectionRect);
        self.elements.insert(OverlayElement::SizeIndicator);
        self.selection = Some(rect);
        let at = Point::new(
            pointer.x + SIZE_LABEL_OFFSET.x,
            pointer.y + SIZE_LABEL_OFFSET.y,
        );
        self.size_label = Some((size_label(&rect), at));
    }

    fn hide_selection(&mut self) {
        self.elements.remove(&OverlayElement::SelectionRect);
        self.elements.remove(&OverlayElement::SizeIndicator);
        self.selection = None;
        self.size_label = None;
    }

    fn show_confirmation(&mut self, region: Region) {
        self.elements.insert(OverlayElement::ConfirmDialog);
        self.confirmation = Some(region);
    }

    fn show_notice(&mut self, message: &str) {
        self.elements.insert(OverlayElement::Notice);
        self.notice = Some(message.to_string());
    }

    fn unmount(&mut self) {
        self.elements.clear();
        self.listeners = 0;
        self.selection = None;
        self.size_label = None;
        self.confirmation = None;
        self.notice = None;
        debug!("오버레이 표면 해제");
    }

    fn is_clean(&self) -> bool {
        self.elements.is_empty() && self.listeners == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mount_and_unmount_leave_no_residue() {
        let mut surface = HeadlessSurface::new();
        assert!(surface.is_clean());

        surface.mount();
        assert!(!surface.is_clean());
        assert_eq!(surface.listener_count(), LISTENER_COUNT);

        surface.show_selection(
            Region {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
            Point::new(10, 10),
        );
        surface.show_notice("too small");
        surface.unmount();

        assert!(surface.is_clean());
        assert!(surface.notice().is_none());
    }

    #[test]
    fn size_label_follows_pointer() {
        let mut surface = HeadlessSurface::new();
        surface.mount();
        let rect = Region {
            x: 50,
            y: 50,
            width: 100,
            height: 150,
        };
        surface.show_selection(rect, Point::new(150, 200));

        let (text, at) = surface.size_label().unwrap();
        assert_eq!(text, "100 × 150 px");
        assert_eq!(at, Point::new(160, 160));
    }
}
