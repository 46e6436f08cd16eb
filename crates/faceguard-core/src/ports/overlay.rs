//! 오버레이 표면 포트.
//!
//! 페이지 컨텍스트(단일 스레드)에서 동기적으로 호출된다.
//! 구현: `faceguard-overlay` crate (헤드리스 표면), 앱의 페이지 호스트

use crate::models::region::{Point, Region};

/// 오버레이가 페이지에 주입하는 시각 요소
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayElement {
    /// 페이지 전체를 덮는 캡처 표면
    CaptureSurface,
    /// 상단 안내 배너
    Instructions,
    /// 선택 사각형 외곽선
    SelectionRect,
    /// 크기 표시 (`W × H px`)
    SizeIndicator,
    /// 확인/취소 대화상자
    ConfirmDialog,
    /// 거부 안내 (최소 크기 미달)
    Notice,
}

/// 오버레이 표면 — 시각 요소와 입력 리스너의 설치/해제
pub trait OverlaySurface {
    /// 캡처 표면 + 안내 배너 설치, 입력 리스너 등록
    fn mount(&mut self);

    /// 선택 사각형과 크기 표시 갱신
    fn show_selection(&mut self, rect: Region, pointer: Point);

    /// 선택 사각형과 크기 표시 숨김
    fn hide_selection(&mut self);

    /// 확인 대화상자 표시
    fn show_confirmation(&mut self, region: Region);

    /// 안내 메시지 표시
    fn show_notice(&mut self, message: &str);

    /// 모든 요소 제거 + 리스너 해제
    fn unmount(&mut self);

    /// 남아 있는 요소/리스너가 없는지 여부
    fn is_clean(&self) -> bool;
}
