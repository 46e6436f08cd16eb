//! 컨텍스트 간 런타임 메시지.
//!
//! 모든 메시지는 `type` 판별 필드를 갖는다 (SCREAMING_SNAKE_CASE).
//! 알 수 없는 타입은 [`RuntimeMessage::Unknown`]으로 역직렬화되어 무시된다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::analysis::AnalysisResult;
use crate::models::region::Region;

/// 브라우저 탭 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// 오버레이가 확정한 선택 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// 확정 시각
    pub timestamp: DateTime<Utc>,
}

impl SelectionData {
    /// 확정 영역 + 현재 시각
    pub fn from_region(region: Region) -> Self {
        Self {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            timestamp: Utc::now(),
        }
    }

    /// 영역 부분만 추출
    pub fn region(&self) -> Region {
        Region {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// 런타임 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeMessage {
    /// 오버레이 → 코디네이터: 영역 확정
    FaceSelected { data: SelectionData },
    /// 오버레이 → 코디네이터: 선택 취소 (Escape/취소 버튼)
    CancelSelection,
    /// 팝업 → 코디네이터: 선택 중단
    StopSelection {
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },
    /// 코디네이터 → 페이지/팝업: 분석 결과
    AnalysisResults { data: AnalysisResult },
    /// 코디네이터 → 팝업: 세션 실패 (캡처 실패 등)
    SessionFailed { message: String },
    /// 알 수 없는 타입 (전방 호환, 무시)
    #[serde(other)]
    Unknown,
}

impl RuntimeMessage {
    /// 로깅용 타입 이름
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeMessage::FaceSelected { .. } => "FACE_SELECTED",
            RuntimeMessage::CancelSelection => "CANCEL_SELECTION",
            RuntimeMessage::StopSelection { .. } => "STOP_SELECTION",
            RuntimeMessage::AnalysisResults { .. } => "ANALYSIS_RESULTS",
            RuntimeMessage::SessionFailed { .. } => "SESSION_FAILED",
            RuntimeMessage::Unknown => "UNKNOWN",
        }
    }
}

/// 즉시 응답 (결과와 별개로 항상 전송)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAck {
    pub received: bool,
}

impl MessageAck {
    pub const RECEIVED: Self = Self { received: true };
}

/// 메시지 발신 컨텍스트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageSender {
    /// 탭에 주입된 오버레이/페이지
    Page(TabId),
    /// 팝업 (일시적 UI)
    Popup,
}

impl MessageSender {
    /// 발신 탭 (페이지인 경우)
    pub fn tab(&self) -> Option<TabId> {
        match self {
            MessageSender::Page(tab) => Some(*tab),
            MessageSender::Popup => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_selected_wire_format() {
        let json = r#"{
            "type": "FACE_SELECTED",
            "data": {"x": 50, "y": 50, "width": 100, "height": 150, "timestamp": "2026-01-01T00:00:00Z"}
        }"#;
        let msg: RuntimeMessage = serde_json::from_str(json).unwrap();
        match msg {
            RuntimeMessage::FaceSelected { data } => {
                assert_eq!(
                    data.region(),
                    Region {
                        x: 50,
                        y: 50,
                        width: 100,
                        height: 150
                    }
                );
            }
            other => panic!("예상치 못한 메시지: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_tolerated() {
        let msg: RuntimeMessage =
            serde_json::from_str(r#"{"type": "PROCESSED_IMAGE_READY", "data": {}}"#).unwrap();
        assert_eq!(msg, RuntimeMessage::Unknown);
    }

    #[test]
    fn stop_selection_uses_camel_case_tab() {
        let msg = RuntimeMessage::StopSelection { tab_id: TabId(7) };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "STOP_SELECTION");
        assert_eq!(v["tabId"], 7);
    }

    #[test]
    fn sender_tab() {
        assert_eq!(MessageSender::Page(TabId(3)).tab(), Some(TabId(3)));
        assert_eq!(MessageSender::Popup.tab(), None);
    }
}
