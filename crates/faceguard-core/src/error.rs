//! FaceGuard 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 타입을 그대로 반환한다.
//! 선택 세션의 실패 분류(캡처/경계/네트워크/서비스/최소 크기)가 여기에 모인다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 특권 캡처 실패 (권한 거부, 탭 닫힘/이동) — 세션 종료, 재시도 없음
    #[error("화면 캡처 실패: {0}")]
    Capture(String),

    /// 선택 영역이 캡처 이미지 경계를 벗어남 — 로직 결함, 절대 보정하지 않음
    #[error(
        "영역이 이미지 경계를 벗어남 — region=({x},{y}) {width}x{height}, image={image_width}x{image_height}"
    )]
    Boundary {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// 탐지 서비스 연결 불가
    #[error("탐지 서비스에 연결할 수 없음 — {endpoint} 에서 서비스가 실행 중인지 확인하세요 ({message})")]
    Network {
        /// 호출한 엔드포인트
        endpoint: String,
        /// 하위 전송 계층 메시지
        message: String,
    },

    /// 탐지 서비스 비-2xx 응답 (상태 코드와 본문을 그대로 전달)
    #[error("HTTP {status}: {body}")]
    Service {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문
        body: String,
    },

    /// 선택 영역이 최소 크기 미만 — 로컬에서 복구 가능 (재선택)
    #[error("선택 영역이 너무 작음: {width}x{height} (최소 {min}x{min})")]
    MinimumSize { width: u32, height: u32, min: u32 },

    /// 영속 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 오버레이 주입/제거 실패
    #[error("오버레이 주입 실패: {0}")]
    Injection(String),

    /// 컨텍스트 간 메시지 채널 에러 (수신자 종료 등)
    #[error("메시지 채널 에러: {0}")]
    Channel(String),

    /// 제출 전 세션 취소
    #[error("세션 취소됨")]
    Cancelled,

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 제출 이후 발생한 에러인지 여부.
    ///
    /// `true`이면 에러 결과도 핸드오프 레코드로 남아야 한다.
    pub fn is_post_submission(&self) -> bool {
        matches!(self, CoreError::Network { .. } | CoreError::Service { .. })
    }
}
