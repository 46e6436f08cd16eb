//! 애플리케이션 설정 구조체.
//!
//! 탐지 서비스 엔드포인트/필드 이름, 선택 최소 크기, 핸드오프 신선도,
//! 저장소 경로 등 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::analysis::ResponseFields;
use crate::models::capture::CaptureFormat;
use crate::models::handoff::DEFAULT_FRESHNESS_SECS;
use crate::models::region::MIN_DIM;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 탐지 서비스 설정
    pub detection: DetectionConfig,
    /// 선택 오버레이 설정
    #[serde(default)]
    pub selection: SelectionConfig,
    /// 결과 핸드오프 설정
    #[serde(default)]
    pub handoff: HandoffConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
}

// ============================================================
// 탐지 서비스 설정
// ============================================================

/// 탐지 서비스 설정.
///
/// 엔드포인트, 멀티파트 필드 이름, 응답 스키마는 서비스 계약에 따라 달라지므로
/// 코드가 아닌 설정으로 둔다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// 분석 엔드포인트 (POST)
    pub endpoint: String,
    /// 이미지 멀티파트 필드 이름 ("file" 또는 "image")
    #[serde(default = "default_field_name")]
    pub field_name: String,
    /// 업로드 파일 이름
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 응답의 분류 라벨 필드
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// 응답의 확률 필드
    #[serde(default = "default_probability_field")]
    pub probability_field: String,
    /// "진짜"로 판정되는 라벨 값
    #[serde(default = "default_real_label")]
    pub real_label: String,
}

impl DetectionConfig {
    /// 응답 파싱용 필드 이름
    pub fn response_fields(&self) -> ResponseFields {
        ResponseFields {
            label_field: self.label_field.clone(),
            probability_field: self.probability_field.clone(),
        }
    }

    /// 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            field_name: default_field_name(),
            file_name: default_file_name(),
            request_timeout_ms: default_request_timeout_ms(),
            label_field: default_label_field(),
            probability_field: default_probability_field(),
            real_label: default_real_label(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8080/analyze/".to_string()
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_file_name() -> String {
    "face.png".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_label_field() -> String {
    "result".to_string()
}

fn default_probability_field() -> String {
    "probability".to_string()
}

fn default_real_label() -> String {
    "Real".to_string()
}

// ============================================================
// 선택 / 핸드오프 / 저장소 / 캡처 설정
// ============================================================

/// 선택 오버레이 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// 확정 영역 최소 너비/높이 (픽셀)
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_dimension: default_min_dimension(),
        }
    }
}

fn default_min_dimension() -> u32 {
    MIN_DIM
}

/// 결과 핸드오프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// 신선도 윈도우 (초) — 초과한 레코드는 표시 없이 폐기
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// 저장 키
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl HandoffConfig {
    /// 신선도 윈도우
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
            storage_key: default_storage_key(),
        }
    }
}

fn default_freshness_secs() -> u64 {
    DEFAULT_FRESHNESS_SECS
}

fn default_storage_key() -> String {
    "analysisResults".to_string()
}

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 경로 (None이면 플랫폼 데이터 디렉토리)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// 캡처 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 이미지 포맷
    #[serde(default)]
    pub format: CaptureFormat,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            detection: DetectionConfig::default(),
            selection: SelectionConfig::default(),
            handoff: HandoffConfig::default(),
            storage: StorageConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}
