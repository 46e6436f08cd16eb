//! 탐지 결과 모델.
//!
//! 외부 탐지 서비스의 응답은 계약이 외부에 있으므로 느슨한 타입으로 다룬다.
//! 필수 필드를 가정하지 않고, 사용 직전에 존재 여부만 확인한다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// 응답 JSON에서 라벨/확률을 찾을 필드 이름
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFields {
    /// 분류 라벨 필드 (예: "result", "label")
    pub label_field: String,
    /// 확률 필드 (예: "probability", "confidence")
    pub probability_field: String,
}

impl Default for ResponseFields {
    fn default() -> Self {
        Self {
            label_field: "result".to_string(),
            probability_field: "probability".to_string(),
        }
    }
}

/// 탐지 결과 (성공/실패 공통 형태)
///
/// 실패 시 `{result: null, probability: 0.0, error: <메시지>}`로 정규화되어
/// 표시 로직이 하나의 경로만 갖는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 분류 라벨 (예: "Real", "Fake")
    #[serde(default)]
    pub result: Option<String>,
    /// 라벨 확률 (0.0 ~ 1.0)
    #[serde(default)]
    pub probability: Option<f64>,
    /// 에러 메시지
    #[serde(default)]
    pub error: Option<String>,
    /// 알려지지 않은 나머지 필드
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// 라벨 + 확률 결과 생성
    pub fn labeled(label: impl Into<String>, probability: f64) -> Self {
        Self {
            result: Some(label.into()),
            probability: Some(probability),
            error: None,
            extra: Map::new(),
        }
    }

    /// 에러 메시지로 정규화된 실패 결과 생성
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            probability: Some(0.0),
            error: Some(message.into()),
            extra: Map::new(),
        }
    }

    /// 코어 에러를 실패 결과로 정규화
    pub fn from_error(error: &CoreError) -> Self {
        Self::failure(error.to_string())
    }

    /// 서비스 응답 JSON을 느슨하게 해석.
    ///
    /// - 라벨은 문자열일 때만 채택
    /// - 확률은 유한한 숫자일 때만 채택
    /// - `error` 또는 `detail` 문자열을 에러로 채택
    /// - 객체가 아닌 응답은 `extra.raw`에 보관
    pub fn from_value(value: Value, fields: &ResponseFields) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                let mut extra = Map::new();
                extra.insert("raw".to_string(), other);
                return Self {
                    result: None,
                    probability: None,
                    error: None,
                    extra,
                };
            }
        };

        let result = match map.remove(&fields.label_field) {
            Some(Value::String(label)) => Some(label),
            Some(other) => {
                map.insert(fields.label_field.clone(), other);
                None
            }
            None => None,
        };

        let probability = match map.remove(&fields.probability_field) {
            Some(Value::Number(n)) => n.as_f64().filter(|p| p.is_finite()),
            Some(other) => {
                map.insert(fields.probability_field.clone(), other);
                None
            }
            None => None,
        };

        let error = match map.remove("error") {
            Some(Value::String(msg)) => Some(msg),
            Some(other) => {
                map.insert("error".to_string(), other);
                None
            }
            None => None,
        }
        .or_else(|| map.get("detail").and_then(Value::as_str).map(str::to_string));

        Self {
            result,
            probability,
            error,
            extra: map,
        }
    }

    /// 에러 결과 여부
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
