//! 탐지 서비스 HTTP 클라이언트.
//!
//! `DetectionClient` 포트 구현. 재시도 없음 — 세션당 정확히 1회 POST.

use async_trait::async_trait;
use faceguard_core::config::DetectionConfig;
use faceguard_core::error::CoreError;
use faceguard_core::models::analysis::{AnalysisResult, ResponseFields};
use faceguard_core::models::capture::CapturePayload;
use faceguard_core::ports::detection::DetectionClient;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, warn};

/// 탐지 서비스 클라이언트 — `DetectionClient` 포트 구현
pub struct HttpDetectionClient {
    client: reqwest::Client,
    endpoint: String,
    field_name: String,
    file_name: String,
    fields: ResponseFields,
}

impl HttpDetectionClient {
    /// 설정으로부터 클라이언트 생성
    pub fn new(config: &DetectionConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            field_name: config.field_name.clone(),
            file_name: config.file_name.clone(),
            fields: config.response_fields(),
        })
    }

    fn network_error(&self, error: &reqwest::Error) -> CoreError {
        CoreError::Network {
            endpoint: self.endpoint.clone(),
            message: error.to_string(),
        }
    }

    /// 응답 본문 해석 — JSON이 아니면 원문을 `extra.raw`에 보관
    fn parse_body(&self, text: &str) -> AnalysisResult {
        let value = serde_json::from_str::<Value>(text).unwrap_or_else(|e| {
            warn!("탐지 응답이 JSON이 아님: {e}");
            Value::String(text.to_string())
        });
        AnalysisResult::from_value(value, &self.fields)
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn analyze(&self, payload: &CapturePayload) -> Result<AnalysisResult, CoreError> {
        let part = Part::bytes(payload.image_data.clone())
            .file_name(self.file_name.clone())
            .mime_str(payload.format().mime_type())
            .map_err(|e| CoreError::Internal(format!("multipart 파트 생성 실패: {e}")))?;
        let form = Form::new().part(self.field_name.clone(), part);

        debug!(
            endpoint = %self.endpoint,
            bytes = payload.image_data.len(),
            width = payload.region.width,
            height = payload.region.height,
            "탐지 요청 전송"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.network_error(&e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.network_error(&e))?;

        if !status.is_success() {
            warn!("탐지 서비스 에러 응답: {status}");
            return Err(CoreError::Service {
                status: status.as_u16(),
                body: text,
            });
        }

        let result = self.parse_body(&text);
        debug!(
            result = ?result.result,
            probability = ?result.probability,
            "탐지 응답 수신"
        );
        Ok(result)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
