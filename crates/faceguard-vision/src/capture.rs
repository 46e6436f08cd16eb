//! 뷰포트 캡처 어댑터.
//!
//! - [`ScreenCapture`]: xcap 기반 주 모니터 캡처 (데스크톱 호스트)
//! - [`FileCapture`]: 미리 저장된 스크린샷 파일 (헤드리스 호스트)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use faceguard_core::error::CoreError;
use faceguard_core::models::capture::CaptureFormat;
use faceguard_core::models::message::TabId;
use faceguard_core::ports::capture::ViewportCapture;
use image::DynamicImage;
use tracing::debug;
use xcap::Monitor;

use crate::crop::{decode, encode_png};

/// 스크린 캡처 — xcap 기반
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCapture;

impl ScreenCapture {
    pub fn new() -> Self {
        Self
    }

    /// 주 모니터 캡처 (주 모니터가 없으면 첫 번째 모니터)
    pub fn capture_primary() -> Result<DynamicImage, CoreError> {
        let monitors =
            Monitor::all().map_err(|e| CoreError::Capture(format!("모니터 목록 조회 실패: {e}")))?;

        let mut fallback = None;
        let mut primary = None;
        for monitor in monitors {
            if monitor.is_primary().unwrap_or(false) {
                primary = Some(monitor);
                break;
            }
            if fallback.is_none() {
                fallback = Some(monitor);
            }
        }

        let monitor = primary
            .or(fallback)
            .ok_or_else(|| CoreError::Capture("모니터를 찾을 수 없음".to_string()))?;

        let image = monitor
            .capture_image()
            .map_err(|e| CoreError::Capture(format!("스크린 캡처 실패: {e}")))?;

        debug!("스크린 캡처 완료: {}x{}", image.width(), image.height());

        Ok(DynamicImage::ImageRgba8(image))
    }
}

#[async_trait]
impl ViewportCapture for ScreenCapture {
    async fn capture_visible(
        &self,
        tab: TabId,
        format: CaptureFormat,
    ) -> Result<Vec<u8>, CoreError> {
        debug!("{tab} 뷰포트 캡처 요청 ({})", format.mime_type());

        // xcap 호출은 블로킹: 런타임 스레드를 막지 않도록 분리
        let image = tokio::task::spawn_blocking(Self::capture_primary)
            .await
            .map_err(|e| CoreError::Internal(format!("캡처 작업 실패: {e}")))??;

        match format {
            CaptureFormat::Png => encode_png(&image),
        }
    }
}

/// 스크린샷 파일 캡처 — 호출마다 같은 파일을 읽는다
#[derive(Debug, Clone)]
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ViewportCapture for FileCapture {
    async fn capture_visible(
        &self,
        tab: TabId,
        format: CaptureFormat,
    ) -> Result<Vec<u8>, CoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            CoreError::Capture(format!(
                "스크린샷 파일 읽기 실패: {}: {e}",
                self.path.display()
            ))
        })?;

        // 디코딩 가능 여부만 확인하고, PNG가 아니면 재인코딩
        let image = decode(&bytes)?;
        debug!(
            "{tab} 스크린샷 파일 캡처: {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );

        match format {
            CaptureFormat::Png if bytes.starts_with(PNG_SIGNATURE) => Ok(bytes),
            CaptureFormat::Png => encode_png(&image),
        }
    }
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
