//! 영역 크롭.
//!
//! `(전체 뷰포트 이미지, 확정 영역) → 크롭 이미지` 순수 변환.
//! 경계를 벗어난 영역은 보정하지 않고 `CoreError::Boundary`로 거부한다.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use faceguard_core::error::CoreError;
use faceguard_core::models::capture::CapturePayload;
use faceguard_core::models::region::Region;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

/// 인코딩된 캡처 이미지 디코딩
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CoreError> {
    image::load_from_memory(bytes)
        .map_err(|e| CoreError::Capture(format!("캡처 이미지 디코딩 실패: {e}")))
}

/// 영역 크롭 — 출력은 정확히 `width × height`
pub fn crop_image(image: &DynamicImage, region: Region) -> Result<DynamicImage, CoreError> {
    let (image_width, image_height) = image.dimensions();
    if !region.fits_within(image_width, image_height) {
        return Err(CoreError::Boundary {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            image_width,
            image_height,
        });
    }

    // fits_within 통과 시 x, y는 음수가 아니다
    let cropped = image.crop_imm(
        region.x as u32,
        region.y as u32,
        region.width,
        region.height,
    );
    Ok(cropped)
}

/// 무손실 PNG 인코딩
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("PNG 인코딩 실패: {e}")))?;
    Ok(buf.into_inner())
}

/// 영역 처리기 — 디코딩, 크롭, 인코딩을 묶어 `CapturePayload` 생성
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionProcessor;

impl RegionProcessor {
    pub fn new() -> Self {
        Self
    }

    /// 캡처 바이트에서 영역을 잘라 페이로드 생성
    pub fn process(
        &self,
        screenshot: &[u8],
        region: Region,
        captured_at: DateTime<Utc>,
    ) -> Result<CapturePayload, CoreError> {
        let full = decode(screenshot)?;
        self.process_image(&full, region, captured_at)
    }

    /// 디코딩된 이미지에서 페이로드 생성
    pub fn process_image(
        &self,
        full: &DynamicImage,
        region: Region,
        captured_at: DateTime<Utc>,
    ) -> Result<CapturePayload, CoreError> {
        let cropped = crop_image(full, region)?;
        let image_data = encode_png(&cropped)?;

        debug!(
            "영역 크롭: {}x{} → {}x{} @ ({}, {}), {} bytes",
            full.width(),
            full.height(),
            region.width,
            region.height,
            region.x,
            region.y,
            image_data.len()
        );

        Ok(CapturePayload {
            image_data,
            region,
            captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn make_test_image(w: u32, h: u32) -> DynamicImage {
        // 좌표별로 다른 색을 넣어 크롭 위치를 검증할 수 있게 한다
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        }))
    }

    fn region(x: i32, y: i32, width: u32, height: u32) -> Region {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn crop_inside_bounds_has_exact_size() {
        let img = make_test_image(400, 300);
        let cropped = crop_image(&img, region(50, 50, 100, 150)).unwrap();
        assert_eq!(cropped.dimensions(), (100, 150));
        assert_eq!(cropped.get_pixel(0, 0), Rgba([50, 50, 0, 255]));
        assert_eq!(cropped.get_pixel(99, 149), Rgba([149, 199, 0, 255]));
    }

    #[test]
    fn crop_touching_edges_is_allowed() {
        let img = make_test_image(200, 100);
        let cropped = crop_image(&img, region(0, 0, 200, 100)).unwrap();
        assert_eq!(cropped.dimensions(), (200, 100));
    }

    #[test]
    fn crop_outside_bounds_is_rejected() {
        let img = make_test_image(200, 100);

        for r in [
            region(151, 0, 50, 50),
            region(0, 51, 50, 50),
            region(-1, 0, 50, 50),
            region(0, -5, 50, 50),
        ] {
            let err = crop_image(&img, r).unwrap_err();
            match err {
                CoreError::Boundary {
                    image_width,
                    image_height,
                    ..
                } => {
                    assert_eq!((image_width, image_height), (200, 100));
                }
                other => panic!("예상치 못한 에러: {other:?}"),
            }
        }
    }

    #[test]
    fn processor_produces_png_payload() {
        let img = make_test_image(400, 300);
        let screenshot = encode_png(&img).unwrap();
        let captured_at = Utc::now();

        let payload = RegionProcessor::new()
            .process(&screenshot, region(50, 50, 100, 150), captured_at)
            .unwrap();

        assert_eq!(payload.region, region(50, 50, 100, 150));
        assert_eq!(payload.captured_at, captured_at);
        assert_eq!(&payload.image_data[..8], b"\x89PNG\r\n\x1a\n");

        // 무손실: 다시 디코딩하면 같은 픽셀
        let decoded = decode(&payload.image_data).unwrap();
        assert_eq!(decoded.dimensions(), (100, 150));
        assert_eq!(decoded.get_pixel(10, 20), Rgba([60, 70, 0, 255]));
    }

    #[test]
    fn garbage_bytes_are_capture_error() {
        let err = RegionProcessor::new()
            .process(b"not an image", region(0, 0, 50, 50), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Capture(_)));
    }
}
