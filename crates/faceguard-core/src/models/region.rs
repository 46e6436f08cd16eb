//! 선택 영역 모델.
//!
//! 뷰포트 픽셀 좌표계의 포인터 위치와 정규화된 직사각형 영역.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 최종 확정 영역의 최소 너비/높이 (픽셀)
pub const MIN_DIM: u32 = 50;

/// 뷰포트 좌표계의 포인터 위치 (clientX, clientY)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 사용자가 선택한 직사각형 영역 (뷰포트 픽셀 좌표)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// 드래그 시작점과 현재점으로부터 정규화된 영역 계산.
    ///
    /// `left = min(x0,x1)`, `top = min(y0,y1)`, `width = |x1-x0|`, `height = |y1-y0|`
    pub fn from_drag(origin: Point, current: Point) -> Self {
        Self {
            x: origin.x.min(current.x),
            y: origin.y.min(current.y),
            width: origin.x.abs_diff(current.x),
            height: origin.y.abs_diff(current.y),
        }
    }

    /// 최소 크기 검증 후 확정 영역 반환
    pub fn finalize(self, min_dim: u32) -> Result<Self, CoreError> {
        if self.width < min_dim || self.height < min_dim {
            return Err(CoreError::MinimumSize {
                width: self.width,
                height: self.height,
                min: min_dim,
            });
        }
        Ok(self)
    }

    /// 오른쪽 경계 (x + width)
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// 아래쪽 경계 (y + height)
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// `width x height` 이미지 안에 완전히 포함되는지 여부
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= i64::from(width)
            && self.bottom() <= i64::from(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_normalization_any_direction() {
        let cases = [
            (Point::new(50, 50), Point::new(150, 200)),
            (Point::new(150, 200), Point::new(50, 50)),
            (Point::new(150, 50), Point::new(50, 200)),
            (Point::new(50, 200), Point::new(150, 50)),
        ];
        for (a, b) in cases {
            let r = Region::from_drag(a, b);
            assert_eq!(
                r,
                Region {
                    x: 50,
                    y: 50,
                    width: 100,
                    height: 150
                }
            );
        }
    }

    #[test]
    fn finalize_rejects_below_min() {
        let r = Region::from_drag(Point::new(100, 100), Point::new(100, 100));
        let err = r.finalize(MIN_DIM).unwrap_err();
        assert!(matches!(
            err,
            CoreError::MinimumSize {
                width: 0,
                height: 0,
                min: 50
            }
        ));

        // 한 축만 부족해도 거부
        let narrow = Region::from_drag(Point::new(0, 0), Point::new(49, 300));
        assert!(narrow.finalize(MIN_DIM).is_err());
    }

    #[test]
    fn finalize_accepts_exact_min() {
        let r = Region::from_drag(Point::new(10, 10), Point::new(60, 60));
        assert!(r.finalize(MIN_DIM).is_ok());
    }

    #[test]
    fn fits_within_bounds() {
        let r = Region {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        assert!(r.fits_within(100, 100));
        assert!(!r.fits_within(99, 100));

        let negative = Region {
            x: -1,
            y: 0,
            width: 10,
            height: 10,
        };
        assert!(!negative.fits_within(100, 100));
    }
}
