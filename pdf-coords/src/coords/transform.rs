//! Pure conversions between canvas pixels, raw points and adjusted points.

use serde::{Deserialize, Serialize};

use super::OriginPoint;

/// Page dimensions in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions of this page rendered at `zoom`
    pub fn scaled_pixels(&self, zoom: f64) -> (u32, u32) {
        (
            (self.width * zoom).ceil().max(1.0) as u32,
            (self.height * zoom).ceil().max(1.0) as u32,
        )
    }
}

/// Convert a raw (top-left, Y-down) position into the `origin` convention.
///
/// Out-of-range inputs pass straight through the formulas; callers that
/// care about page bounds must clamp before calling.
pub fn adjust(
    raw_x: f64,
    raw_y: f64,
    page_width: f64,
    page_height: f64,
    origin: OriginPoint,
) -> (f64, f64) {
    match origin {
        OriginPoint::TopLeft => (raw_x, raw_y),
        OriginPoint::TopRight => (page_width - raw_x, raw_y),
        OriginPoint::BottomLeft => (raw_x, page_height - raw_y),
        OriginPoint::BottomRight => (page_width - raw_x, page_height - raw_y),
    }
}

/// Canvas pixels at `zoom` to raw page points.
pub fn canvas_to_raw(canvas_x: f64, canvas_y: f64, zoom: f64) -> (f64, f64) {
    (canvas_x / zoom, canvas_y / zoom)
}

/// Raw page points to canvas pixels at `zoom`.
pub fn raw_to_canvas(raw_x: f64, raw_y: f64, zoom: f64) -> (f64, f64) {
    (raw_x * zoom, raw_y * zoom)
}

/// PDF points (1/72 inch) to millimetres.
pub fn points_to_mm(pt: f64) -> f64 {
    pt * 25.4 / 72.0
}
