//! Click markers drawn onto page renders.

use ab_glyph::{FontRef, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_text_mut};
use tracing::warn;

use crate::coords::raw_to_canvas;

pub const MARKER_FILL: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const MARKER_OUTLINE: Rgba<u8> = Rgba([139, 0, 0, 255]);

const LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");
const LABEL_SCALE: f32 = 14.0;
/// Gap between the marker ring and its number
const LABEL_GAP: i32 = 3;

fn label_font() -> Option<FontRef<'static>> {
    FontRef::try_from_slice(LABEL_FONT)
        .map_err(|e| warn!(error = %e, "Marker label font is unusable, drawing markers only"))
        .ok()
}

/// Draw a red dot with a dark red ring at each raw position, with the
/// point's 1-based number to its right.
///
/// Markers are `(number, raw_x, raw_y)` in page points; `zoom` maps them
/// onto the raster. Anything partly or wholly off the image is clipped by
/// imageproc.
pub fn draw_markers(image: &mut RgbaImage, markers: &[(usize, f64, f64)], zoom: f64, radius: u32) {
    let radius = radius.max(1) as i32;
    let font = label_font();
    let scale = PxScale::from(LABEL_SCALE);

    for &(number, raw_x, raw_y) in markers {
        let (cx, cy) = raw_to_canvas(raw_x, raw_y, zoom);
        let center = (cx.round() as i32, cy.round() as i32);
        draw_filled_circle_mut(image, center, radius, MARKER_FILL);
        // Two rings for a 2px outline
        draw_hollow_circle_mut(image, center, radius, MARKER_OUTLINE);
        draw_hollow_circle_mut(image, center, radius + 1, MARKER_OUTLINE);

        if let Some(font) = &font {
            let x = center.0 + radius + 1 + LABEL_GAP;
            let y = center.1 - (LABEL_SCALE / 2.0) as i32;
            draw_text_mut(image, MARKER_OUTLINE, x, y, scale, font, &number.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn inked(img: &RgbaImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        xs.flat_map(|x| ys.clone().map(move |y| (x, y)))
            .filter(|&(x, y)| *img.get_pixel(x, y) != WHITE)
            .count()
    }

    #[test]
    fn test_bundled_font_loads() {
        assert!(label_font().is_some());
    }

    #[test]
    fn test_marker_centered_on_scaled_position() {
        let mut img = RgbaImage::from_pixel(100, 100, WHITE);

        draw_markers(&mut img, &[(1, 20.0, 10.0)], 2.0, 5);

        assert_eq!(*img.get_pixel(40, 20), MARKER_FILL);
        assert_eq!(*img.get_pixel(40, 26), MARKER_OUTLINE);
        assert_eq!(*img.get_pixel(40, 30), WHITE);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn test_number_is_drawn_right_of_marker() {
        let mut img = RgbaImage::from_pixel(100, 100, WHITE);

        draw_markers(&mut img, &[(7, 20.0, 50.0)], 1.0, 5);

        // Ring ends at x = 26; the number starts past the gap
        assert!(inked(&img, 29..45, 40..60) > 0);
        assert_eq!(inked(&img, 45..100, 0..100), 0);
        assert_eq!(inked(&img, 0..12, 0..100), 0);
    }

    #[test]
    fn test_markers_off_canvas_are_clipped() {
        let mut img = RgbaImage::from_pixel(10, 10, WHITE);

        draw_markers(&mut img, &[(1, -50.0, -50.0), (2, 9.0, 9.0)], 1.0, 5);

        assert_eq!(*img.get_pixel(9, 9), MARKER_FILL);
        assert_eq!(*img.get_pixel(0, 9), WHITE);
    }
}
