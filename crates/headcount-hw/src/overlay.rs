//! Overlay rendering: face boxes and the live passenger count.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const BOX_THICKNESS: u32 = 2;
const TEXT_SCALE: f32 = 30.0;
const TEXT_ORIGIN: (i32, i32) = (10, 6);

/// A face box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Draws detection boxes and the count label onto frames.
pub struct Overlay {
    font: Option<FontVec>,
}

impl Overlay {
    /// Load the label font from a TTF/OTF file.
    ///
    /// A missing or unreadable font is not fatal: boxes are still drawn and
    /// only the text label is skipped.
    pub fn load(font_path: &Path) -> Self {
        let font = std::fs::read(font_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));

        match font {
            Ok(font) => {
                tracing::debug!(path = %font_path.display(), "overlay font loaded");
                Self { font: Some(font) }
            }
            Err(e) => {
                tracing::warn!(path = %font_path.display(), error = %e, "overlay font unavailable; count shown in window title only");
                Self { font: None }
            }
        }
    }

    /// Overlay that only draws boxes.
    pub fn boxes_only() -> Self {
        Self { font: None }
    }

    /// Draw every face box and the `Passengers: N` label.
    pub fn draw(&self, image: &mut RgbImage, faces: &[FaceBox], count: usize) {
        for face in faces {
            for inset in 0..BOX_THICKNESS {
                if let Some(rect) = inset_rect(face, inset) {
                    draw_hollow_rect_mut(image, rect, OVERLAY_COLOR);
                }
            }
        }

        if let Some(font) = &self.font {
            draw_text_mut(
                image,
                OVERLAY_COLOR,
                TEXT_ORIGIN.0,
                TEXT_ORIGIN.1,
                PxScale::from(TEXT_SCALE),
                font,
                &count_label(count),
            );
        }
    }
}

/// Text of the count label, also used as the window caption.
pub fn count_label(count: usize) -> String {
    format!("Passengers: {count}")
}

fn inset_rect(face: &FaceBox, inset: u32) -> Option<Rect> {
    let w = face.width.round() as i64 - 2 * inset as i64;
    let h = face.height.round() as i64 - 2 * inset as i64;
    if w <= 0 || h <= 0 {
        return None;
    }
    let x = face.x.round() as i32 + inset as i32;
    let y = face.y.round() as i32 + inset as i32;
    Some(Rect::at(x, y).of_size(w as u32, h as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f32, y: f32, w: f32, h: f32) -> FaceBox {
        FaceBox { x, y, width: w, height: h }
    }

    #[test]
    fn test_draw_box_outline_two_pixels() {
        let mut img = RgbImage::new(40, 40);
        Overlay::boxes_only().draw(&mut img, &[face(10.0, 10.0, 20.0, 20.0)], 1);

        assert_eq!(*img.get_pixel(10, 15), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(11, 15), OVERLAY_COLOR);
        assert_eq!(*img.get_pixel(12, 15), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(20, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_draw_clips_boxes_outside_frame() {
        let mut img = RgbImage::new(20, 20);
        Overlay::boxes_only().draw(&mut img, &[face(-10.0, -10.0, 100.0, 100.0), face(50.0, 50.0, 5.0, 5.0)], 2);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_degenerate_box_skipped() {
        assert!(inset_rect(&face(0.0, 0.0, 0.0, 10.0), 0).is_none());
        assert!(inset_rect(&face(0.0, 0.0, 2.0, 2.0), 1).is_none());
        assert!(inset_rect(&face(0.0, 0.0, 3.0, 3.0), 1).is_some());
    }

    #[test]
    fn test_missing_font_falls_back() {
        let overlay = Overlay::load(Path::new("/nonexistent/font.ttf"));
        assert!(overlay.font.is_none());
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(3), "Passengers: 3");
    }
}
