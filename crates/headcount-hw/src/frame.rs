//! Frame type and pixel-format conversion to packed RGB24.

use image::{ImageFormat, RgbImage};

/// A captured camera frame in packed RGB24.
#[derive(Clone)]
pub struct Frame {
    /// RGB pixel data (width * height * 3 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    /// Average luma (0.0–255.0), BT.601 weights.
    pub fn avg_brightness(&self) -> f32 {
        if self.data.len() < 3 {
            return 0.0;
        }
        let sum: f32 = self
            .data
            .chunks_exact(3)
            .map(|p| 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32)
            .sum();
        sum / (self.data.len() / 3) as f32
    }

    /// Convert into an `image` buffer for drawing overlays.
    pub fn into_image(self) -> Result<RgbImage, FrameError> {
        let expected = (self.width * self.height * 3) as usize;
        let actual = self.data.len();
        RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or(FrameError::InvalidLength { expected, actual })
    }
}

/// Rows of a strided image buffer, each trimmed to `row_bytes`.
///
/// `stride` is the driver's bytes-per-line; zero means rows are tightly packed.
fn strided_rows(
    buf: &[u8],
    row_bytes: usize,
    height: u32,
    stride: u32,
) -> Result<impl Iterator<Item = &[u8]>, FrameError> {
    let stride = (stride as usize).max(row_bytes);
    let height = height as usize;
    let expected = match height {
        0 => 0,
        h => stride * (h - 1) + row_bytes,
    };
    if buf.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: buf.len(),
        });
    }
    Ok((0..height).map(move |y| &buf[y * stride..y * stride + row_bytes]))
}

/// Convert YUYV (4:2:2) to RGB24 using BT.601 limited-range coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32, stride: u32) -> Result<Vec<u8>, FrameError> {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for row in strided_rows(yuyv, width as usize * 2, height, stride)? {
        for chunk in row.chunks_exact(4) {
            let (y0, u, y1, v) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
            rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
        }
    }
    Ok(rgb)
}

fn ycbcr_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = (y as f32 - 16.0) * 1.164;
    let d = u as f32 - 128.0;
    let e = v as f32 - 128.0;
    let clamp = |x: f32| x.round().clamp(0.0, 255.0) as u8;
    [
        clamp(c + 1.596 * e),
        clamp(c - 0.392 * d - 0.813 * e),
        clamp(c + 2.017 * d),
    ]
}

/// Expand 8-bit grayscale to RGB24 by replicating each sample.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32, stride: u32) -> Result<Vec<u8>, FrameError> {
    Ok(strided_rows(grey, width as usize, height, stride)?
        .flatten()
        .flat_map(|&g| [g, g, g])
        .collect())
}

/// Copy RGB24 rows out of a possibly padded buffer.
pub fn rgb24_rows(rgb: &[u8], width: u32, height: u32, stride: u32) -> Result<Vec<u8>, FrameError> {
    Ok(strided_rows(rgb, width as usize * 3, height, stride)?
        .flatten()
        .copied()
        .collect())
}

/// Decode one Motion-JPEG frame to RGB24, checking it matches the negotiated size.
pub fn mjpeg_to_rgb(jpeg: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let decoded = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?.to_rgb8();
    if decoded.dimensions() != (width, height) {
        return Err(FrameError::SizeMismatch {
            expected: (width, height),
            actual: decoded.dimensions(),
        });
    }
    Ok(decoded.into_raw())
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("decoded frame is {actual:?}, negotiated {expected:?}")]
    SizeMismatch { expected: (u32, u32), actual: (u32, u32) },
    #[error("jpeg decode failed: {0}")]
    Decode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_neutral_chroma_is_grey() {
        // 2x1 image, U=V=128 → pure grey pixels.
        let yuyv = vec![16, 128, 235, 128];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1, 0).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_yuyv_red_dominant() {
        // High V (Cr) pushes toward red.
        let yuyv = vec![81, 90, 81, 240];
        let rgb = yuyv_to_rgb(&yuyv, 2, 1, 0).unwrap();
        assert!(rgb[0] > 200, "r = {}", rgb[0]);
        assert!(rgb[1] < 40, "g = {}", rgb[1]);
        assert!(rgb[2] < 40, "b = {}", rgb[2]);
    }

    #[test]
    fn test_yuyv_invalid_length() {
        assert!(matches!(
            yuyv_to_rgb(&[100, 128], 2, 1, 0),
            Err(FrameError::InvalidLength { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_grey_to_rgb_replicates() {
        let rgb = grey_to_rgb(&[7, 200], 2, 1, 0).unwrap();
        assert_eq!(rgb, vec![7, 7, 7, 200, 200, 200]);
    }

    #[test]
    fn test_grey_to_rgb_short_buffer() {
        assert!(grey_to_rgb(&[1, 2, 3], 2, 2, 0).is_err());
    }

    #[test]
    fn test_yuyv_padded_rows_skip_padding() {
        // 2x2 image, 4 bytes of pixels plus 4 bytes of padding per row.
        // Padding is full-scale Y with strong chroma so any leak shows up.
        let yuyv = vec![
            16, 128, 16, 128, 255, 0, 255, 0, //
            235, 128, 235, 128, 255, 0, 255, 0,
        ];
        let rgb = yuyv_to_rgb(&yuyv, 2, 2, 8).unwrap();
        assert_eq!(rgb, vec![0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255]);
    }

    #[test]
    fn test_padded_last_row_may_be_short() {
        // The final row only needs its pixel bytes, not the trailing padding.
        let grey = vec![1, 2, 0, 0, 3, 4];
        assert_eq!(
            grey_to_rgb(&grey, 2, 2, 4).unwrap(),
            vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]
        );
        assert!(matches!(
            grey_to_rgb(&grey[..5], 2, 2, 4),
            Err(FrameError::InvalidLength { expected: 6, actual: 5 })
        ));
    }

    #[test]
    fn test_rgb24_rows_drop_padding() {
        let rgb = vec![1, 2, 3, 9, 4, 5, 6, 9];
        assert_eq!(rgb24_rows(&rgb, 1, 2, 4).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_stride_smaller_than_row_treated_as_packed() {
        assert_eq!(grey_to_rgb(&[5, 6], 2, 1, 1).unwrap(), vec![5, 5, 5, 6, 6, 6]);
    }

    #[test]
    fn test_mjpeg_roundtrip_dimensions() {
        let img = RgbImage::from_pixel(8, 6, image::Rgb([120, 60, 30]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new(&mut jpeg)
            .encode_image(&img)
            .unwrap();

        let rgb = mjpeg_to_rgb(&jpeg, 8, 6).unwrap();
        assert_eq!(rgb.len(), 8 * 6 * 3);
        assert!(matches!(mjpeg_to_rgb(&jpeg, 16, 6), Err(FrameError::SizeMismatch { .. })));
    }

    #[test]
    fn test_mjpeg_garbage_is_error() {
        assert!(matches!(mjpeg_to_rgb(&[0, 1, 2, 3], 2, 2), Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_avg_brightness() {
        let frame = Frame {
            data: vec![255; 4 * 3],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        assert!((frame.avg_brightness() - 255.0).abs() < 0.01);
    }

    #[test]
    fn test_into_image_checks_length() {
        let frame = Frame {
            data: vec![0; 5],
            width: 2,
            height: 2,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        };
        assert!(frame.into_image().is_err());
    }
}
