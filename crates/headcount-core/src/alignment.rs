//! Face alignment for the ArcFace recognizer.
//!
//! Fits a 4-DOF similarity transform (scale, rotation, translation) from the
//! detector's five landmarks to the InsightFace reference layout, then warps
//! the RGB frame into a 112×112 crop.

/// ArcFace reference landmarks for a 112×112 crop:
/// left eye, right eye, nose, left mouth corner, right mouth corner.
const REFERENCE_LANDMARKS_112: [(f32, f32); 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

const ALIGNED_SIZE: usize = 112;

/// Least-squares similarity transform mapping `src` onto `dst`.
///
/// Returns the 2×3 matrix `[a, -b, tx, b, a, ty]`.
fn estimate_similarity_transform(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> [f32; 6] {
    // Normal equations for the unknowns [a, b, tx, ty], accumulated directly
    // into an augmented 4×5 matrix. Each point pair contributes two rows:
    //   [sx, -sy, 1, 0] -> dx
    //   [sy,  sx, 0, 1] -> dy
    let mut m = [[0.0f32; 5]; 4];

    for (&(sx, sy), &(dx, dy)) in src.iter().zip(dst.iter()) {
        for (row, rhs) in [([sx, -sy, 1.0, 0.0], dx), ([sy, sx, 0.0, 1.0], dy)] {
            for j in 0..4 {
                for k in 0..4 {
                    m[j][k] += row[j] * row[k];
                }
                m[j][4] += row[j] * rhs;
            }
        }
    }

    let [a, b, tx, ty] = solve_augmented_4x4(m);
    [a, -b, tx, b, a, ty]
}

/// Gaussian elimination with partial pivoting on an augmented 4×5 matrix.
///
/// A singular system yields the identity scale with no translation.
#[allow(clippy::needless_range_loop)]
fn solve_augmented_4x4(mut m: [[f32; 5]; 4]) -> [f32; 4] {
    for col in 0..4 {
        let pivot_row = (col..4)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        m.swap(col, pivot_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            return [1.0, 0.0, 0.0, 0.0];
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        let tail: f32 = ((i + 1)..4).map(|j| m[i][j] * x[j]).sum();
        x[i] = (m[i][4] - tail) / m[i][i];
    }
    x
}

/// Warp a packed RGB frame through the inverse of `matrix` into a square crop.
///
/// Bilinear sampling per channel; samples outside the frame are black.
fn warp_affine_rgb(
    frame: &[u8],
    src_width: usize,
    src_height: usize,
    matrix: &[f32; 6],
    out_size: usize,
) -> Vec<u8> {
    let (a, tx) = (matrix[0], matrix[2]);
    let (b, ty) = (matrix[3], matrix[5]);

    let mut output = vec![0u8; out_size * out_size * 3];

    // M = [[a, -b], [b, a]], det = a^2 + b^2
    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return output;
    }
    let ia = a / det;
    let ib = b / det;

    let sample = |x: i32, y: i32, c: usize| -> f32 {
        if x >= 0 && x < src_width as i32 && y >= 0 && y < src_height as i32 {
            frame[(y as usize * src_width + x as usize) * 3 + c] as f32
        } else {
            0.0
        }
    };

    for oy in 0..out_size {
        for ox in 0..out_size {
            let dx = ox as f32 - tx;
            let dy = oy as f32 - ty;
            let sx = ia * dx + ib * dy;
            let sy = -ib * dx + ia * dy;

            let x0 = sx.floor() as i32;
            let y0 = sy.floor() as i32;
            let fx = sx - x0 as f32;
            let fy = sy - y0 as f32;

            for c in 0..3 {
                let val = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, c) * fx * fy;
                output[(oy * out_size + ox) * 3 + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    output
}

/// Align a detected face to a canonical 112×112 RGB crop.
///
/// Solves the similarity transform from the five detected landmarks to the
/// ArcFace reference positions and warps the face region into place.
pub fn align_face(
    rgb: &[u8],
    width: u32,
    height: u32,
    landmarks: &[(f32, f32); 5],
) -> Vec<u8> {
    let matrix = estimate_similarity_transform(landmarks, &REFERENCE_LANDMARKS_112);
    warp_affine_rgb(rgb, width as usize, height as usize, &matrix, ALIGNED_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let pts = REFERENCE_LANDMARKS_112;
        let m = estimate_similarity_transform(&pts, &pts);

        let expected = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for (i, (got, want)) in m.iter().zip(expected.iter()).enumerate() {
            assert!((got - want).abs() < 1e-3, "m[{i}] = {got}, expected {want}");
        }
    }

    #[test]
    fn test_scaled_transform() {
        // Landmarks at 2x the reference layout → scale ≈ 0.5
        let src: [(f32, f32); 5] = std::array::from_fn(|i| {
            let (x, y) = REFERENCE_LANDMARKS_112[i];
            (x * 2.0, y * 2.0)
        });
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert!((m[0] - 0.5).abs() < 0.01, "a = {}", m[0]);
        assert!(m[3].abs() < 0.01, "b = {}", m[3]);
    }

    #[test]
    fn test_singular_system_falls_back() {
        let x = solve_augmented_4x4([[0.0; 5]; 4]);
        assert_eq!(x, [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_align_face_output_size() {
        let frame = vec![128u8; 640 * 480 * 3];
        let aligned = align_face(&frame, 640, 480, &REFERENCE_LANDMARKS_112);
        assert_eq!(aligned.len(), 112 * 112 * 3);
    }

    #[test]
    fn test_warp_preserves_channels() {
        // Identity warp of a uniform teal frame stays teal inside the frame.
        let frame: Vec<u8> = [0u8, 128, 128].repeat(200 * 200);
        let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let out = warp_affine_rgb(&frame, 200, 200, &m, 112);
        assert_eq!(&out[(50 * 112 + 50) * 3..(50 * 112 + 50) * 3 + 3], &[0, 128, 128]);
    }

    #[test]
    fn test_landmark_lands_on_reference() {
        // A bright red patch at the detected left eye should end up near the
        // reference left eye after alignment.
        let (w, h) = (200usize, 200usize);
        let mut frame = vec![0u8; w * h * 3];

        let src_landmarks: [(f32, f32); 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];

        let (lx, ly) = (80usize, 60usize);
        for py in ly - 2..=ly + 2 {
            for px in lx - 2..=lx + 2 {
                frame[(py * w + px) * 3] = 255;
            }
        }

        let aligned = align_face(&frame, w as u32, h as u32, &src_landmarks);

        let ref_x = REFERENCE_LANDMARKS_112[0].0.round() as usize;
        let ref_y = REFERENCE_LANDMARKS_112[0].1.round() as usize;
        let mut max_red = 0u8;
        let mut max_green = 0u8;
        for y in ref_y - 1..=ref_y + 1 {
            for x in ref_x - 1..=ref_x + 1 {
                max_red = max_red.max(aligned[(y * 112 + x) * 3]);
                max_green = max_green.max(aligned[(y * 112 + x) * 3 + 1]);
            }
        }
        assert!(max_red > 100, "expected red near ({ref_x}, {ref_y}), max={max_red}");
        assert_eq!(max_green, 0);
    }
}
