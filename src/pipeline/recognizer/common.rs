//! Tensor preparation and coordinate mapping shared by the ONNX models.

use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::{
    landmarks::{HandLandmarks, NUM_LANDMARKS},
    types::Frame,
};

pub const HANDPOSE_INPUT_SIZE: u32 = 224;
pub const PALM_INPUT_SIZE: u32 = 192;

/// How a frame was scaled and padded into a square model input.
#[derive(Clone, Debug, PartialEq)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

impl LetterboxInfo {
    /// Maps a model-input pixel back onto the original frame.
    pub fn unproject(&self, x: f32, y: f32) -> (f32, f32) {
        clamp_to_frame(
            (x - self.pad_x) / self.scale,
            (y - self.pad_y) / self.scale,
            self.orig_w,
            self.orig_h,
        )
    }
}

/// Rotated square crop around one palm, fed to the landmark model.
#[derive(Clone, Debug, PartialEq)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
}

impl CropTransform {
    /// Maps a crop pixel back into frame coordinates. Points may fall outside the frame.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let dx = (x - half) * scale;
        let dy = (y - half) * scale;
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }

    /// Projects model-space landmarks onto integer frame pixels, truncating toward zero.
    /// Hands reaching past the frame edge keep their geometry.
    pub fn project_hand(&self, landmarks: &[[f32; 3]]) -> Result<HandLandmarks> {
        let projected: Vec<(f32, f32)> = landmarks
            .iter()
            .map(|[x, y, _z]| self.project(*x, *y))
            .collect();
        Ok(HandLandmarks::from_projected(&projected)?)
    }
}

fn clamp_to_frame(x: f32, y: f32, width: u32, height: u32) -> (f32, f32) {
    (
        x.clamp(0.0, width.saturating_sub(1) as f32),
        y.clamp(0.0, height.saturating_sub(1) as f32),
    )
}

fn check_frame(frame: &Frame) -> Result<()> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.width == 0 || frame.height == 0 {
        return Err(anyhow!("empty frame {}x{}", frame.width, frame.height));
    }
    if frame.rgba.len() != expected_len {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }
    Ok(())
}

/// Resizes `frame` to fit a `target_size` square, keeping aspect ratio, and pads the rest black.
pub fn letterbox(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, LetterboxInfo)> {
    check_frame(frame)?;

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((frame.height as f32 * scale).round() as u32).clamp(1, target_size);

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("letterbox resize failed")?;
    let resized = dst_image.into_vec();

    let side = target_size as usize;
    let pad_x = (side - new_w as usize) / 2;
    let pad_y = (side - new_h as usize) / 2;
    let mut canvas = vec![0u8; side * side * 4];
    let src_stride = new_w as usize * 4;
    for (row, src) in resized.chunks_exact(src_stride).enumerate() {
        let dst_offset = ((pad_y + row) * side + pad_x) * 4;
        canvas[dst_offset..dst_offset + src_stride].copy_from_slice(src);
    }

    let input = rgba_to_tensor(&canvas, target_size)?;
    let info = LetterboxInfo {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    Ok((input, info))
}

/// NHWC float tensor in `[0, 1]`, alpha dropped.
fn rgba_to_tensor(rgba: &[u8], side: u32) -> Result<Array4<f32>> {
    let normalized: Vec<f32> = rgba
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ]
        })
        .collect();
    Array4::<f32>::from_shape_vec((1, side as usize, side as usize, 3), normalized)
        .map_err(|err| anyhow!("failed to build input tensor: {err}"))
}

/// Samples a rotated square around `center` into an `output_size` model input.
pub fn rotated_crop(
    frame: &Frame,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform)> {
    check_frame(frame)?;

    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
    };

    let size = output_size as usize;
    let data: Vec<f32> = (0..size * size)
        .into_par_iter()
        .flat_map_iter(|i| {
            let (x, y) = ((i % size) as f32 + 0.5, (i / size) as f32 + 0.5);
            let (sx, sy) = transform.project(x, y);
            sample_rgb(frame, sx, sy)
        })
        .collect();

    let array = Array4::<f32>::from_shape_vec((1, size, size, 3), data)
        .map_err(|err| anyhow!("failed to build crop tensor: {err}"))?;

    Ok((array, transform))
}

/// Splits the landmark model's flat `[x, y, z] * 21` output.
pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>> {
    if flat.len() < NUM_LANDMARKS * 3 {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * 3
        ));
    }

    Ok(flat
        .chunks_exact(3)
        .take(NUM_LANDMARKS)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Bilinear RGB sample; black outside the frame.
fn sample_rgb(frame: &Frame, x: f32, y: f32) -> [f32; 3] {
    if !x.is_finite() || !y.is_finite() {
        return [0.0; 3];
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let (w, h) = (frame.width as i64, frame.height as i64);
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let (ix, iy) = (cx as i64, cy as i64);
        if ix < 0 || iy < 0 || ix >= w || iy >= h {
            return [0.0; 3];
        }
        let idx = ((iy * w + ix) as usize) * 4;
        match frame.rgba.get(idx..idx + 3) {
            Some(px) => [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ],
            None => [0.0; 3],
        }
    };

    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    std::array::from_fn(|c| lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gesture::{GestureClassifier, GestureLabel},
        landmarks::{
            INDEX_PIP, INDEX_TIP, LITTLE_PIP, LITTLE_TIP, LandmarkPoint, MIDDLE_PIP, MIDDLE_TIP,
            RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP,
        },
    };

    #[test]
    fn decode_rejects_short_output() {
        assert!(decode_landmarks(&[0.0; 62]).is_err());
        assert_eq!(decode_landmarks(&[1.0; 70]).unwrap().len(), NUM_LANDMARKS);
    }

    #[test]
    fn letterbox_pads_the_short_side() {
        let frame = Frame::new(vec![255; 40 * 20 * 4], 40, 20);
        let (input, info) = letterbox(&frame, 20).unwrap();

        assert_eq!(input.shape(), &[1, 20, 20, 3]);
        assert_eq!(info.pad_x, 0.0);
        assert_eq!(info.pad_y, 5.0);
        assert_eq!(input[[0, 0, 0, 0]], 0.0);
        assert!((input[[0, 10, 10, 0]] - 1.0).abs() < 0.01);
        assert_eq!(info.unproject(10.0, 10.0), (20.0, 10.0));
    }

    #[test]
    fn letterbox_rejects_truncated_buffers() {
        let frame = Frame::new(vec![0; 10], 4, 4);
        assert!(letterbox(&frame, 16).is_err());
    }

    #[test]
    fn unrotated_crop_projects_center_to_center() {
        let transform = CropTransform {
            center: (100.0, 80.0),
            side: 50.0,
            angle: 0.0,
            output_size: 10,
        };
        assert_eq!(transform.project(5.0, 5.0), (100.0, 80.0));
        assert_eq!(transform.project(0.0, 0.0), (75.0, 55.0));
    }

    #[test]
    fn projection_can_leave_the_frame() {
        let transform = CropTransform {
            center: (0.0, 0.0),
            side: 100.0,
            angle: 0.0,
            output_size: 10,
        };
        assert_eq!(transform.project(0.0, 0.0), (-50.0, -50.0));
        assert_eq!(transform.project(10.0, 10.0), (50.0, 50.0));
    }

    #[test]
    fn project_hand_truncates_to_pixels() {
        let transform = CropTransform {
            center: (50.0, 50.0),
            side: 10.0,
            angle: 0.0,
            output_size: 10,
        };
        let landmarks = vec![[5.7, 5.2, 0.0]; NUM_LANDMARKS];
        let hand = transform.project_hand(&landmarks).unwrap();
        assert_eq!(hand.wrist(), LandmarkPoint::new(50, 50));
        assert!(transform.project_hand(&landmarks[..20]).is_err());
    }

    #[test]
    fn hand_above_the_frame_keeps_tip_joint_order() {
        // Crop centered near the top edge: joints land above y=0, tips 20px higher still.
        let transform = CropTransform {
            center: (100.0, 20.0),
            side: 224.0,
            angle: 0.0,
            output_size: 224,
        };
        let mut landmarks = vec![[112.0, 200.0, 0.0]; NUM_LANDMARKS];
        for &(tip, joint) in &[
            (THUMB_TIP, THUMB_IP),
            (INDEX_TIP, INDEX_PIP),
            (MIDDLE_TIP, MIDDLE_PIP),
            (RING_TIP, RING_PIP),
            (LITTLE_TIP, LITTLE_PIP),
        ] {
            landmarks[joint] = [60.0 + 20.0 * joint as f32, 60.0, 0.0];
            landmarks[tip] = [60.0 + 20.0 * joint as f32, 40.0, 0.0];
        }

        let hand = transform.project_hand(&landmarks).unwrap();
        assert_eq!(hand[INDEX_PIP].y, -32);
        assert_eq!(hand[INDEX_TIP].y, -52);
        assert_eq!(
            GestureClassifier::new().classify(&hand, 1),
            Some(GestureLabel::Hi)
        );
    }

    #[test]
    fn crop_of_uniform_frame_is_uniform_inside() {
        let frame = Frame::new(vec![255; 16 * 16 * 4], 16, 16);
        let (input, _) = rotated_crop(&frame, (8.0, 8.0), 8.0, 0.3, 4).unwrap();
        assert_eq!(input.shape(), &[1, 4, 4, 3]);
        assert!((input[[0, 2, 2, 1]] - 1.0).abs() < 1e-6);
    }
}
