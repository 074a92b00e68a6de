mod anchors;

use std::{cmp::Ordering, path::Path};

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use self::anchors::{NUM_ANCHORS, palm_anchors};
use super::common::{LetterboxInfo, PALM_INPUT_SIZE, letterbox};
use crate::{config::PalmDetectorConfig, types::Frame};

const PALM_KEYPOINTS: usize = 7;
const BOX_FEATURES: usize = 4 + PALM_KEYPOINTS * 2;
const WRIST_KEYPOINT: usize = 0;
const MIDDLE_MCP_KEYPOINT: usize = 2;
/// How much larger than the palm box the landmark crop is.
const CROP_SCALE: f32 = 2.4;
const MIN_CROP_SIDE: f32 = 80.0;

/// One palm in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub keypoints: Vec<(f32, f32)>,
    pub score: f32,
}

/// Square, rotated region handed to the landmark model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalmCrop {
    pub center: (f32, f32),
    pub side: f32,
    /// Rotation that turns the crop's "up" toward the fingers.
    pub angle: f32,
}

impl PalmRegion {
    pub fn crop(&self) -> PalmCrop {
        let [x1, y1, x2, y2] = self.bbox;
        let center = if self.keypoints.is_empty() {
            ((x1 + x2) * 0.5, (y1 + y2) * 0.5)
        } else {
            let (sx, sy) = self
                .keypoints
                .iter()
                .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
            let n = self.keypoints.len() as f32;
            (sx / n, sy / n)
        };

        let side = (x2 - x1).abs().max((y2 - y1).abs()).max(MIN_CROP_SIDE) * CROP_SCALE;

        PalmCrop {
            center,
            side,
            angle: self.orientation(),
        }
    }

    /// Angle of the wrist to middle-knuckle direction, zero when the fingers point straight up.
    pub fn orientation(&self) -> f32 {
        match (
            self.keypoints.get(WRIST_KEYPOINT),
            self.keypoints.get(MIDDLE_MCP_KEYPOINT),
        ) {
            (Some(&(wx, wy)), Some(&(mx, my))) => (mx - wx).atan2(-(my - wy)),
            _ => 0.0,
        }
    }
}

pub struct PalmDetector {
    session: Session,
    anchors: Vec<[f32; 2]>,
    cfg: PalmDetectorConfig,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load palm detector from {}", model_path.display()))?;

        Ok(Self {
            session,
            anchors: palm_anchors(),
            cfg,
        })
    }

    /// Palms in the frame, best score first.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<PalmRegion>> {
        let (input, info) = letterbox(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run palm detector session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "palm detector returned {} outputs, expected 2",
                outputs.len()
            ));
        }

        let boxes = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let scores: Vec<f32> = scores.iter().copied().collect();

        decode_palms(&boxes, &scores, &self.anchors, &info, &self.cfg)
    }
}

/// Turns raw regressor/classifier outputs into palms in frame pixels.
fn decode_palms(
    boxes: &[f32],
    scores: &[f32],
    anchors: &[[f32; 2]],
    info: &LetterboxInfo,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>> {
    if boxes.len() < NUM_ANCHORS * BOX_FEATURES || scores.len() < NUM_ANCHORS {
        return Err(anyhow!(
            "palm detector output too small: {} box values, {} scores",
            boxes.len(),
            scores.len()
        ));
    }

    let input = PALM_INPUT_SIZE as f32;
    let to_frame = |anchor: &[f32; 2], dx: f32, dy: f32| {
        info.unproject((anchor[0] + dx / input) * input, (anchor[1] + dy / input) * input)
    };

    let mut candidates = Vec::new();
    for (idx, (anchor, raw_score)) in anchors.iter().zip(scores).enumerate() {
        let score = sigmoid(*raw_score);
        if score < cfg.score_threshold {
            continue;
        }

        let features = &boxes[idx * BOX_FEATURES..(idx + 1) * BOX_FEATURES];
        let [cx, cy, w, h] = [features[0], features[1], features[2], features[3]];
        let (x1, y1) = to_frame(anchor, cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = to_frame(anchor, cx + w / 2.0, cy + h / 2.0);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let keypoints = features[4..]
            .chunks_exact(2)
            .map(|kp| to_frame(anchor, kp[0], kp[1]))
            .collect();

        candidates.push(PalmRegion {
            bbox: [x1, y1, x2, y2],
            keypoints,
            score,
        });
    }

    Ok(non_max_suppression(candidates, cfg.nms_threshold, cfg.top_k))
}

fn non_max_suppression(
    mut candidates: Vec<PalmRegion>,
    threshold: f32,
    top_k: usize,
) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<PalmRegion> = Vec::new();
    for candidate in candidates {
        if kept.len() >= top_k {
            break;
        }
        if kept.iter().all(|k| iou(&k.bbox, &candidate.bbox) < threshold) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }

    let area = |r: &[f32; 4]| (r[2] - r[0]).max(0.0) * (r[3] - r[1]).max(0.0);
    let union = area(a) + area(b) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
