use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use super::{
    HandLandmarkDetector,
    common::{self, HANDPOSE_INPUT_SIZE},
    palm::{PalmDetector, PalmRegion},
};
use crate::{
    config::RecognizerConfig,
    landmarks::{DetectionResult, HandLandmarks},
    model_download::{ModelKind, ensure_model_ready_with_progress},
    types::Frame,
};

/// Palm detection followed by per-palm landmark regression, both on ONNX Runtime.
pub struct OrtHandDetector {
    handpose: Session,
    palm_detector: PalmDetector,
    max_hands: usize,
    min_presence: f32,
}

/// Raw landmark model output for one crop.
struct HandposeOutput {
    landmarks: Vec<[f32; 3]>,
    presence: f32,
}

impl OrtHandDetector {
    /// Downloads missing models, then loads both sessions.
    pub fn from_config(config: &RecognizerConfig) -> Result<Self> {
        ensure_model_ready_with_progress(
            ModelKind::HandposeEstimator,
            &config.handpose_estimator_model_path,
        )?;
        ensure_model_ready_with_progress(ModelKind::PalmDetector, &config.palm_detector_model_path)?;

        let handpose = load_session(&config.handpose_estimator_model_path)?;
        let palm_detector =
            PalmDetector::new(&config.palm_detector_model_path, config.palm.clone())?;

        Ok(Self {
            handpose,
            palm_detector,
            max_hands: config.max_hands,
            min_presence: config.min_hand_presence,
        })
    }

    fn estimate(&mut self, frame: &Frame, palm: &PalmRegion) -> Result<Option<HandLandmarks>> {
        let crop = palm.crop();
        let (input, transform) =
            common::rotated_crop(frame, crop.center, crop.side, crop.angle, HANDPOSE_INPUT_SIZE)?;
        let output = self.run_handpose(input)?;

        let presence = output.presence * palm.score;
        if presence < self.min_presence {
            log::debug!("dropping hand with presence {presence:.2}");
            return Ok(None);
        }

        transform.project_hand(&output.landmarks).map(Some)
    }

    fn run_handpose(&mut self, input: ndarray::Array4<f32>) -> Result<HandposeOutput> {
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .handpose
            .run(ort::inputs![tensor])
            .context("failed to run handpose session")?;

        if outputs.len() < 1 {
            return Err(anyhow!("handpose model returned no outputs"));
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let landmarks = common::decode_landmarks(&flattened)?;

        let presence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Ok(HandposeOutput {
            landmarks,
            presence: presence.clamp(0.0, 1.0),
        })
    }
}

impl HandLandmarkDetector for OrtHandDetector {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult> {
        let palms = self.palm_detector.detect(frame)?;

        let mut hands = Vec::with_capacity(palms.len().min(self.max_hands));
        for palm in palms.iter().take(self.max_hands) {
            match self.estimate(frame, palm) {
                Ok(Some(hand)) => hands.push(hand),
                Ok(None) => {}
                Err(err) => log::warn!("handpose estimation failed for one palm: {err:?}"),
            }
        }

        Ok(hands)
    }
}

fn load_session(model_path: &Path) -> Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(2)?
        .commit_from_file(model_path)
        .with_context(|| format!("failed to load ORT session from {}", model_path.display()))
}
