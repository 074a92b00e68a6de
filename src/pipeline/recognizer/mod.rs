pub mod common;
pub mod ort;
pub mod palm;

use std::thread;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;

use crate::{
    config::RecognizerConfig,
    gesture::GestureClassifier,
    landmarks::DetectionResult,
    types::{Frame, HandGesture, RecognizedFrame},
};

pub use self::ort::OrtHandDetector;

/// Produces every hand's landmarks, in frame pixels, for one frame.
pub trait HandLandmarkDetector: Send + 'static {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<DetectionResult>;
}

/// Classifies every hand in `frame`, preserving detector order.
pub fn recognize_frame<D: HandLandmarkDetector + ?Sized>(
    detector: &mut D,
    classifier: &GestureClassifier,
    frame: Frame,
) -> anyhow::Result<RecognizedFrame> {
    let detection = detector.detect(&frame)?;
    let hands = classify_hands(classifier, detection);
    Ok(RecognizedFrame { frame, hands })
}

pub fn classify_hands(classifier: &GestureClassifier, detection: DetectionResult) -> Vec<HandGesture> {
    let total_hands = detection.len();
    detection
        .into_par_iter()
        .map(|landmarks| {
            log::debug!("landmarks: {:?}", landmarks.points());
            let label = classifier.classify(&landmarks, total_hands);
            HandGesture { landmarks, label }
        })
        .collect()
}

fn run_worker_loop<D: HandLandmarkDetector>(
    mut detector: D,
    mirror: bool,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<RecognizedFrame>,
) {
    let classifier = GestureClassifier::new();

    while let Some(frame) = recv_latest_frame(&frame_rx) {
        let frame = if mirror { frame.mirrored() } else { frame };
        match recognize_frame(&mut detector, &classifier, frame) {
            Ok(recognized) => {
                if result_tx.send(recognized).is_err() {
                    log::debug!("result receiver dropped, stopping recognizer");
                    break;
                }
            }
            Err(err) => {
                log::warn!("hand detection failed: {err:?}");
            }
        }
    }
}

fn recv_latest_frame(frame_rx: &Receiver<Frame>) -> Option<Frame> {
    let mut frame = frame_rx.recv().ok()?;
    // Skip frames that queued up while the detector was busy.
    while let Ok(newer) = frame_rx.try_recv() {
        frame = newer;
    }
    Some(frame)
}

/// Runs `detector` on its own thread until `frame_rx` closes.
pub fn spawn_recognizer<D: HandLandmarkDetector>(
    detector: D,
    mirror: bool,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<RecognizedFrame>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || run_worker_loop(detector, mirror, frame_rx, result_tx))
}

/// Loads the ONNX Runtime backend described by `config`, then runs it on a worker thread.
/// Model download and session set-up happen on the calling thread so failures reach the caller.
pub fn start_recognizer(
    config: RecognizerConfig,
    frame_rx: Receiver<Frame>,
    result_tx: Sender<RecognizedFrame>,
) -> anyhow::Result<thread::JoinHandle<()>> {
    log::info!(
        "starting hand landmark backend (max {} hands)",
        config.max_hands
    );
    let detector = OrtHandDetector::from_config(&config)
        .context("failed to start hand landmark backend")?;
    log::info!(
        "hand landmark ORT backend ready using {} and palm detector {}",
        config.handpose_estimator_model_path.display(),
        config.palm_detector_model_path.display()
    );
    Ok(spawn_recognizer(detector, config.mirror, frame_rx, result_tx))
}
