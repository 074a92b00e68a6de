//! Rule-based hand gesture recognition over 21-point hand landmarks.

pub mod annotate;
pub mod config;
pub mod gesture;
pub mod landmarks;
pub mod model_download;
pub mod pipeline;
pub mod types;

pub use annotate::{FrameAnnotator, LogAnnotator, OverlayAnnotator};
pub use config::{AppConfig, PalmDetectorConfig, RecognizerConfig};
pub use gesture::{GestureClassifier, GestureLabel, GestureRule, RULES};
pub use landmarks::{DetectionResult, HandLandmarks, LandmarkError, LandmarkPoint};
pub use types::{Frame, HandGesture, RecognizedFrame};
