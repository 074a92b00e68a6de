#[cfg(feature = "camera-nokhwa")]
pub mod camera;
pub mod recognizer;

#[cfg(feature = "camera-nokhwa")]
pub use camera::{CameraDevice, CameraStream, available_cameras, start_camera_stream};
pub use recognizer::{
    HandLandmarkDetector, OrtHandDetector, classify_hands, recognize_frame, spawn_recognizer,
    start_recognizer,
};
