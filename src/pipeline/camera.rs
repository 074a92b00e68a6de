use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use crossbeam_channel::{Sender, TrySendError};
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
};

use crate::types::Frame;

/// Pause between retries after a failed frame read.
const FRAME_RETRY_DELAY: Duration = Duration::from_millis(50);
/// Capture gives up after this many failed reads in a row.
const MAX_CONSECUTIVE_FAILURES: u32 = 40;

#[derive(Clone, Debug)]
pub struct CameraDevice {
    pub index: CameraIndex,
    pub label: String,
}

/// Capture thread handle; stops and joins the thread when dropped.
#[derive(Debug)]
pub struct CameraStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CameraStream {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn available_cameras() -> Result<Vec<CameraDevice>> {
    let cameras = query(ApiBackend::Auto).context("failed to enumerate cameras")?;
    Ok(cameras
        .into_iter()
        .map(|info| CameraDevice {
            index: info.index().clone(),
            label: info.human_name(),
        })
        .collect())
}

fn open_camera(index: CameraIndex) -> Result<Camera> {
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera =
        Camera::new(index.clone(), requested).with_context(|| format!("failed to open camera {index}"))?;
    camera
        .open_stream()
        .with_context(|| format!("failed to start stream on camera {index}"))?;
    Ok(camera)
}

/// Captures frames on a background thread and pushes them into `frame_tx`.
/// Frames are dropped while the consumer is busy.
pub fn start_camera_stream(index: u32, frame_tx: Sender<Frame>) -> Result<CameraStream> {
    let index = CameraIndex::Index(index);
    // Fail fast before spawning the capture thread.
    drop(open_camera(index.clone())?);

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut camera = match open_camera(index) {
            Ok(camera) => camera,
            Err(err) => {
                log::error!("failed to open camera: {err:?}");
                return;
            }
        };
        log::info!("capturing at {}", camera.resolution());

        let mut failures = FailureStreak::default();
        while !stop_flag.load(Ordering::Relaxed) {
            let buffer = match camera.frame() {
                Ok(buffer) => {
                    failures.reset();
                    buffer
                }
                Err(err) => {
                    if failures.record() {
                        log::error!(
                            "camera stopped delivering frames after {} failures: {err:?}",
                            failures.count()
                        );
                        break;
                    }
                    log::warn!("camera frame read failed: {err:?}");
                    thread::sleep(FRAME_RETRY_DELAY);
                    continue;
                }
            };

            let decoded = match buffer.decode_image::<RgbFormat>() {
                Ok(img) => img,
                Err(err) => {
                    log::warn!("failed to decode camera frame: {err:?}");
                    continue;
                }
            };

            let (width, height) = decoded.dimensions();
            let rgb = decoded.into_raw();
            if rgb.is_empty() {
                continue;
            }

            let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
            for px in rgb.chunks_exact(3) {
                rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
            }

            if let Err(TrySendError::Disconnected(_)) =
                frame_tx.try_send(Frame::new(rgba, width, height))
            {
                log::info!("frame consumer disconnected, stopping capture");
                break;
            }
        }

        if let Err(err) = camera.stop_stream() {
            log::warn!("failed to stop camera stream: {err:?}");
        }
    });

    Ok(CameraStream {
        stop,
        handle: Some(handle),
    })
}

/// Counts consecutive read failures.
#[derive(Debug, Default)]
struct FailureStreak {
    count: u32,
}

impl FailureStreak {
    /// Records a failure; true once the streak reaches the limit.
    fn record(&mut self) -> bool {
        self.count += 1;
        self.count >= MAX_CONSECUTIVE_FAILURES
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_gives_up_only_after_consecutive_failures() {
        let mut streak = FailureStreak::default();
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(!streak.record());
        }
        streak.reset();
        for _ in 1..MAX_CONSECUTIVE_FAILURES {
            assert!(!streak.record());
        }
        assert!(streak.record());
        assert_eq!(streak.count(), MAX_CONSECUTIVE_FAILURES);
    }
}
