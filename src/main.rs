use anyhow::Result;
use hand_gesture_rules::AppConfig;

fn main() -> Result<()> {
    env_logger::init();

    let config = AppConfig::from_env()?;
    run(config)
}

#[cfg(feature = "camera-nokhwa")]
fn run(config: AppConfig) -> Result<()> {
    use crossbeam_channel::bounded;
    use hand_gesture_rules::{
        Frame, FrameAnnotator, LogAnnotator, OverlayAnnotator,
        pipeline::{available_cameras, start_camera_stream, start_recognizer},
    };

    match available_cameras() {
        Ok(devices) => {
            for device in devices {
                log::info!("found camera {}: {}", device.index, device.label);
            }
        }
        Err(err) => log::warn!("could not list cameras: {err:?}"),
    }

    let (frame_tx, frame_rx) = bounded(1);
    let (result_tx, result_rx) = bounded(1);

    let recognizer = start_recognizer(config.recognizer.clone(), frame_rx, result_tx)?;
    let camera = start_camera_stream(config.camera_index, frame_tx)?;

    let mut annotator: Box<dyn FrameAnnotator> = if config.save_path.is_some() {
        Box::new(OverlayAnnotator::default())
    } else {
        Box::new(LogAnnotator)
    };

    let mut processed = 0usize;
    let mut last_frame: Option<Frame> = None;
    for recognized in result_rx.iter() {
        let mut frame = recognized.frame;
        annotator.annotate(&mut frame, &recognized.hands);
        for text in recognized.hands.iter().filter_map(|hand| hand.display_text()) {
            println!("{text}");
        }
        last_frame = Some(frame);

        processed += 1;
        if config.frame_limit.is_some_and(|limit| processed >= limit) {
            break;
        }
    }

    camera.stop();
    drop(result_rx);
    if recognizer.join().is_err() {
        log::error!("recognizer thread panicked");
    }
    log::info!("processed {processed} frames");

    if let (Some(path), Some(frame)) = (config.save_path.as_deref(), last_frame) {
        save_frame(&frame, path)?;
        log::info!("saved annotated frame to {}", path.display());
    }

    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn run(_config: AppConfig) -> Result<()> {
    anyhow::bail!(
        "built without camera support; enable the `camera-nokhwa` feature or run the gesture_from_image example"
    )
}

#[cfg(feature = "camera-nokhwa")]
fn save_frame(frame: &hand_gesture_rules::Frame, path: &std::path::Path) -> Result<()> {
    use anyhow::{Context, anyhow};

    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
        .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", frame.width, frame.height))?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}
