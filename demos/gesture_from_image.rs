//! Classifies the hands in still images.
//!
//! `cargo run --example gesture_from_image -- [--save-dir <dir>] [images...]`
//! Without image arguments every png/jpg under `demo/` is used.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hand_gesture_rules::{
    Frame, FrameAnnotator, GestureClassifier, OverlayAnnotator, RecognizerConfig,
    pipeline::{OrtHandDetector, recognize_frame},
};

fn main() -> Result<()> {
    env_logger::init();

    let mut save_dir: Option<PathBuf> = None;
    let mut image_paths = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--save-dir" {
            let Some(dir) = args.next() else {
                bail!("missing value for --save-dir");
            };
            save_dir = Some(PathBuf::from(dir));
        } else {
            image_paths.push(PathBuf::from(arg));
        }
    }

    if image_paths.is_empty() {
        image_paths = demo_images()?;
    }
    if image_paths.is_empty() {
        bail!("no test images found");
    }
    if let Some(dir) = &save_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let config = RecognizerConfig {
        mirror: false,
        ..RecognizerConfig::default()
    };
    let mut detector = OrtHandDetector::from_config(&config)?;
    let classifier = GestureClassifier::new();
    let mut annotator = OverlayAnnotator::default();

    println!("classifying {} images", image_paths.len());

    for path in image_paths {
        let frame = load_frame(&path)?;
        let mut recognized = recognize_frame(&mut detector, &classifier, frame)
            .with_context(|| format!("failed to run detection on {}", path.display()))?;

        if recognized.hands.is_empty() {
            println!("{} -> no hand detected", path.display());
        }
        for (idx, hand) in recognized.hands.iter().enumerate() {
            let text = hand
                .display_text()
                .unwrap_or_else(|| "no gesture".to_string());
            println!("{} -> hand {idx}: {text}", path.display());
        }

        if let Some(dir) = &save_dir {
            annotator.annotate(&mut recognized.frame, &recognized.hands);
            let out = dir.join(output_name(&path));
            save_frame(&recognized.frame, &out)?;
        }
    }

    Ok(())
}

fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(Frame::new(image.into_raw(), width, height))
}

fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let Some(image) = image::RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone())
    else {
        bail!("frame buffer does not match {}x{}", frame.width, frame.height);
    };
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn output_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    format!("{stem}_annotated.png")
}

fn demo_images() -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir("demo").context("failed to read the demo directory")? {
        let path = entry?.path();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if ["png", "jpg", "jpeg"]
                .iter()
                .any(|v| ext.eq_ignore_ascii_case(v))
            {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}
