use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::model_download::{
    HANDPOSE_ESTIMATOR_MODEL_FILENAME, PALM_DETECTOR_MODEL_FILENAME, default_model_dir,
};

#[derive(Clone, Debug, PartialEq)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 32,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecognizerConfig {
    pub handpose_estimator_model_path: PathBuf,
    pub palm_detector_model_path: PathBuf,
    pub palm: PalmDetectorConfig,
    pub max_hands: usize,
    /// Hands whose landmark presence score falls below this are discarded.
    pub min_hand_presence: f32,
    /// Flip frames horizontally before detection (selfie view).
    pub mirror: bool,
}

impl RecognizerConfig {
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.handpose_estimator_model_path = dir.join(HANDPOSE_ESTIMATOR_MODEL_FILENAME);
        self.palm_detector_model_path = dir.join(PALM_DETECTOR_MODEL_FILENAME);
        self
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            handpose_estimator_model_path: default_model_dir().join(HANDPOSE_ESTIMATOR_MODEL_FILENAME),
            palm_detector_model_path: default_model_dir().join(PALM_DETECTOR_MODEL_FILENAME),
            palm: PalmDetectorConfig::default(),
            max_hands: 2,
            min_hand_presence: 0.2,
            mirror: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub camera_index: u32,
    /// Stop after this many recognized frames; run until the camera stops when unset.
    pub frame_limit: Option<usize>,
    /// Write the last annotated frame here as an image.
    pub save_path: Option<PathBuf>,
    pub recognizer: RecognizerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera_index: 0,
            frame_limit: None,
            save_path: None,
            recognizer: RecognizerConfig::default(),
        }
    }
}

pub const USAGE: &str = "usage: hand-gesture-rules [--camera <index>] [--frames <n>] [--models <dir>] \
[--max-hands <n>] [--no-mirror] [--save <path>]";

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = AppConfig::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--camera" => {
                    config.camera_index = parse_value(&arg, args.next())?;
                }
                "--frames" => {
                    config.frame_limit = Some(parse_value(&arg, args.next())?);
                }
                "--models" => {
                    let dir: String = parse_value(&arg, args.next())?;
                    config.recognizer = config.recognizer.with_model_dir(dir);
                }
                "--max-hands" => {
                    let max_hands: usize = parse_value(&arg, args.next())?;
                    if max_hands == 0 {
                        bail!("--max-hands must be at least 1");
                    }
                    config.recognizer.max_hands = max_hands;
                }
                "--no-mirror" => config.recognizer.mirror = false,
                "--save" => {
                    let path: String = parse_value(&arg, args.next())?;
                    config.save_path = Some(PathBuf::from(path));
                }
                other => bail!("unknown argument `{other}`\n{USAGE}"),
            }
        }

        Ok(config)
    }
}

fn parse_value<T>(flag: &str, value: Option<String>) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(value) = value else {
        bail!("missing value for {flag}\n{USAGE}");
    };
    value
        .parse()
        .with_context(|| format!("invalid value `{value}` for {flag}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let config = AppConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.recognizer.mirror);
        assert_eq!(config.recognizer.max_hands, 2);
    }

    #[test]
    fn parses_all_flags() {
        let config = AppConfig::from_args([
            "--camera",
            "1",
            "--frames",
            "30",
            "--models",
            "/tmp/models",
            "--max-hands",
            "4",
            "--no-mirror",
            "--save",
            "out.png",
        ])
        .unwrap();

        assert_eq!(config.camera_index, 1);
        assert_eq!(config.frame_limit, Some(30));
        assert_eq!(config.recognizer.max_hands, 4);
        assert!(!config.recognizer.mirror);
        assert_eq!(config.save_path, Some(PathBuf::from("out.png")));
        assert_eq!(
            config.recognizer.palm_detector_model_path,
            PathBuf::from("/tmp/models").join(PALM_DETECTOR_MODEL_FILENAME)
        );
    }

    #[test]
    fn rejects_unknown_and_incomplete_flags() {
        assert!(AppConfig::from_args(["--fps"]).is_err());
        assert!(AppConfig::from_args(["--camera"]).is_err());
        assert!(AppConfig::from_args(["--frames", "many"]).is_err());
        assert!(AppConfig::from_args(["--max-hands", "0"]).is_err());
    }
}
