use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::{DetectionFilter, Label};
use crate::pipeline::StalePolicy;
use crate::sink::{DEFAULT_JPEG_QUALITY, DEFAULT_PREFIX};
use crate::track::TrackerConfig;

pub const DEFAULT_MODEL_PATH: &str = "models/mobilenet-ssd.onnx";
const DEFAULT_INPUT: &str = "stub://camera";
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_MIN_CONFIDENCE: f32 = 0.75;

#[derive(Debug, Deserialize, Default)]
struct ViewerConfigFile {
    model: Option<PathBuf>,
    input: Option<String>,
    target_fps: Option<u32>,
    output_dir: Option<PathBuf>,
    detection: Option<DetectionConfigFile>,
    jpeg: Option<JpegConfigFile>,
    tracker: Option<TrackerConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    label: Option<Label>,
    min_confidence: Option<f32>,
    stale_policy: Option<StalePolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct JpegConfigFile {
    prefix: Option<String>,
    quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    max_tracklets: Option<usize>,
    confidence_threshold: Option<f32>,
    min_iou: Option<f32>,
    max_lost_frames: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub model: PathBuf,
    pub input: String,
    pub target_fps: u32,
    pub output_dir: PathBuf,
    pub detection: DetectionSettings,
    pub jpeg: JpegSettings,
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    pub label: Label,
    pub min_confidence: f32,
    pub stale_policy: StalePolicy,
}

impl DetectionSettings {
    pub fn filter(&self) -> DetectionFilter {
        DetectionFilter::new(self.label, self.min_confidence)
    }
}

#[derive(Debug, Clone)]
pub struct JpegSettings {
    pub prefix: String,
    pub quality: u8,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        // An empty file yields the built-in defaults.
        Self::from_file(ViewerConfigFile::default())
    }
}

impl ViewerConfig {
    /// Defaults, then the JSON file named by `OAKVIEW_CONFIG`, then `OAKVIEW_*` overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OAKVIEW_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ViewerConfigFile) -> Self {
        let tracker_defaults = TrackerConfig::default();
        let detection = DetectionSettings {
            label: file
                .detection
                .as_ref()
                .and_then(|detection| detection.label)
                .unwrap_or(Label::Person),
            min_confidence: file
                .detection
                .as_ref()
                .and_then(|detection| detection.min_confidence)
                .unwrap_or(DEFAULT_MIN_CONFIDENCE),
            stale_policy: file
                .detection
                .and_then(|detection| detection.stale_policy)
                .unwrap_or_default(),
        };
        let jpeg = JpegSettings {
            prefix: file
                .jpeg
                .as_ref()
                .and_then(|jpeg| jpeg.prefix.clone())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            quality: file
                .jpeg
                .and_then(|jpeg| jpeg.quality)
                .unwrap_or(DEFAULT_JPEG_QUALITY),
        };
        let tracker = match file.tracker {
            Some(tracker) => TrackerConfig {
                max_tracklets: tracker
                    .max_tracklets
                    .unwrap_or(tracker_defaults.max_tracklets),
                confidence_threshold: tracker
                    .confidence_threshold
                    .unwrap_or(tracker_defaults.confidence_threshold),
                min_iou: tracker.min_iou.unwrap_or(tracker_defaults.min_iou),
                max_lost_frames: tracker
                    .max_lost_frames
                    .unwrap_or(tracker_defaults.max_lost_frames),
            },
            None => tracker_defaults,
        };
        Self {
            model: file
                .model
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            input: file.input.unwrap_or_else(|| DEFAULT_INPUT.to_string()),
            target_fps: file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            detection,
            jpeg,
            tracker,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var("OAKVIEW_MODEL") {
            if !model.trim().is_empty() {
                self.model = PathBuf::from(model);
            }
        }
        if let Ok(input) = std::env::var("OAKVIEW_INPUT") {
            if !input.trim().is_empty() {
                self.input = input;
            }
        }
        if let Ok(label) = std::env::var("OAKVIEW_TARGET_LABEL") {
            if !label.trim().is_empty() {
                self.detection.label = label
                    .parse()
                    .map_err(|e| anyhow!("OAKVIEW_TARGET_LABEL: {}", e))?;
            }
        }
        if let Ok(confidence) = std::env::var("OAKVIEW_MIN_CONFIDENCE") {
            self.detection.min_confidence = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("OAKVIEW_MIN_CONFIDENCE must be a number between 0 and 1"))?;
        }
        if let Ok(dir) = std::env::var("OAKVIEW_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(policy) = std::env::var("OAKVIEW_STALE_POLICY") {
            if !policy.trim().is_empty() {
                self.detection.stale_policy = policy
                    .parse()
                    .map_err(|e| anyhow!("OAKVIEW_STALE_POLICY: {}", e))?;
            }
        }
        Ok(())
    }

    /// Check ranges. Binaries call this again after applying CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.input.trim().is_empty() {
            return Err(anyhow!("input must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be between 0 and 1, got {}",
                self.detection.min_confidence
            ));
        }
        if !(1..=100).contains(&self.jpeg.quality) {
            return Err(anyhow!(
                "jpeg quality must be in 1..=100, got {}",
                self.jpeg.quality
            ));
        }
        if self.jpeg.prefix.trim().is_empty() || self.jpeg.prefix.contains('/') {
            return Err(anyhow!("jpeg prefix must be a plain file name prefix"));
        }
        if self.tracker.max_tracklets == 0 {
            return Err(anyhow!("tracker max_tracklets must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.tracker.confidence_threshold)
            || !(0.0..=1.0).contains(&self.tracker.min_iou)
        {
            return Err(anyhow!(
                "tracker confidence_threshold and min_iou must be between 0 and 1"
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ViewerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
