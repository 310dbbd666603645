//! Demo configuration.
//!
//! Layered the usual way: compiled defaults, then an optional JSON config
//! file named by `ARENA_CONFIG`, then `ARENA_*` environment overrides.
//! Validation runs at load time so misconfiguration is fatal at startup,
//! not on the first poll.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SourceError;
use crate::source::{transport, SourceKind, SourceOptions};

const DEFAULT_SOURCE: SourceKind = SourceKind::MulticastStream;
const DEFAULT_DEVICE: &str = "stub://camera";
const DEFAULT_STREAM_URL: &str = "stub://arena";
const DEFAULT_ROBOT_ADDR: &str = crate::control::DEFAULT_ROBOT_ADDR;
/// Physical marker edge length in meters.
const DEFAULT_MARKER_SIZE_M: f64 = 0.15;

#[derive(Debug, Deserialize, Default)]
struct DemoConfigFile {
    source: Option<SourceKind>,
    video: Option<VideoConfigFile>,
    robot: Option<RobotConfigFile>,
    detection: Option<DetectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct VideoConfigFile {
    device: Option<String>,
    stream_url: Option<String>,
    pipeline: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RobotConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    marker_size_m: Option<f64>,
    calibration: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub source: SourceKind,
    pub device: String,
    pub stream_url: String,
    pub pipeline: Option<String>,
    pub width: u32,
    pub height: u32,
    pub robot_addr: String,
    pub marker_size_m: f64,
    pub calibration: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE,
            device: DEFAULT_DEVICE.to_string(),
            stream_url: DEFAULT_STREAM_URL.to_string(),
            pipeline: None,
            width: transport::DEFAULT_FRAME_WIDTH,
            height: transport::DEFAULT_FRAME_HEIGHT,
            robot_addr: DEFAULT_ROBOT_ADDR.to_string(),
            marker_size_m: DEFAULT_MARKER_SIZE_M,
            calibration: None,
        }
    }
}

impl DemoConfig {
    /// Load defaults, file (from `ARENA_CONFIG`), then env overrides.
    pub fn load() -> Result<Self, SourceError> {
        let file_cfg = match std::env::var("ARENA_CONFIG").ok() {
            Some(path) => read_config_file(Path::new(&path))?,
            None => DemoConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: DemoConfigFile) -> Self {
        let defaults = Self::default();
        let video = file.video.unwrap_or_default();
        let detection = file.detection.unwrap_or_default();
        Self {
            source: file.source.unwrap_or(defaults.source),
            device: video.device.unwrap_or(defaults.device),
            stream_url: video.stream_url.unwrap_or(defaults.stream_url),
            pipeline: video.pipeline,
            width: video.width.unwrap_or(defaults.width),
            height: video.height.unwrap_or(defaults.height),
            robot_addr: file
                .robot
                .and_then(|robot| robot.addr)
                .unwrap_or(defaults.robot_addr),
            marker_size_m: detection.marker_size_m.unwrap_or(defaults.marker_size_m),
            calibration: detection.calibration,
        }
    }

    fn apply_env(&mut self) -> Result<(), SourceError> {
        if let Ok(source) = std::env::var("ARENA_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source.parse()?;
            }
        }
        if let Ok(device) = std::env::var("ARENA_DEVICE") {
            if !device.trim().is_empty() {
                self.device = device;
            }
        }
        if let Ok(url) = std::env::var("ARENA_STREAM_URL") {
            if !url.trim().is_empty() {
                self.stream_url = url;
            }
        }
        if let Ok(pipeline) = std::env::var("ARENA_PIPELINE") {
            if !pipeline.trim().is_empty() {
                self.pipeline = Some(pipeline);
            }
        }
        if let Ok(addr) = std::env::var("ARENA_ROBOT_ADDR") {
            if !addr.trim().is_empty() {
                self.robot_addr = addr;
            }
        }
        if let Ok(path) = std::env::var("ARENA_CALIBRATION") {
            if !path.trim().is_empty() {
                self.calibration = Some(PathBuf::from(path));
            }
        }
        if let Ok(width) = std::env::var("ARENA_FRAME_WIDTH") {
            if !width.trim().is_empty() {
                self.width = width
                    .parse()
                    .map_err(|_| SourceError::config("ARENA_FRAME_WIDTH must be an integer"))?;
            }
        }
        if let Ok(height) = std::env::var("ARENA_FRAME_HEIGHT") {
            if !height.trim().is_empty() {
                self.height = height
                    .parse()
                    .map_err(|_| SourceError::config("ARENA_FRAME_HEIGHT must be an integer"))?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), SourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SourceError::config("frame dimensions must be nonzero"));
        }
        if self.marker_size_m <= 0.0 {
            return Err(SourceError::config("marker size must be positive"));
        }
        Ok(())
    }

    /// Transport bindings for the source factory.
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            device: self.device.clone(),
            stream_url: self.stream_url.clone(),
            pipeline: self.pipeline.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

fn read_config_file(path: &Path) -> Result<DemoConfigFile, SourceError> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        SourceError::config(format!(
            "failed to read config file {}: {}",
            path.display(),
            err
        ))
    })?;
    serde_json::from_str(&raw)
        .map_err(|err| SourceError::config(format!("invalid config file {}: {}", path.display(), err)))
}
