//! Video frame sources.
//!
//! This module multiplexes the three supported transports behind one
//! pull-based interface:
//! - `multicast-stream`: RTP/JPEG over UDP multicast, decoded by a
//!   background thread (feature: stream-gstreamer)
//! - `pipeline-stream`: an explicit streaming pipeline description, decoded
//!   by a background thread (feature: stream-gstreamer)
//! - `device`: a local camera, read synchronously per poll
//!   (feature: capture-v4l2)
//!
//! Every source speaks "latest frame" semantics: polling never blocks
//! waiting for a new frame, older frames are silently overwritten, and a
//! consumer polling faster than the producer observes repeats. `stub://`
//! URLs and device paths select synthetic backends so the demos and tests
//! run without GStreamer or a camera.

pub mod background;
pub mod device;
pub mod transport;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::frame::Frame;

pub use background::BackgroundDecoder;
pub use device::DirectCapture;
pub use transport::{FrameTransport, SyntheticTransport};

/// Capability set shared by all frame sources.
pub trait FrameSource: Send {
    /// Snapshot of the most recent frame, or `None` if no frame is
    /// available this cycle. Never blocks waiting for a new frame.
    fn poll_frame(&mut self) -> Option<Frame>;

    /// True once at least one frame has been produced.
    fn frame_available(&self) -> bool;

    /// Immediate, non-graceful shutdown. Idempotent: a second call neither
    /// fails nor changes the last observable frame.
    fn stop(&mut self);
}

/// Closed enumeration of the supported source kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Device,
    MulticastStream,
    PipelineStream,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Device,
        SourceKind::MulticastStream,
        SourceKind::PipelineStream,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Device => "device",
            SourceKind::MulticastStream => "multicast-stream",
            SourceKind::PipelineStream => "pipeline-stream",
        }
    }

    fn valid_set() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|kind| kind.as_str()).collect();
        names.join(", ")
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "device" => Ok(SourceKind::Device),
            "multicast-stream" => Ok(SourceKind::MulticastStream),
            "pipeline-stream" => Ok(SourceKind::PipelineStream),
            other => Err(SourceError::UnsupportedSource {
                kind: other.to_string(),
                valid: SourceKind::valid_set(),
            }),
        }
    }
}

/// Transport bindings handed to the factory. Immutable after construction.
#[derive(Clone, Debug)]
pub struct SourceOptions {
    /// Camera device path for `device` (e.g. "/dev/video0", or "stub://...").
    pub device: String,
    /// Stream URL for `multicast-stream` (e.g. "rtp://224.1.1.1:5200").
    pub stream_url: String,
    /// Explicit pipeline description for `pipeline-stream`. `None` selects
    /// the default direct-stream pipeline.
    pub pipeline: Option<String>,
    /// Maximum frame width the shared buffer is sized for.
    pub width: u32,
    /// Maximum frame height the shared buffer is sized for.
    pub height: u32,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            device: device::DEFAULT_DEVICE.to_string(),
            stream_url: transport::DEFAULT_STREAM_URL.to_string(),
            pipeline: None,
            width: transport::DEFAULT_FRAME_WIDTH,
            height: transport::DEFAULT_FRAME_HEIGHT,
        }
    }
}

/// Single factory entry point for all source kinds.
///
/// Misconfiguration surfaces here, at selection time: an unrecognized kind
/// string fails in [`SourceKind::from_str`] before any source is
/// constructed, and a malformed transport URL or pipeline fails before any
/// background context starts.
pub fn select_source(
    kind: SourceKind,
    options: &SourceOptions,
) -> Result<Box<dyn FrameSource>, SourceError> {
    log::info!("selecting video source: {}", kind);
    match kind {
        SourceKind::Device => Ok(Box::new(DirectCapture::open(options)?)),
        SourceKind::MulticastStream => {
            let transport = transport::multicast_transport(options)?;
            Ok(Box::new(BackgroundDecoder::start(
                transport,
                options.width,
                options.height,
            )?))
        }
        SourceKind::PipelineStream => {
            let transport = transport::pipeline_transport(options)?;
            Ok(Box::new(BackgroundDecoder::start(
                transport,
                options.width,
                options.height,
            )?))
        }
    }
}

/// Convenience wrapper parsing the kind from a configuration string.
pub fn select_source_by_name(
    name: &str,
    options: &SourceOptions,
) -> Result<Box<dyn FrameSource>, SourceError> {
    let kind = name.parse::<SourceKind>()?;
    select_source(kind, options)
}
