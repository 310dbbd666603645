//! Arena vision demos.
//!
//! Building blocks for the arena perception/control pipeline: acquire
//! video frames from one of several transports, hand them to a vision
//! collaborator (fiducial markers or color-blob energy cores), convert the
//! detections into arena transforms, and optionally send UDP track-speed
//! commands to a robot.
//!
//! # Module Structure
//!
//! - `frame`: owned image frames and the single-slot latest-frame buffer
//! - `source`: the `FrameSource` abstraction over device capture and
//!   background stream decoding, plus the source-kind factory
//! - `detect`: the vision collaborator contract and marker pose math
//! - `calib`: camera intrinsics/distortion loading
//! - `control`: fire-and-forget UDP robot commands
//! - `config`: layered demo configuration
//!
//! Frame delivery is pull-based "latest frame" everywhere: no queues, no
//! backpressure, and per-frame failures degrade to "no frame this cycle"
//! instead of stopping a live loop.

pub mod calib;
pub mod config;
pub mod control;
pub mod detect;
pub mod error;
pub mod frame;
pub mod source;

pub use calib::CameraCalibration;
pub use config::DemoConfig;
pub use control::{RobotLink, TrackCommand, DEFAULT_ROBOT_ADDR};
pub use detect::{
    marker_poses_to_transforms, CorePoint, CoreVision, HsvRange, MarkerDetection, MarkerTransform,
    MarkerVision, StubCoreVision, StubMarkerVision, MIN_CORE_AREA, NEG_CORE_RANGE, POS_CORE_RANGE,
};
pub use error::SourceError;
pub use frame::{Frame, FrameSlot, CHANNELS};
pub use source::{
    select_source, select_source_by_name, BackgroundDecoder, DirectCapture, FrameSource,
    FrameTransport, SourceKind, SourceOptions, SyntheticTransport,
};
