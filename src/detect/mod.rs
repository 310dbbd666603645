//! Detection glue around the external vision collaborator.
//!
//! The actual marker decoding, pose estimation and color segmentation are
//! owned by an external vision library; this module defines the boundary it
//! is called across (frame in, structured detections out) plus the small
//! amount of math this crate owns: converting marker poses into arena
//! transforms. Deterministic stub backends stand in for the real library in
//! demos and tests.

mod pose;
mod vision;

pub use pose::{
    marker_poses_to_transforms, rodrigues, rotation_matrix_to_euler_degrees, MarkerTransform,
};
pub use vision::{
    CorePoint, CoreVision, HsvRange, MarkerDetection, MarkerVision, StubCoreVision,
    StubMarkerVision, MIN_CORE_AREA, NEG_CORE_RANGE, POS_CORE_RANGE,
};
