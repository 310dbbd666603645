//! Vision collaborator contract.
//!
//! Two capabilities are consumed: fiducial-marker detection with pose
//! estimation, and color-range blob extraction for energy cores. The
//! contract is intentionally thin: a frame goes in, structured detections
//! come out, and no guarantee is made about the collaborator's internals.
//!
//! The stub backends are deterministic stand-ins so the demo loops run
//! without a vision library linked in.

use anyhow::Result;

use crate::calib::CameraCalibration;
use crate::frame::Frame;

/// Minimum blob area (in pixels) counted as an energy core.
pub const MIN_CORE_AREA: f64 = 1000.0;

/// HSV range for the magenta "positive" energy cores.
pub const POS_CORE_RANGE: HsvRange = HsvRange {
    low: [120.0, 80.0, 100.0],
    high: [175.0, 255.0, 255.0],
};

/// HSV range for the yellow "negative" energy cores.
pub const NEG_CORE_RANGE: HsvRange = HsvRange {
    low: [25.0, 80.0, 100.0],
    high: [40.0, 255.0, 255.0],
};

/// Inclusive low/high HSV color bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvRange {
    pub low: [f32; 3],
    pub high: [f32; 3],
}

/// One detected fiducial marker with its estimated pose.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerDetection {
    pub id: u32,
    /// Corner pixel coordinates, clockwise from top-left.
    pub corners: [[f32; 2]; 4],
    /// Rodrigues rotation vector from pose estimation.
    pub rvec: [f64; 3],
    /// Translation vector from pose estimation.
    pub tvec: [f64; 3],
}

/// Centroid of a detected energy core, in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorePoint {
    pub x: f32,
    pub y: f32,
}

/// Marker detection + pose estimation capability.
pub trait MarkerVision: Send {
    fn name(&self) -> &'static str;

    /// Detect markers in `frame` using the camera intrinsics and the
    /// physical marker edge length in meters.
    fn detect_markers(
        &mut self,
        frame: &Frame,
        calibration: &CameraCalibration,
        marker_size_m: f64,
    ) -> Result<Vec<MarkerDetection>>;
}

/// Color-range segmentation capability.
pub trait CoreVision: Send {
    fn name(&self) -> &'static str;

    /// Detect blobs within `range` covering at least `min_area` pixels and
    /// return their centroids.
    fn detect_cores(
        &mut self,
        frame: &Frame,
        range: &HsvRange,
        min_area: f64,
    ) -> Result<Vec<CorePoint>>;
}

// ----------------------------------------------------------------------------
// Stub backends
// ----------------------------------------------------------------------------

/// Stub marker backend: one marker orbiting the frame center.
pub struct StubMarkerVision {
    frame_count: u64,
}

impl StubMarkerVision {
    pub fn new() -> Self {
        Self { frame_count: 0 }
    }
}

impl Default for StubMarkerVision {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerVision for StubMarkerVision {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect_markers(
        &mut self,
        frame: &Frame,
        _calibration: &CameraCalibration,
        _marker_size_m: f64,
    ) -> Result<Vec<MarkerDetection>> {
        self.frame_count += 1;

        // Advance 6 degrees per frame around a circle in the frame center.
        let angle = (self.frame_count % 60) as f64 * 6.0f64.to_radians();
        let radius = frame.width().min(frame.height()) as f64 / 4.0;
        let cx = frame.width() as f64 / 2.0 + radius * angle.cos();
        let cy = frame.height() as f64 / 2.0 + radius * angle.sin();

        let half = 20.0;
        let corners = [
            [(cx - half) as f32, (cy - half) as f32],
            [(cx + half) as f32, (cy - half) as f32],
            [(cx + half) as f32, (cy + half) as f32],
            [(cx - half) as f32, (cy + half) as f32],
        ];

        Ok(vec![MarkerDetection {
            id: 1,
            corners,
            // Pure Z rotation tracking the orbit angle.
            rvec: [0.0, 0.0, angle],
            tvec: [cx, cy, 1.0],
        }])
    }
}

/// Stub core backend: centroids derived from the requested color range, so
/// positive and negative ranges report different points.
pub struct StubCoreVision;

impl StubCoreVision {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StubCoreVision {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreVision for StubCoreVision {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect_cores(
        &mut self,
        frame: &Frame,
        range: &HsvRange,
        _min_area: f64,
    ) -> Result<Vec<CorePoint>> {
        // Place a single core at a position keyed off the low hue bound.
        let hue = range.low[0] as f32;
        let x = (hue / 180.0) * frame.width() as f32;
        let y = frame.height() as f32 / 2.0;
        Ok(vec![CorePoint { x, y }])
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
