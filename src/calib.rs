//! Camera calibration parameters.
//!
//! Loaded once at startup from a JSON document with keys `mtx` (3x3
//! intrinsic matrix) and `dist` (distortion coefficient vector), the format
//! produced by the arena calibration guide. The contents are passed through
//! to the vision collaborator untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CameraCalibration {
    /// Intrinsic camera matrix, row major.
    pub mtx: [[f64; 3]; 3],
    /// Distortion coefficients.
    pub dist: Vec<f64>,
}

impl CameraCalibration {
    /// Read calibration from `path`. Missing or malformed files are fatal
    /// configuration errors, never retried.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SourceError::config(format!(
                "failed to read calibration file {}: {}",
                path.display(),
                err
            ))
        })?;
        let calibration: CameraCalibration = serde_json::from_str(&raw).map_err(|err| {
            SourceError::config(format!(
                "invalid calibration file {}: {}",
                path.display(),
                err
            ))
        })?;
        Ok(calibration)
    }

    /// Rough intrinsics for an uncalibrated camera: focal length equal to
    /// the frame width, principal point at the center, zero distortion.
    /// Good enough for on-screen demos, not for metric pose work.
    pub fn approximate(width: u32, height: u32) -> Self {
        let f = width as f64;
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;
        Self {
            mtx: [[f, 0.0, cx], [0.0, f, cy], [0.0, 0.0, 1.0]],
            dist: vec![0.0; 5],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_calibration_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp calibration");
        write!(
            file,
            r#"{{
                "mtx": [[1000.0, 0.0, 616.0], [0.0, 1000.0, 616.0], [0.0, 0.0, 1.0]],
                "dist": [0.1, -0.2, 0.0, 0.0, 0.05]
            }}"#
        )
        .expect("write calibration");

        let calibration = CameraCalibration::load(file.path()).unwrap();
        assert_eq!(calibration.mtx[0][0], 1000.0);
        assert_eq!(calibration.dist.len(), 5);
    }

    #[test]
    fn missing_file_is_a_configuration_error() {
        let err = CameraCalibration::load(Path::new("does-not-exist.json")).unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn malformed_file_is_a_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp calibration");
        write!(file, "{{\"mtx\": \"nope\"}}").expect("write calibration");

        let err = CameraCalibration::load(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Configuration(_)));
    }

    #[test]
    fn approximate_centers_the_principal_point() {
        let calibration = CameraCalibration::approximate(1232, 1232);
        assert_eq!(calibration.mtx[0][2], 616.0);
        assert_eq!(calibration.mtx[1][2], 616.0);
        assert!(calibration.dist.iter().all(|d| *d == 0.0));
    }
}
