//! Marker pose to arena transform conversion.
//!
//! The vision collaborator reports poses as Rodrigues rotation vectors.
//! The robot backend wants pixel positions and Euler rotations in degrees,
//! so this module owns the conversion: corner mean for the position,
//! rotation vector -> rotation matrix -> Euler angles for the heading.
//! The Euler decomposition matches the MATLAB convention except that the
//! x and z angles are swapped.

use std::collections::BTreeMap;

use anyhow::{ensure, Result};

use super::vision::MarkerDetection;

/// Arena transform of one detected marker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerTransform {
    /// Marker center in pixel coordinates (mean of the four corners).
    pub position: [f32; 2],
    /// Euler rotations in degrees, -180..180, in x/y/z order.
    pub euler_deg: [f32; 3],
}

impl MarkerTransform {
    /// Heading of the marker in the camera plane. For a top-down arena
    /// camera this is the only rotation a robot has.
    pub fn z_rotation_deg(&self) -> f32 {
        self.euler_deg[2]
    }
}

/// Convert detections into a map from marker id to transform.
///
/// Detections whose rotation vector does not decompose into a valid
/// rotation matrix are logged and skipped rather than failing the frame.
pub fn marker_poses_to_transforms(
    detections: &[MarkerDetection],
) -> BTreeMap<u32, MarkerTransform> {
    let mut transforms = BTreeMap::new();

    for detection in detections {
        let mut center = [0.0f32; 2];
        for corner in &detection.corners {
            center[0] += corner[0];
            center[1] += corner[1];
        }
        center[0] /= detection.corners.len() as f32;
        center[1] /= detection.corners.len() as f32;

        let rotation = rodrigues(detection.rvec);
        let euler = match rotation_matrix_to_euler_degrees(&rotation) {
            Ok(euler) => euler,
            Err(err) => {
                log::warn!("skipping marker {}: {}", detection.id, err);
                continue;
            }
        };

        transforms.insert(
            detection.id,
            MarkerTransform {
                position: center,
                euler_deg: [euler[0] as f32, euler[1] as f32, euler[2] as f32],
            },
        );
    }

    transforms
}

/// Rodrigues rotation vector to 3x3 rotation matrix.
///
/// The vector's direction is the rotation axis, its norm the angle in
/// radians. A near-zero vector is the identity rotation.
pub fn rodrigues(rvec: [f64; 3]) -> [[f64; 3]; 3] {
    let theta = (rvec[0] * rvec[0] + rvec[1] * rvec[1] + rvec[2] * rvec[2]).sqrt();
    if theta < 1e-12 {
        return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }

    let k = [rvec[0] / theta, rvec[1] / theta, rvec[2] / theta];
    let (sin, cos) = theta.sin_cos();
    let one_minus_cos = 1.0 - cos;

    let mut rotation = [[0.0f64; 3]; 3];
    for (i, row) in rotation.iter_mut().enumerate() {
        for (j, value) in row.iter_mut().enumerate() {
            let identity = if i == j { 1.0 } else { 0.0 };
            *value = identity * cos + one_minus_cos * k[i] * k[j];
        }
    }
    // Cross-product matrix term, sin(theta) * [k]x.
    rotation[0][1] -= sin * k[2];
    rotation[0][2] += sin * k[1];
    rotation[1][0] += sin * k[2];
    rotation[1][2] -= sin * k[0];
    rotation[2][0] -= sin * k[1];
    rotation[2][1] += sin * k[0];

    rotation
}

/// Decompose a rotation matrix into Euler angles in degrees.
///
/// Fails on matrices that are not orthonormal within 1e-6.
pub fn rotation_matrix_to_euler_degrees(rotation: &[[f64; 3]; 3]) -> Result<[f64; 3]> {
    ensure!(
        is_rotation_matrix(rotation),
        "matrix is not a rotation matrix"
    );

    let sy = (rotation[0][0] * rotation[0][0] + rotation[1][0] * rotation[1][0]).sqrt();
    let singular = sy < 1e-6;

    let (x, y, z) = if !singular {
        (
            rotation[2][1].atan2(rotation[2][2]),
            (-rotation[2][0]).atan2(sy),
            rotation[1][0].atan2(rotation[0][0]),
        )
    } else {
        (
            (-rotation[1][2]).atan2(rotation[1][1]),
            (-rotation[2][0]).atan2(sy),
            0.0,
        )
    };

    Ok([x.to_degrees(), y.to_degrees(), z.to_degrees()])
}

/// R^T * R must be the identity within 1e-6 (Frobenius norm).
fn is_rotation_matrix(rotation: &[[f64; 3]; 3]) -> bool {
    let mut norm_sq = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            // (R^T R)[i][j]
            let mut dot = 0.0;
            for k in 0..3 {
                dot += rotation[k][i] * rotation[k][j];
            }
            let identity = if i == j { 1.0 } else { 0.0 };
            norm_sq += (dot - identity) * (dot - identity);
        }
    }
    norm_sq.sqrt() < 1e-6
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
