//! Camera roll and pitch recovered from the gravity direction.

use nalgebra::{Matrix3, Vector3};

use crate::geometry::GeometryError;

/// Angle in degrees between two vectors.
///
/// Both vectors are normalized and the cosine is clamped to `[-1, 1]` before
/// `acos`.
pub fn vector_angle_deg(a: &Vector3<f64>, b: &Vector3<f64>) -> Result<f64, GeometryError> {
    let a = a.try_normalize(f64::EPSILON).ok_or(GeometryError::DegenerateVector)?;
    let b = b.try_normalize(f64::EPSILON).ok_or(GeometryError::DegenerateVector)?;
    Ok(a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees())
}

/// Roll and pitch (degrees) of a camera given the gravity direction in the
/// world frame and the camera-to-world rotation.
///
/// The camera frame has +X right, +Y up and +Z pointing away from the viewing
/// direction. The up vector expressed in the camera frame is reordered as
/// (Z, X, Y), i.e. Z up, Y right, X backward, before extracting the angles.
pub fn roll_pitch_from_gravity(
    gravity_world: &Vector3<f64>,
    r_world_from_cam: &Matrix3<f64>,
) -> Result<(f64, f64), GeometryError> {
    let gravity = gravity_world
        .try_normalize(f64::EPSILON)
        .ok_or(GeometryError::DegenerateVector)?;

    let up_cam = r_world_from_cam.transpose() * gravity;
    let up = Vector3::new(up_cam.z, up_cam.x, up_cam.y);

    let pitch = -up.x.clamp(-1.0, 1.0).asin();
    let sin_roll = up.y / pitch.cos();
    let roll = -sin_roll.clamp(-1.0, 1.0).asin();

    Ok((roll.to_degrees(), pitch.to_degrees()))
}
