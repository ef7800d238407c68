//! Vertical field of view of a pinhole camera.

use crate::camera::{validation, CameraError};

/// Computes the vertical field of view in degrees.
///
/// `vfov = 2 * atan(height / (2 * fy))`
///
/// # Errors
///
/// [`CameraError::InvalidIntrinsics`] when `fy` is not a positive finite
/// number or `height` is zero.
pub fn vfov_degrees(fy: f64, height: u32) -> Result<f64, CameraError> {
    validation::validate_focal_and_height(fy, height)?;
    let half_height = height as f64 / 2.0;
    Ok((2.0 * (half_height / fy).atan()).to_degrees())
}

/// Inverse of [`vfov_degrees`]: the focal length in pixels that gives
/// `vfov_deg` over `height` pixels.
pub fn focal_from_vfov(vfov_deg: f64, height: u32) -> Result<f64, CameraError> {
    if !(vfov_deg > 0.0 && vfov_deg < 180.0) {
        return Err(CameraError::InvalidIntrinsics(format!(
            "vertical field of view must be in (0, 180) degrees, got {vfov_deg}"
        )));
    }
    if height == 0 {
        return Err(CameraError::InvalidIntrinsics(
            "image height must be positive".to_string(),
        ));
    }
    Ok(height as f64 / 2.0 / (vfov_deg.to_radians() / 2.0).tan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vfov_known_value() {
        let vfov = vfov_degrees(3000.0, 4000).unwrap();
        assert_relative_eq!(vfov, (2.0 * (4000.0f64 / 6000.0).atan()).to_degrees());
        assert!((vfov - 67.38).abs() < 0.01);
    }

    #[test]
    fn test_vfov_square_frustum_is_ninety_degrees() {
        assert_relative_eq!(vfov_degrees(240.0, 480).unwrap(), 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vfov_decreases_with_focal() {
        let mut previous = f64::INFINITY;
        for fy in [10.0, 100.0, 500.0, 1000.0, 3000.0, 10000.0] {
            let vfov = vfov_degrees(fy, 1080).unwrap();
            assert!(vfov < previous, "vfov {vfov} not below {previous}");
            previous = vfov;
        }
    }

    #[test]
    fn test_vfov_increases_with_height() {
        let mut previous = 0.0;
        for height in [1, 10, 240, 480, 1080, 4000] {
            let vfov = vfov_degrees(800.0, height).unwrap();
            assert!(vfov > previous, "vfov {vfov} not above {previous}");
            previous = vfov;
        }
    }

    #[test]
    fn test_vfov_rejects_invalid_input() {
        assert!(matches!(
            vfov_degrees(0.0, 480),
            Err(CameraError::InvalidIntrinsics(_))
        ));
        assert!(matches!(
            vfov_degrees(-5.0, 480),
            Err(CameraError::InvalidIntrinsics(_))
        ));
        assert!(matches!(
            vfov_degrees(500.0, 0),
            Err(CameraError::InvalidIntrinsics(_))
        ));
    }

    #[test]
    fn test_focal_from_vfov_inverts_vfov() {
        let focal = focal_from_vfov(67.38013505195957, 4000).unwrap();
        assert_relative_eq!(focal, 3000.0, max_relative = 1e-9);
        assert!(focal_from_vfov(180.0, 480).is_err());
        assert!(focal_from_vfov(0.0, 480).is_err());
    }
}
