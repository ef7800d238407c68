//! Camera intrinsics as stored by a structure-from-motion reconstruction.
//!
//! This module provides the [`CameraIntrinsics`] record read from a COLMAP
//! `cameras.txt` file, the table of known camera models with their parameter
//! counts ([`CameraModelKind`]), and the field-of-view helpers in [`fov`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod fov;
pub mod reader;

pub use fov::{focal_from_vfov, vfov_degrees};
pub use reader::{read_all_camera_params, read_camera_params, read_camera_params_with};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("No valid camera record found in {0}")]
    MalformedIntrinsics(String),
    #[error("Invalid intrinsics: {0}")]
    InvalidIntrinsics(String),
    #[error("Camera model {model} expects {expected} parameters, got {actual}")]
    ParameterCount {
        model: String,
        expected: usize,
        actual: usize,
    },
    #[error("Unknown camera model: {0}")]
    UnknownModel(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::IOError(err.to_string())
    }
}

/// Camera models understood by COLMAP, in the order of their numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraModelKind {
    SimplePinhole,
    Pinhole,
    SimpleRadial,
    Radial,
    Opencv,
    OpencvFisheye,
    FullOpencv,
    Fov,
    SimpleRadialFisheye,
    RadialFisheye,
    ThinPrismFisheye,
}

impl CameraModelKind {
    /// Number of entries in `params` for this model.
    pub fn num_params(&self) -> usize {
        match self {
            CameraModelKind::SimplePinhole => 3,
            CameraModelKind::Pinhole => 4,
            CameraModelKind::SimpleRadial => 4,
            CameraModelKind::Radial => 5,
            CameraModelKind::Opencv => 8,
            CameraModelKind::OpencvFisheye => 8,
            CameraModelKind::FullOpencv => 12,
            CameraModelKind::Fov => 5,
            CameraModelKind::SimpleRadialFisheye => 4,
            CameraModelKind::RadialFisheye => 5,
            CameraModelKind::ThinPrismFisheye => 12,
        }
    }

    /// Whether the model shares one focal length between both axes
    /// (`f, cx, cy, ...` instead of `fx, fy, cx, cy, ...`).
    pub fn has_single_focal(&self) -> bool {
        matches!(
            self,
            CameraModelKind::SimplePinhole
                | CameraModelKind::SimpleRadial
                | CameraModelKind::Radial
                | CameraModelKind::SimpleRadialFisheye
                | CameraModelKind::RadialFisheye
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraModelKind::SimplePinhole => "SIMPLE_PINHOLE",
            CameraModelKind::Pinhole => "PINHOLE",
            CameraModelKind::SimpleRadial => "SIMPLE_RADIAL",
            CameraModelKind::Radial => "RADIAL",
            CameraModelKind::Opencv => "OPENCV",
            CameraModelKind::OpencvFisheye => "OPENCV_FISHEYE",
            CameraModelKind::FullOpencv => "FULL_OPENCV",
            CameraModelKind::Fov => "FOV",
            CameraModelKind::SimpleRadialFisheye => "SIMPLE_RADIAL_FISHEYE",
            CameraModelKind::RadialFisheye => "RADIAL_FISHEYE",
            CameraModelKind::ThinPrismFisheye => "THIN_PRISM_FISHEYE",
        }
    }
}

impl fmt::Display for CameraModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraModelKind {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIMPLE_PINHOLE" => Ok(CameraModelKind::SimplePinhole),
            "PINHOLE" => Ok(CameraModelKind::Pinhole),
            "SIMPLE_RADIAL" => Ok(CameraModelKind::SimpleRadial),
            "RADIAL" => Ok(CameraModelKind::Radial),
            "OPENCV" => Ok(CameraModelKind::Opencv),
            "OPENCV_FISHEYE" => Ok(CameraModelKind::OpencvFisheye),
            "FULL_OPENCV" => Ok(CameraModelKind::FullOpencv),
            "FOV" => Ok(CameraModelKind::Fov),
            "SIMPLE_RADIAL_FISHEYE" => Ok(CameraModelKind::SimpleRadialFisheye),
            "RADIAL_FISHEYE" => Ok(CameraModelKind::RadialFisheye),
            "THIN_PRISM_FISHEYE" => Ok(CameraModelKind::ThinPrismFisheye),
            _ => Err(CameraError::UnknownModel(s.to_string())),
        }
    }
}

/// One camera record of a reconstruction.
///
/// `params` holds the model parameters in COLMAP order, i.e. `fx, fy, cx, cy`
/// followed by up to 8 distortion coefficients for the two-focal models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub camera_id: u32,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub params: Vec<f64>,
}

impl CameraIntrinsics {
    /// The parsed model tag, if it is one of the known COLMAP models.
    pub fn model_kind(&self) -> Option<CameraModelKind> {
        self.model.parse().ok()
    }

    /// Vertical focal length in pixels.
    ///
    /// This is `params[1]`, except for the single-focal models where
    /// `params[1]` is the principal point and the shared focal `params[0]`
    /// is returned instead.
    ///
    /// # Errors
    ///
    /// [`CameraError::InvalidIntrinsics`] if the focal parameter is missing.
    pub fn fy(&self) -> Result<f64, CameraError> {
        let index = match self.model_kind() {
            Some(kind) if kind.has_single_focal() => 0,
            _ => 1,
        };
        self.params.get(index).copied().ok_or_else(|| {
            CameraError::InvalidIntrinsics(format!(
                "camera {} ({}) has {} parameters, no focal length at index {index}",
                self.camera_id,
                self.model,
                self.params.len()
            ))
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// Pinhole part of the parameters, `None` when the record is too short.
    pub fn intrinsics(&self) -> Option<Intrinsics> {
        match self.model_kind() {
            Some(kind) if kind.has_single_focal() => {
                if self.params.len() < 3 {
                    return None;
                }
                Some(Intrinsics {
                    fx: self.params[0],
                    fy: self.params[0],
                    cx: self.params[1],
                    cy: self.params[2],
                })
            }
            _ => {
                if self.params.len() < 4 {
                    return None;
                }
                Some(Intrinsics {
                    fx: self.params[0],
                    fy: self.params[1],
                    cx: self.params[2],
                    cy: self.params[3],
                })
            }
        }
    }

    /// Vertical field of view of this camera in degrees.
    pub fn vfov(&self) -> Result<f64, CameraError> {
        vfov_degrees(self.fy()?, self.height)
    }

    /// Checks the model tag and the parameter count against [`CameraModelKind`].
    pub fn validate_strict(&self) -> Result<(), CameraError> {
        let kind: CameraModelKind = self.model.parse()?;
        if self.params.len() != kind.num_params() {
            return Err(CameraError::ParameterCount {
                model: self.model.clone(),
                expected: kind.num_params(),
                actual: self.params.len(),
            });
        }
        Ok(())
    }
}

/// Common validation functions for camera parameters
pub mod validation {
    use super::*;

    pub fn validate_focal_and_height(fy: f64, height: u32) -> Result<(), CameraError> {
        if !fy.is_finite() || fy <= 0.0 {
            return Err(CameraError::InvalidIntrinsics(format!(
                "focal length must be positive, got {fy}"
            )));
        }
        if height == 0 {
            return Err(CameraError::InvalidIntrinsics(
                "image height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thin_prism() -> CameraIntrinsics {
        CameraIntrinsics {
            camera_id: 0,
            model: "THIN_PRISM_FISHEYE".to_string(),
            width: 6048,
            height: 4032,
            params: vec![
                3410.34, 3409.98, 3041.29, 2014.07, 0.21, 0.21, 0.0, 0.0, -0.16, 0.6, 0.0, 0.0,
            ],
        }
    }

    #[test]
    fn test_model_kind_round_trip_names() {
        for name in ["PINHOLE", "OPENCV", "THIN_PRISM_FISHEYE", "SIMPLE_RADIAL"] {
            let kind: CameraModelKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert!(matches!(
            "KANNALA".parse::<CameraModelKind>(),
            Err(CameraError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_fy_uses_second_param_for_two_focal_models() {
        let camera = thin_prism();
        assert_eq!(camera.fy().unwrap(), 3409.98);
        assert!(camera.validate_strict().is_ok());
    }

    #[test]
    fn test_fy_uses_shared_focal_for_single_focal_models() {
        let camera = CameraIntrinsics {
            camera_id: 1,
            model: "SIMPLE_RADIAL".to_string(),
            width: 640,
            height: 480,
            params: vec![500.0, 320.0, 240.0, 0.01],
        };
        assert_eq!(camera.fy().unwrap(), 500.0);
        let intrinsics = camera.intrinsics().unwrap();
        assert_eq!(intrinsics.cx, 320.0);
        assert_eq!(intrinsics.cy, 240.0);
    }

    #[test]
    fn test_missing_focal_is_an_error() {
        let mut camera = thin_prism();
        camera.params.truncate(1);
        assert!(matches!(camera.fy(), Err(CameraError::InvalidIntrinsics(_))));
        assert!(matches!(camera.vfov(), Err(CameraError::InvalidIntrinsics(_))));

        camera.model = "SIMPLE_PINHOLE".to_string();
        camera.params.clear();
        assert!(matches!(camera.fy(), Err(CameraError::InvalidIntrinsics(_))));
    }

    #[test]
    fn test_validate_strict_rejects_wrong_count() {
        let mut camera = thin_prism();
        camera.params.truncate(8);
        match camera.validate_strict() {
            Err(CameraError::ParameterCount {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 12);
                assert_eq!(actual, 8);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_focal_and_height() {
        assert!(validation::validate_focal_and_height(100.0, 10).is_ok());
        assert!(validation::validate_focal_and_height(0.0, 10).is_err());
        assert!(validation::validate_focal_and_height(f64::NAN, 10).is_err());
        assert!(validation::validate_focal_and_height(100.0, 0).is_err());
    }
}
