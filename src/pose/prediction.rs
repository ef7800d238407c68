//! Output of the perspective-field predictor, used as a reference orientation.

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::geometry::{euler_to_quat, AxisOrder, EulerAngles};
use crate::pose::PoseError;

/// Camera parameters predicted for a single image, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerspectivePrediction {
    pub pred_roll: f64,
    pub pred_pitch: f64,
    pub pred_vfov: f64,
}

impl PerspectivePrediction {
    pub fn reference_rotation(&self) -> UnitQuaternion<f64> {
        reference_from_prediction(self.pred_roll, self.pred_pitch)
    }
}

/// Reference rotation for a predicted roll and pitch (degrees).
///
/// The predictor's angles are defined in the ZXY camera convention with no
/// yaw.
pub fn reference_from_prediction(roll: f64, pitch: f64) -> UnitQuaternion<f64> {
    euler_to_quat(&EulerAngles::new(roll, pitch, 0.0), AxisOrder::Zxy)
}

/// Loads a [`PerspectivePrediction`] from a JSON file.
pub fn load_prediction(path: impl AsRef<Path>) -> Result<PerspectivePrediction, PoseError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| PoseError::Prediction(e.to_string()))
}
