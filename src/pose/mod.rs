//! Per-frame camera poses and their normalization to a reference frame.
//!
//! [`RawPose`] is one record of a COLMAP `images.txt` file. The sequence
//! assembler turns raw poses into [`NormalizedFrame`]s, which the
//! [`PoseNormalizer`] then rewrites in place so that every rotation is
//! expressed relative to the first frame of the sequence.

use nalgebra::{UnitQuaternion, Vector3};

use crate::camera::Resolution;
use crate::geometry::{quat_to_euler, AxisOrder, EulerAngles};

pub mod normalize;
pub mod prediction;
pub mod reader;

pub use normalize::{normalize, PoseNormalizer};
pub use prediction::{load_prediction, reference_from_prediction, PerspectivePrediction};
pub use reader::read_image_poses;

#[derive(thiserror::Error, Debug)]
pub enum PoseError {
    #[error("Malformed pose record on line {line}: {reason}")]
    MalformedPoseRecord { line: usize, reason: String },
    #[error("Cannot normalize an empty pose sequence")]
    EmptySequence,
    #[error("Failed to parse prediction: {0}")]
    Prediction(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for PoseError {
    fn from(err: std::io::Error) -> Self {
        PoseError::IOError(err.to_string())
    }
}

/// Camera pose of one image as stored by the reconstruction.
///
/// The orientation is renormalized on parse; the source format does not
/// guarantee unit quaternions.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPose {
    pub image_id: u32,
    pub orientation: UnitQuaternion<f64>,
    pub position: Vector3<f64>,
    pub camera_id: u32,
    pub file_name: String,
}

/// A pose together with the image geometry it belongs to.
///
/// `angles` and `vfov` are always derived: the angles from `orientation`
/// under the normalizer's axis order, the vfov from the camera intrinsics.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFrame {
    pub file_name: String,
    pub image_id: u32,
    pub camera_id: u32,
    pub orientation: UnitQuaternion<f64>,
    pub position: Vector3<f64>,
    pub angles: EulerAngles,
    pub resolution: Resolution,
    pub vfov: f64,
    pub dataset: String,
}

impl NormalizedFrame {
    /// Frame with the absolute angles of `pose`, before normalization.
    pub fn from_raw(
        pose: RawPose,
        resolution: Resolution,
        vfov: f64,
        dataset: &str,
        order: AxisOrder,
    ) -> Self {
        let angles = quat_to_euler(&pose.orientation, order);
        NormalizedFrame {
            file_name: pose.file_name,
            image_id: pose.image_id,
            camera_id: pose.camera_id,
            orientation: pose.orientation,
            position: pose.position,
            angles,
            resolution,
            vfov,
            dataset: dataset.to_string(),
        }
    }
}
