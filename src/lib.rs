//! Persfield Tools Library
//!
//! Prepares camera pose datasets for perspective-field training from
//! structure-from-motion reconstructions:
//! - COLMAP `cameras.txt` and `images.txt` readers
//! - Quaternion and Euler angle conversion for the ZYX and ZXY conventions
//! - Vertical field of view from calibrated intrinsics
//! - Normalization of a scene's poses against a reference orientation
//! - JSON and reconstruction text output per scene, with batch processing
//!
//! Supporting modules cover dataset loading, pseudo-uniform parameter
//! sampling, evaluation statistics and image resizing.

pub mod camera;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod geometry;
pub mod imaging;
pub mod pose;
pub mod sampler;
pub mod sequence;

// Re-export commonly used types
pub use camera::{CameraError, CameraIntrinsics, CameraModelKind, Intrinsics, Resolution};
pub use config::{ConfigError, PipelineConfig, ReferenceAngles, ResizeConfig};
pub use geometry::{euler_to_quat, quat_to_euler, AxisOrder, EulerAngles, GeometryError};
pub use pose::{NormalizedFrame, PoseError, PoseNormalizer, RawPose};
pub use sequence::{
    build_sequence, process_batch, process_scene, FrameRecord, FrameSequence, SequenceError,
};
