//! Pipeline configuration, loaded from YAML.
//!
//! Every field has a default matching the ETH3D DSLR layout, so a missing
//! configuration file is equivalent to an empty one:
//!
//! ```yaml
//! axis_order: ZYX
//! cameras_file: dslr_calibration_jpg/cameras.txt
//! images_file: dslr_calibration_jpg/images.txt
//! output_json: test.json
//! output_images: images_normalized.txt
//! dataset_suffix: test
//! strict_intrinsics: false
//! reference:
//!   roll: 0.0
//!   pitch: 0.0
//! prediction_file: prediction.json
//! resize:
//!   source_dir: images/dslr_images
//!   target_dir: images/dslr_images_resized
//!   width: 640
//!   height: 480
//! ```

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::geometry::AxisOrder;
use crate::pose::reference_from_prediction;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse YAML: {0}")]
    YamlError(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::YamlError(err.to_string())
    }
}

/// Fixed roll and pitch (degrees) used as the reference orientation of every
/// scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceAngles {
    pub roll: f64,
    pub pitch: f64,
}

impl ReferenceAngles {
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        reference_from_prediction(self.roll, self.pitch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        ResizeConfig {
            source_dir: PathBuf::from("images/dslr_images"),
            target_dir: PathBuf::from("images/dslr_images_resized"),
            width: 640,
            height: 480,
        }
    }
}

/// Settings for converting scene folders. Paths are relative to the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub axis_order: AxisOrder,
    pub cameras_file: PathBuf,
    pub images_file: PathBuf,
    pub output_json: PathBuf,
    pub output_images: PathBuf,
    pub dataset_suffix: String,
    pub strict_intrinsics: bool,
    pub reference: Option<ReferenceAngles>,
    /// Predictor output for the scene; overrides `reference` when the file exists.
    pub prediction_file: Option<PathBuf>,
    pub resize: ResizeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            axis_order: AxisOrder::Zyx,
            cameras_file: PathBuf::from("dslr_calibration_jpg/cameras.txt"),
            images_file: PathBuf::from("dslr_calibration_jpg/images.txt"),
            output_json: PathBuf::from("test.json"),
            output_images: PathBuf::from("images_normalized.txt"),
            dataset_suffix: "test".to_string(),
            strict_intrinsics: false,
            reference: None,
            prediction_file: None,
            resize: ResizeConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    pub fn save_to_yaml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let yaml_string = serde_yaml::to_string(self)?;
        fs::write(path, yaml_string)?;
        Ok(())
    }

    /// Dataset tag written into every frame of a scene, e.g. `courtyard_test`.
    pub fn dataset_tag(&self, scene_name: &str) -> String {
        format!("{}_{}", scene_name, self.dataset_suffix)
    }
}
