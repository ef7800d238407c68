//! Loader for the JSON frame lists consumed by the training data pipeline.
//!
//! Entries produced by [`crate::sequence`] only carry geometry, while
//! datasets prepared elsewhere may add per-pixel label files. Those are
//! optional fields of [`DatasetRecord`] rather than keys probed at runtime.

use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASET: &str = "livingroom";

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("JSON error: {0}")]
    Json(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Json(err.to_string())
    }
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub file_name: PathBuf,
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default)]
    pub mask_on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude_file_name: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravity_file_name: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vfov: Option<f64>,
    #[serde(rename = "WIDTH", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(rename = "HEIGHT", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    data: Vec<DatasetRecord>,
}

/// Loads the `data` array of `json_file`, resolving every file name against
/// `img_root`. Masks are never enabled for these datasets.
pub fn load_dataset_json(
    json_file: impl AsRef<Path>,
    img_root: impl AsRef<Path>,
) -> Result<Vec<DatasetRecord>, DatasetError> {
    let json_file = json_file.as_ref();
    let img_root = img_root.as_ref();

    let contents = fs::read_to_string(json_file)?;
    let summary: DatasetFile = serde_json::from_str(&contents)?;

    let records = summary
        .data
        .into_iter()
        .map(|mut record| {
            record.file_name = img_root.join(&record.file_name);
            record.mask_on = false;
            record.latitude_file_name = record.latitude_file_name.map(|p| img_root.join(p));
            record.gravity_file_name = record.gravity_file_name.map(|p| img_root.join(p));
            record
        })
        .collect::<Vec<_>>();

    info!(
        "{}: Loaded {} entries.",
        json_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        records.len()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dataset_json() {
        let records = load_dataset_json("samples/dataset/test.json", "/data/eth3d").unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.file_name,
            PathBuf::from("/data/eth3d/dslr_images/DSC_0286.JPG")
        );
        assert_eq!(first.dataset, "courtyard_test");
        assert!(!first.mask_on);
        assert!(first.latitude_file_name.is_none());
        assert_eq!(first.width, Some(6048));

        let second = &records[1];
        assert_eq!(second.dataset, DEFAULT_DATASET);
        assert_eq!(
            second.latitude_file_name.as_deref(),
            Some(Path::new("/data/eth3d/latitude/DSC_0287.npz"))
        );
        assert_eq!(
            second.gravity_file_name.as_deref(),
            Some(Path::new("/data/eth3d/gravity/DSC_0287.npz"))
        );
        assert_eq!(second.roll, Some(-1.25));
        assert_eq!(second.height, None);
    }

    #[test]
    fn test_missing_data_key_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"frames": []}"#).unwrap();
        assert!(matches!(
            load_dataset_json(&path, "/data"),
            Err(DatasetError::Json(_))
        ));
    }
}
