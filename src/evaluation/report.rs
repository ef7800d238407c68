//! CSV export of the frame sequences of every scene in a directory.

use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use crate::evaluation::EvaluationError;
use crate::sequence::{load_records, scene_dirs, FrameRecord};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    file_name: &'a str,
    dataset: &'a str,
    roll: f64,
    pitch: f64,
    yaw: f64,
    vfov: f64,
}

impl<'a> From<&'a FrameRecord> for CsvRow<'a> {
    fn from(record: &'a FrameRecord) -> Self {
        CsvRow {
            file_name: &record.file_name,
            dataset: &record.dataset,
            roll: record.roll,
            pitch: record.pitch,
            yaw: record.yaw,
            vfov: record.vfov,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Records of every scene under `base_dir` that has a `json_name` file.
/// Scenes without one are skipped with a warning.
pub fn gather_records(
    base_dir: impl AsRef<Path>,
    json_name: impl AsRef<Path>,
) -> Result<Vec<FrameRecord>, EvaluationError> {
    let json_name = json_name.as_ref();
    let mut records = Vec::new();
    for dir in scene_dirs(base_dir)? {
        let path = dir.join(json_name);
        if !path.is_file() {
            warn!("No {} in {}", json_name.display(), dir.display());
            continue;
        }
        records.extend(load_records(&path)?);
    }
    Ok(records)
}

pub fn write_records_csv(
    records: &[FrameRecord],
    path: impl AsRef<Path>,
) -> Result<(), EvaluationError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Min, max and mean of the roll, pitch, yaw and vfov columns.
pub fn summarize_columns(records: &[FrameRecord]) -> Vec<ColumnSummary> {
    if records.is_empty() {
        return Vec::new();
    }
    let columns: [(&'static str, fn(&FrameRecord) -> f64); 4] = [
        ("roll", |r: &FrameRecord| r.roll),
        ("pitch", |r: &FrameRecord| r.pitch),
        ("yaw", |r: &FrameRecord| r.yaw),
        ("vfov", |r: &FrameRecord| r.vfov),
    ];

    columns
        .iter()
        .map(|(name, value)| {
            let values = records.iter().map(value);
            ColumnSummary {
                name: *name,
                min: values.clone().fold(f64::INFINITY, f64::min),
                max: values.clone().fold(f64::NEG_INFINITY, f64::max),
                mean: values.sum::<f64>() / records.len() as f64,
            }
        })
        .collect()
}

/// Gathers every scene's JSON output into one CSV table and logs the range
/// of each angle column.
pub fn export_csv(
    base_dir: impl AsRef<Path>,
    json_name: impl AsRef<Path>,
    out_csv: impl AsRef<Path>,
) -> Result<Vec<ColumnSummary>, EvaluationError> {
    let records = gather_records(base_dir, json_name)?;
    write_records_csv(&records, &out_csv)?;
    info!(
        "Wrote {} records to {}",
        records.len(),
        out_csv.as_ref().display()
    );

    let summary = summarize_columns(&records);
    for column in &summary {
        info!(
            "{}: min {:.3}, max {:.3}, mean {:.3}",
            column.name, column.min, column.max, column.mean
        );
    }
    Ok(summary)
}
