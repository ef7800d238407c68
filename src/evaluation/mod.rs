//! Error statistics for predicted camera parameters and up fields.

use log::{info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::geometry::{vector_angle_deg, GeometryError};
use crate::pose::PerspectivePrediction;
use crate::sequence::{FrameRecord, SequenceError};

pub mod report;

pub use report::{export_csv, gather_records, summarize_columns, write_records_csv, ColumnSummary};

/// Errors at or below this many degrees count as accurate.
pub const ACCURACY_THRESHOLD_DEG: f64 = 5.0;

#[derive(thiserror::Error, Debug)]
pub enum EvaluationError {
    #[error("No errors to summarize")]
    NoErrors,
    #[error("No prediction matches a ground truth frame")]
    NoMatches,
    #[error("Field size mismatch: {predicted} predicted vs {ground_truth} ground truth vectors")]
    FieldSizeMismatch {
        predicted: usize,
        ground_truth: usize,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for EvaluationError {
    fn from(err: std::io::Error) -> Self {
        EvaluationError::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for EvaluationError {
    fn from(err: serde_json::Error) -> Self {
        EvaluationError::Json(err.to_string())
    }
}

impl From<csv::Error> for EvaluationError {
    fn from(err: csv::Error) -> Self {
        EvaluationError::Csv(err.to_string())
    }
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Percentage (0 to 100) of errors within [`ACCURACY_THRESHOLD_DEG`].
    pub within_threshold: f64,
}

impl fmt::Debug for ErrorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error Stats [ count: {}, mean: {:.4}, median: {:.4}, <= {} deg: {:.2}% ]",
            self.count, self.mean, self.median, ACCURACY_THRESHOLD_DEG, self.within_threshold
        )
    }
}

impl ErrorStats {
    pub fn from_errors(errors: &[f64]) -> Result<Self, EvaluationError> {
        if errors.is_empty() {
            return Err(EvaluationError::NoErrors);
        }

        let n = errors.len() as f64;
        let mean = errors.iter().sum::<f64>() / n;

        let mut sorted = errors.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        let accurate = errors
            .iter()
            .filter(|&&e| e <= ACCURACY_THRESHOLD_DEG)
            .count();

        Ok(ErrorStats {
            count: errors.len(),
            mean,
            median,
            within_threshold: 100.0 * accurate as f64 / n,
        })
    }
}

/// Predictor output for one image, keyed by its file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPrediction {
    pub file_name: String,
    #[serde(flatten)]
    pub prediction: PerspectivePrediction,
}

/// Reads a JSON array of [`NamedPrediction`].
pub fn load_named_predictions(
    path: impl AsRef<Path>,
) -> Result<Vec<NamedPrediction>, EvaluationError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[derive(Debug, Clone)]
pub struct PredictionComparison {
    pub matched: usize,
    pub unmatched: Vec<String>,
    pub roll: ErrorStats,
    pub pitch: ErrorStats,
    pub vfov: ErrorStats,
}

/// Absolute roll, pitch and vfov errors of `predictions` against the
/// ground-truth frames with the same file name.
pub fn compare_predictions(
    ground_truth: &[FrameRecord],
    predictions: &[NamedPrediction],
) -> Result<PredictionComparison, EvaluationError> {
    let by_name = ground_truth
        .iter()
        .map(|record| (record.file_name.as_str(), record))
        .collect::<HashMap<_, _>>();

    let mut roll_errors = Vec::new();
    let mut pitch_errors = Vec::new();
    let mut vfov_errors = Vec::new();
    let mut unmatched = Vec::new();

    for named in predictions {
        let Some(gt) = by_name.get(named.file_name.as_str()) else {
            warn!("No ground truth frame for prediction {}", named.file_name);
            unmatched.push(named.file_name.clone());
            continue;
        };
        let p = &named.prediction;
        roll_errors.push((p.pred_roll - gt.roll).abs());
        pitch_errors.push((p.pred_pitch - gt.pitch).abs());
        vfov_errors.push((p.pred_vfov - gt.vfov).abs());
    }

    if roll_errors.is_empty() {
        return Err(EvaluationError::NoMatches);
    }

    let comparison = PredictionComparison {
        matched: roll_errors.len(),
        unmatched,
        roll: ErrorStats::from_errors(&roll_errors)?,
        pitch: ErrorStats::from_errors(&pitch_errors)?,
        vfov: ErrorStats::from_errors(&vfov_errors)?,
    };
    info!(
        "Compared {} predictions ({} unmatched)",
        comparison.matched,
        comparison.unmatched.len()
    );
    info!("roll: {:?}", comparison.roll);
    info!("pitch: {:?}", comparison.pitch);
    info!("vfov: {:?}", comparison.vfov);
    Ok(comparison)
}

/// Per-pixel angle in degrees between predicted and ground-truth up vectors.
pub fn up_field_errors(
    predicted: &[Vector3<f64>],
    ground_truth: &[Vector3<f64>],
) -> Result<Vec<f64>, EvaluationError> {
    if predicted.len() != ground_truth.len() {
        return Err(EvaluationError::FieldSizeMismatch {
            predicted: predicted.len(),
            ground_truth: ground_truth.len(),
        });
    }
    predicted
        .iter()
        .zip(ground_truth)
        .map(|(p, g)| vector_angle_deg(p, g).map_err(EvaluationError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(file_name: &str, roll: f64, pitch: f64, vfov: f64) -> FrameRecord {
        FrameRecord {
            file_name: file_name.to_string(),
            image_id: 1,
            qw: 1.0,
            qx: 0.0,
            qy: 0.0,
            qz: 0.0,
            tx: 0.0,
            ty: 0.0,
            tz: 0.0,
            roll,
            pitch,
            yaw: 0.0,
            width: 640,
            height: 480,
            vfov,
            dataset: "courtyard_test".to_string(),
        }
    }

    fn prediction(file_name: &str, roll: f64, pitch: f64, vfov: f64) -> NamedPrediction {
        NamedPrediction {
            file_name: file_name.to_string(),
            prediction: PerspectivePrediction {
                pred_roll: roll,
                pred_pitch: pitch,
                pred_vfov: vfov,
            },
        }
    }

    #[test]
    fn test_error_stats() {
        let stats = ErrorStats::from_errors(&[1.0, 7.0, 3.0, 5.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.mean, 4.0);
        assert_relative_eq!(stats.median, 4.0);
        assert_relative_eq!(stats.within_threshold, 75.0);

        let odd = ErrorStats::from_errors(&[9.0, 2.0, 6.0]).unwrap();
        assert_relative_eq!(odd.median, 6.0);

        assert!(matches!(
            ErrorStats::from_errors(&[]),
            Err(EvaluationError::NoErrors)
        ));
    }

    #[test]
    fn test_compare_predictions_by_file_name() {
        let gt = vec![
            record("a.JPG", 1.0, -2.0, 60.0),
            record("b.JPG", 0.0, 0.0, 50.0),
        ];
        let preds = vec![
            prediction("b.JPG", 2.0, 1.0, 56.0),
            prediction("a.JPG", 1.5, -2.0, 58.0),
            prediction("missing.JPG", 0.0, 0.0, 0.0),
        ];

        let comparison = compare_predictions(&gt, &preds).unwrap();
        assert_eq!(comparison.matched, 2);
        assert_eq!(comparison.unmatched, vec!["missing.JPG".to_string()]);
        assert_relative_eq!(comparison.roll.mean, 1.25);
        assert_relative_eq!(comparison.pitch.mean, 0.5);
        assert_relative_eq!(comparison.vfov.mean, 4.0);
        assert_relative_eq!(comparison.vfov.within_threshold, 50.0);
    }

    #[test]
    fn test_compare_without_matches() {
        let gt = vec![record("a.JPG", 0.0, 0.0, 60.0)];
        let preds = vec![prediction("z.JPG", 0.0, 0.0, 60.0)];
        assert!(matches!(
            compare_predictions(&gt, &preds),
            Err(EvaluationError::NoMatches)
        ));
    }

    #[test]
    fn test_named_prediction_is_flat_json() {
        let parsed: Vec<NamedPrediction> = serde_json::from_str(
            r#"[{"file_name": "a.JPG", "pred_roll": 1.0, "pred_pitch": 2.0, "pred_vfov": 3.0}]"#,
        )
        .unwrap();
        assert_eq!(parsed, vec![prediction("a.JPG", 1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_up_field_errors() {
        let pred = vec![Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 0.0)];
        let gt = vec![Vector3::new(0.0, 2.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];
        let errors = up_field_errors(&pred, &gt).unwrap();
        assert_relative_eq!(errors[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(errors[1], 45.0, epsilon = 1e-9);

        let stats = ErrorStats::from_errors(&errors).unwrap();
        assert_relative_eq!(stats.within_threshold, 50.0);

        assert!(matches!(
            up_field_errors(&pred, &gt[..1]),
            Err(EvaluationError::FieldSizeMismatch { .. })
        ));
    }
}
