//! Per-scene conversion and batch processing over a directory of scenes.

use log::{error, info};
use nalgebra::UnitQuaternion;
use std::fs;
use std::path::{Path, PathBuf};

use crate::camera::read_camera_params_with;
use crate::config::PipelineConfig;
use crate::pose::{load_prediction, read_image_poses, PoseNormalizer};
use crate::sequence::{build_sequence, SequenceError};

/// Where the reference rotation of a scene came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceSource {
    Identity,
    Config,
    Prediction(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub name: String,
    pub frames: usize,
    pub vfov: f64,
    pub reference: ReferenceSource,
    pub json_path: PathBuf,
    pub text_path: PathBuf,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<SceneSummary>,
    /// Scene name and error message of every scene that was skipped.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn total_frames(&self) -> usize {
        self.processed.iter().map(|s| s.frames).sum()
    }
}

fn scene_name(scene_dir: &Path) -> Result<String, SequenceError> {
    scene_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SequenceError::InvalidScene(scene_dir.display().to_string()))
}

fn select_reference(
    scene_dir: &Path,
    config: &PipelineConfig,
) -> Result<(UnitQuaternion<f64>, ReferenceSource), SequenceError> {
    if let Some(file) = &config.prediction_file {
        let path = scene_dir.join(file);
        if path.is_file() {
            let prediction = load_prediction(&path)?;
            return Ok((
                prediction.reference_rotation(),
                ReferenceSource::Prediction(path),
            ));
        }
    }
    match &config.reference {
        Some(angles) => Ok((angles.rotation(), ReferenceSource::Config)),
        None => Ok((UnitQuaternion::identity(), ReferenceSource::Identity)),
    }
}

/// Converts one scene folder: reads its cameras and poses, normalizes the
/// sequence and writes the JSON and reconstruction text artifacts.
///
/// Both artifacts are rendered and staged next to their targets before
/// either is moved into place, so an error leaves the scene folder
/// untouched.
pub fn process_scene(
    scene_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<SceneSummary, SequenceError> {
    let scene_dir = scene_dir.as_ref();
    let name = scene_name(scene_dir)?;

    let camera =
        read_camera_params_with(scene_dir.join(&config.cameras_file), config.strict_intrinsics)?;
    let poses = read_image_poses(scene_dir.join(&config.images_file))?;
    let (reference, source) = select_reference(scene_dir, config)?;

    let normalizer = PoseNormalizer::new(config.axis_order).with_reference(reference);
    let sequence = build_sequence(poses, &camera, &config.dataset_tag(&name), &normalizer)?;

    let json = sequence.to_json()?;
    let text = sequence.to_reconstruction_text();
    let json_path = scene_dir.join(&config.output_json);
    let text_path = scene_dir.join(&config.output_images);
    write_artifacts(&[
        (json_path.as_path(), json.as_str()),
        (text_path.as_path(), text.as_str()),
    ])?;

    Ok(SceneSummary {
        name,
        frames: sequence.len(),
        vfov: camera.vfov()?,
        reference: source,
        json_path,
        text_path,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Writes every file to a staging name first and renames them only once all
/// writes succeeded.
fn write_artifacts(files: &[(&Path, &str)]) -> Result<(), SequenceError> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let partial = staging_path(path);
        if let Err(e) = fs::write(&partial, contents) {
            for written in &staged {
                let _ = fs::remove_file(written);
            }
            return Err(e.into());
        }
        staged.push(partial);
    }
    for (partial, (path, _)) in staged.iter().zip(files) {
        fs::rename(partial, path)?;
    }
    Ok(())
}

/// Immediate subdirectories of `base_dir`, sorted by name.
pub fn scene_dirs(base_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, SequenceError> {
    let mut dirs = fs::read_dir(base_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    dirs.sort();
    Ok(dirs)
}

/// Runs [`process_scene`] on every scene of `base_dir`.
///
/// A failing scene is logged and recorded in the report; the remaining
/// scenes are still processed.
pub fn process_batch(
    base_dir: impl AsRef<Path>,
    config: &PipelineConfig,
) -> Result<BatchReport, SequenceError> {
    let mut report = BatchReport::default();

    for dir in scene_dirs(base_dir)? {
        match process_scene(&dir, config) {
            Ok(summary) => {
                info!(
                    "{}: {} frames, vfov {:.2} deg, reference {:?}",
                    summary.name, summary.frames, summary.vfov, summary.reference
                );
                report.processed.push(summary);
            }
            Err(e) => {
                let name = dir.display().to_string();
                error!("Skipping scene {name}: {e}");
                report.failed.push((name, e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferenceAngles;
    use crate::sequence::load_records;
    use approx::assert_relative_eq;

    fn copy_scene(from: &Path, to: &Path) {
        let calibration = to.join("dslr_calibration_jpg");
        fs::create_dir_all(&calibration).unwrap();
        for file in ["cameras.txt", "images.txt"] {
            fs::copy(from.join("dslr_calibration_jpg").join(file), calibration.join(file)).unwrap();
        }
    }

    #[test]
    fn test_process_scene_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("courtyard");
        copy_scene(Path::new("samples/scene_a"), &scene);

        let summary = process_scene(&scene, &PipelineConfig::default()).unwrap();
        assert_eq!(summary.name, "courtyard");
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.reference, ReferenceSource::Identity);

        let records = load_records(&summary.json_path).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.dataset == "courtyard_test"));
        assert_eq!(records[0].file_name, "dslr_images/DSC_0286.JPG");
        assert!(records[0].roll.abs() < 1e-9);

        let text = fs::read_to_string(&summary.text_path).unwrap();
        assert_eq!(text.lines().count(), 4 + 2 * 3);
    }

    #[test]
    fn test_prediction_file_overrides_config_reference() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("office");
        copy_scene(Path::new("samples/scene_a"), &scene);
        fs::write(
            scene.join("prediction.json"),
            r#"{"pred_roll": 3.0, "pred_pitch": -2.0, "pred_vfov": 60.0}"#,
        )
        .unwrap();

        let config = PipelineConfig {
            axis_order: crate::geometry::AxisOrder::Zxy,
            reference: Some(ReferenceAngles {
                roll: 10.0,
                pitch: 10.0,
            }),
            prediction_file: Some(PathBuf::from("prediction.json")),
            ..PipelineConfig::default()
        };
        let summary = process_scene(&scene, &config).unwrap();
        assert_eq!(
            summary.reference,
            ReferenceSource::Prediction(scene.join("prediction.json"))
        );

        let records = load_records(&summary.json_path).unwrap();
        assert_relative_eq!(records[0].roll, 3.0, epsilon = 1e-9);
        assert_relative_eq!(records[0].pitch, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_failed_scene_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("broken");
        copy_scene(Path::new("samples/scene_broken"), &scene);

        let config = PipelineConfig::default();
        assert!(matches!(
            process_scene(&scene, &config),
            Err(SequenceError::Pose(_))
        ));
        assert!(!scene.join(&config.output_json).exists());
        assert!(!scene.join(&config.output_images).exists());
    }

    #[test]
    fn test_failed_text_write_leaves_no_json() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("courtyard");
        copy_scene(Path::new("samples/scene_a"), &scene);

        let config = PipelineConfig {
            output_images: PathBuf::from("no_such_dir/images_normalized.txt"),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            process_scene(&scene, &config),
            Err(SequenceError::IOError(_))
        ));
        assert!(!scene.join(&config.output_json).exists());
        assert!(!scene.join("test.json.partial").exists());
    }

    #[test]
    fn test_non_finite_pose_fails_the_scene() {
        let dir = tempfile::tempdir().unwrap();
        let scene = dir.path().join("courtyard");
        copy_scene(Path::new("samples/scene_a"), &scene);
        let images = scene.join("dslr_calibration_jpg").join("images.txt");
        let mut contents = fs::read_to_string(&images).unwrap();
        contents.push_str("2 inf 0 0 0 NaN 0 0 0 b.jpg\n\n");
        fs::write(&images, contents).unwrap();

        let config = PipelineConfig::default();
        assert!(matches!(
            process_scene(&scene, &config),
            Err(SequenceError::Pose(_))
        ));
        assert!(!scene.join(&config.output_json).exists());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        copy_scene(Path::new("samples/scene_broken"), &dir.path().join("a_broken"));
        copy_scene(Path::new("samples/scene_a"), &dir.path().join("b_good"));
        fs::create_dir_all(dir.path().join("c_empty")).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a scene").unwrap();

        let report = process_batch(dir.path(), &PipelineConfig::default()).unwrap();
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].name, "b_good");
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.total_frames(), 3);
    }
}
