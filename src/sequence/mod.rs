//! Assembly and serialization of a scene's frame sequence.
//!
//! A [`FrameSequence`] is the normalized, file-name ordered list of frames of
//! one scene. It is written twice: as a JSON document consumed by the
//! training data loaders, and as a COLMAP `images.txt` style text file that
//! reconstruction tools can read back.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::camera::{CameraError, CameraIntrinsics};
use crate::pose::{NormalizedFrame, PoseError, PoseNormalizer, RawPose};

pub mod scene;

pub use scene::{
    process_batch, process_scene, scene_dirs, BatchReport, ReferenceSource, SceneSummary,
};

/// Second line of every record in the reconstruction text file. COLMAP stores
/// the 2D observations there; the sequence carries none.
pub const POINTS2D_PLACEHOLDER: &str = "0.0 0.0 -1";

const RECONSTRUCTION_HEADER: [&str; 3] = [
    "# Image list with two lines of data per image:",
    "#   IMAGE_ID, QW, QX, QY, QZ, TX, TY, TZ, CAMERA_ID, NAME",
    "#   POINTS2D[] as (X, Y, POINT3D_ID)",
];

#[derive(thiserror::Error, Debug)]
pub enum SequenceError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Pose(#[from] PoseError),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Invalid scene: {0}")]
    InvalidScene(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SequenceError {
    fn from(err: std::io::Error) -> Self {
        SequenceError::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for SequenceError {
    fn from(err: serde_json::Error) -> Self {
        SequenceError::Json(err.to_string())
    }
}

/// One entry of the JSON `data` array. Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub file_name: String,
    pub image_id: u32,
    pub qw: f64,
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    #[serde(rename = "WIDTH")]
    pub width: u32,
    #[serde(rename = "HEIGHT")]
    pub height: u32,
    pub vfov: f64,
    pub dataset: String,
}

impl From<&NormalizedFrame> for FrameRecord {
    fn from(frame: &NormalizedFrame) -> Self {
        let q = frame.orientation.quaternion();
        FrameRecord {
            file_name: frame.file_name.clone(),
            image_id: frame.image_id,
            qw: q.w,
            qx: q.i,
            qy: q.j,
            qz: q.k,
            tx: frame.position.x,
            ty: frame.position.y,
            tz: frame.position.z,
            roll: frame.angles.roll,
            pitch: frame.angles.pitch,
            yaw: frame.angles.yaw,
            width: frame.resolution.width,
            height: frame.resolution.height,
            vfov: frame.vfov,
            dataset: frame.dataset.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFile {
    pub data: Vec<FrameRecord>,
}

/// Normalized frames of one scene, ordered by file name.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    frames: Vec<NormalizedFrame>,
}

impl FrameSequence {
    pub fn frames(&self) -> &[NormalizedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn records(&self) -> Vec<FrameRecord> {
        self.frames.iter().map(FrameRecord::from).collect()
    }

    /// JSON document `{"data": [...]}` indented with 4 spaces.
    pub fn to_json(&self) -> Result<String, SequenceError> {
        let file = SequenceFile {
            data: self.records(),
        };
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        file.serialize(&mut serializer)?;
        String::from_utf8(buffer).map_err(|e| SequenceError::Json(e.to_string()))
    }

    /// COLMAP `images.txt` rendition: a 4-line comment header, then
    /// `IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME` followed by
    /// [`POINTS2D_PLACEHOLDER`] for every frame.
    pub fn to_reconstruction_text(&self) -> String {
        let mut text = String::new();
        for line in RECONSTRUCTION_HEADER {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&format!(
            "# Number of images: {}, mean observations per image: 1\n",
            self.frames.len()
        ));

        for frame in &self.frames {
            let q = frame.orientation.quaternion();
            let t = &frame.position;
            text.push_str(&format!(
                "{} {} {} {} {} {} {} {} {} {}\n",
                frame.image_id, q.w, q.i, q.j, q.k, t.x, t.y, t.z, frame.camera_id, frame.file_name
            ));
            text.push_str(POINTS2D_PLACEHOLDER);
            text.push('\n');
        }
        text
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), SequenceError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn write_reconstruction_text(&self, path: impl AsRef<Path>) -> Result<(), SequenceError> {
        fs::write(path, self.to_reconstruction_text())?;
        Ok(())
    }
}

/// Builds the normalized sequence of one scene.
///
/// Every pose gets the resolution and vertical field of view of `camera`;
/// the normalizer then orders the frames by file name and expresses them
/// relative to the first one.
///
/// # Errors
///
/// * [`CameraError::InvalidIntrinsics`] if the camera has no valid vfov.
/// * [`PoseError::EmptySequence`] if `poses` is empty.
pub fn build_sequence(
    poses: Vec<RawPose>,
    camera: &CameraIntrinsics,
    dataset_tag: &str,
    normalizer: &PoseNormalizer,
) -> Result<FrameSequence, SequenceError> {
    let vfov = camera.vfov()?;
    let resolution = camera.resolution();

    let mut frames = poses
        .into_iter()
        .map(|pose| {
            if pose.camera_id != camera.camera_id {
                warn!(
                    "{} was taken with camera {}, using intrinsics of camera {}",
                    pose.file_name, pose.camera_id, camera.camera_id
                );
            }
            NormalizedFrame::from_raw(
                pose,
                resolution,
                vfov,
                dataset_tag,
                normalizer.axis_order(),
            )
        })
        .collect::<Vec<_>>();

    normalizer.normalize(&mut frames)?;
    info!(
        "Assembled {} frames for {} (vfov {:.2} deg)",
        frames.len(),
        dataset_tag,
        vfov
    );

    Ok(FrameSequence { frames })
}

/// Reads the `data` array of a JSON file written by [`FrameSequence::write_json`].
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<FrameRecord>, SequenceError> {
    let contents = fs::read_to_string(path)?;
    let file: SequenceFile = serde_json::from_str(&contents)?;
    Ok(file.data)
}
