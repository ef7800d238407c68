use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::pose::{PoseError, RawPose};

const HEADER_LINES: usize = 4;
const RECORD_FIELDS: usize = 10;

/// Reads the poses of a COLMAP `images.txt` file.
///
/// After a fixed 4-line header, every image takes two lines:
///
/// ```text
/// IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME
/// POINTS2D[] as (X, Y, POINT3D_ID)
/// ```
///
/// The observation line is skipped. Blank and `#` lines found where a record
/// is expected are ignored.
///
/// # Errors
///
/// * [`PoseError::MalformedPoseRecord`] if a record line does not hold exactly
///   10 fields or one of its numbers does not parse to a finite value.
/// * [`PoseError::IOError`] if the file cannot be read.
pub fn read_image_poses(path: impl AsRef<Path>) -> Result<Vec<RawPose>, PoseError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines().enumerate().skip(HEADER_LINES);

    let mut poses = Vec::new();
    while let Some((index, line)) = lines.next() {
        let line = line?;
        let record = line.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }
        poses.push(parse_pose_line(record, index + 1)?);

        if let Some((_, observations)) = lines.next() {
            observations?;
        }
    }

    Ok(poses)
}

fn parse_pose_line(line: &str, line_number: usize) -> Result<RawPose, PoseError> {
    let malformed = |reason: String| PoseError::MalformedPoseRecord {
        line: line_number,
        reason,
    };

    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() != RECORD_FIELDS {
        return Err(malformed(format!(
            "expected {RECORD_FIELDS} fields, found {}",
            parts.len()
        )));
    }

    let parse_f64 = |s: &str| match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(malformed(format!("{s}: not a finite number"))),
        Err(e) => Err(malformed(format!("{s}: {e}"))),
    };
    let parse_u32 = |s: &str| s.parse::<u32>().map_err(|e| malformed(format!("{s}: {e}")));

    let quaternion = Quaternion::new(
        parse_f64(parts[1])?,
        parse_f64(parts[2])?,
        parse_f64(parts[3])?,
        parse_f64(parts[4])?,
    );
    if !(quaternion.norm() > f64::EPSILON) {
        return Err(malformed("quaternion has zero length".to_string()));
    }

    Ok(RawPose {
        image_id: parse_u32(parts[0])?,
        orientation: UnitQuaternion::from_quaternion(quaternion),
        position: Vector3::new(
            parse_f64(parts[5])?,
            parse_f64(parts[6])?,
            parse_f64(parts[7])?,
        ),
        camera_id: parse_u32(parts[8])?,
        file_name: parts[9].to_string(),
    })
}
