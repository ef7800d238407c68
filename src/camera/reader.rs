//! Reader for COLMAP `cameras.txt` files.
//!
//! The file starts with a 3-line comment header followed by one record per
//! line: `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]`.

use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::camera::{CameraError, CameraIntrinsics};

const HEADER_LINES: usize = 3;
const MIN_TOKENS: usize = 6;

/// Reads the first valid camera record of `path`.
///
/// Equivalent to [`read_camera_params_with`] with `strict = false`.
pub fn read_camera_params(path: impl AsRef<Path>) -> Result<CameraIntrinsics, CameraError> {
    read_camera_params_with(path, false)
}

/// Reads the first valid camera record of `path`.
///
/// A record is valid when it has at least 6 whitespace separated tokens and
/// its numeric fields parse. With `strict` set, the model tag and the number
/// of parameters are also checked against
/// [`CameraModelKind`](crate::camera::CameraModelKind).
///
/// # Errors
///
/// * [`CameraError::IOError`] if the file cannot be read.
/// * [`CameraError::MalformedIntrinsics`] if no line holds a valid record.
/// * [`CameraError::UnknownModel`] / [`CameraError::ParameterCount`] from strict validation.
pub fn read_camera_params_with(
    path: impl AsRef<Path>,
    strict: bool,
) -> Result<CameraIntrinsics, CameraError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    for (index, line) in reader.lines().enumerate().skip(HEADER_LINES) {
        let line = line?;
        if let Some(camera) = parse_camera_line(&line, index + 1) {
            if strict {
                camera.validate_strict()?;
            }
            debug!(
                "Camera {} ({}) {}x{} read from {}",
                camera.camera_id,
                camera.model,
                camera.width,
                camera.height,
                path.display()
            );
            return Ok(camera);
        }
    }

    Err(CameraError::MalformedIntrinsics(path.display().to_string()))
}

/// Reads every valid camera record of `path`, in file order.
pub fn read_all_camera_params(
    path: impl AsRef<Path>,
    strict: bool,
) -> Result<Vec<CameraIntrinsics>, CameraError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut cameras = Vec::new();
    for (index, line) in reader.lines().enumerate().skip(HEADER_LINES) {
        let line = line?;
        if let Some(camera) = parse_camera_line(&line, index + 1) {
            if strict {
                camera.validate_strict()?;
            }
            cameras.push(camera);
        }
    }

    if cameras.is_empty() {
        return Err(CameraError::MalformedIntrinsics(path.display().to_string()));
    }
    Ok(cameras)
}

/// Parses one `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]` line.
/// Returns `None` for short lines and lines whose numbers do not parse or
/// are not finite.
fn parse_camera_line(line: &str, line_number: usize) -> Option<CameraIntrinsics> {
    let parts = line.split_whitespace().collect::<Vec<_>>();
    if parts.len() < MIN_TOKENS {
        return None;
    }

    let parsed = (|| -> Result<CameraIntrinsics, String> {
        let camera = CameraIntrinsics {
            camera_id: parse_part(parts[0])?,
            model: parts[1].to_string(),
            width: parse_part(parts[2])?,
            height: parse_part(parts[3])?,
            params: parts[4..]
                .iter()
                .map(|s| parse_part(s))
                .collect::<Result<Vec<f64>, _>>()?,
        };
        if let Some(bad) = camera.params.iter().find(|p| !p.is_finite()) {
            return Err(format!("non-finite parameter {bad}"));
        }
        Ok(camera)
    })();

    match parsed {
        Ok(camera) => Some(camera),
        Err(e) => {
            warn!("Skipping camera record on line {line_number}: {e}");
            None
        }
    }
}

fn parse_part<T: std::str::FromStr>(s: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    s.parse::<T>().map_err(|e| format!("{s}: {e}"))
}
