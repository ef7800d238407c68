//! Downscaling of scene images for training and preview.

use image::imageops::FilterType;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ResizeConfig;
use crate::sequence::{scene_dirs, SequenceError};

#[derive(thiserror::Error, Debug)]
pub enum ImagingError {
    #[error("Image error for {path}: {reason}")]
    Image { path: String, reason: String },
    #[error(transparent)]
    Scenes(#[from] SequenceError),
    #[error("Source directory does not exist: {0}")]
    MissingSource(String),
    #[error("IO Error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for ImagingError {
    fn from(err: std::io::Error) -> Self {
        ImagingError::IOError(err.to_string())
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg"))
}

fn jpeg_files(dir: &Path) -> Result<Vec<PathBuf>, ImagingError> {
    let mut files = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_jpeg(path))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

/// Resizes every `.jpg` of `source_dir` to exactly `width` x `height` with a
/// Lanczos filter, saving under the same file name in `target_dir`.
///
/// Returns the number of images written.
pub fn resize_images(
    source_dir: impl AsRef<Path>,
    target_dir: impl AsRef<Path>,
    width: u32,
    height: u32,
) -> Result<usize, ImagingError> {
    let source_dir = source_dir.as_ref();
    let target_dir = target_dir.as_ref();
    if !source_dir.is_dir() {
        return Err(ImagingError::MissingSource(source_dir.display().to_string()));
    }
    fs::create_dir_all(target_dir)?;

    let files = jpeg_files(source_dir)?;
    for path in &files {
        let img = image::open(path).map_err(|e| ImagingError::Image {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);

        let Some(file_name) = path.file_name() else {
            continue;
        };
        let out = target_dir.join(file_name);
        resized.save(&out).map_err(|e| ImagingError::Image {
            path: out.display().to_string(),
            reason: e.to_string(),
        })?;
    }

    info!(
        "Resized {} images into {}",
        files.len(),
        target_dir.display()
    );
    Ok(files.len())
}

/// Resizes the images of every scene under `base_dir` according to `config`.
/// Scenes that fail are logged and skipped.
pub fn resize_scenes(
    base_dir: impl AsRef<Path>,
    config: &ResizeConfig,
) -> Result<usize, ImagingError> {
    let mut total = 0;
    for dir in scene_dirs(base_dir)? {
        match resize_images(
            dir.join(&config.source_dir),
            dir.join(&config.target_dir),
            config.width,
            config.height,
        ) {
            Ok(count) => total += count,
            Err(e) => error!("Skipping {}: {e}", dir.display()),
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 128]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_resize_images() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("dslr_images");
        let target = dir.path().join("dslr_images_resized");
        fs::create_dir_all(&source).unwrap();
        write_image(&source.join("DSC_0001.JPG"), 32, 24);
        write_image(&source.join("DSC_0002.jpg"), 24, 32);
        write_image(&source.join("mask.png"), 32, 24);

        let count = resize_images(&source, &target, 16, 12).unwrap();
        assert_eq!(count, 2);

        for name in ["DSC_0001.JPG", "DSC_0002.jpg"] {
            let resized = image::open(target.join(name)).unwrap();
            assert_eq!((resized.width(), resized.height()), (16, 12));
        }
        assert!(!target.join("mask.png").exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resize_images(dir.path().join("nope"), dir.path().join("out"), 4, 4),
            Err(ImagingError::MissingSource(_))
        ));
    }

    #[test]
    fn test_resize_scenes_needs_a_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resize_scenes(dir.path().join("missing"), &ResizeConfig::default()),
            Err(ImagingError::Scenes(SequenceError::IOError(_)))
        ));
    }

    #[test]
    fn test_resize_scenes_skips_scene_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let config = ResizeConfig {
            width: 8,
            height: 6,
            ..ResizeConfig::default()
        };
        let source = dir.path().join("courtyard").join(&config.source_dir);
        fs::create_dir_all(&source).unwrap();
        write_image(&source.join("DSC_0001.JPG"), 16, 12);
        fs::create_dir_all(dir.path().join("empty_scene")).unwrap();

        assert_eq!(resize_scenes(dir.path(), &config).unwrap(), 1);
        assert!(dir
            .path()
            .join("courtyard")
            .join(&config.target_dir)
            .join("DSC_0001.JPG")
            .is_file());
    }
}
