//! Input discovery and output layout.
//!
//! A run reads videos from one flat input directory and writes into two
//! trees:
//!
//! ```text
//! output/<basename>@<stride + 1>.<ext>          one mean image per job
//! keyframes/<basename>/<frame index:06>.<ext>   sampled frames, when enabled
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::error::MeanFrameError;

/// List the regular files directly inside `dir` whose names end with one of
/// `extensions` (plain suffix match, e.g. `".mp4"`). Sorted by file name.
///
/// # Errors
///
/// [`MeanFrameError::InvalidDirectory`] if `dir` cannot be read.
pub fn scan_videos<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
) -> Result<Vec<PathBuf>, MeanFrameError> {
    let invalid = |error: io::Error| MeanFrameError::InvalidDirectory {
        path: dir.to_path_buf(),
        reason: error.to_string(),
    };

    let mut videos = Vec::new();
    for entry in fs::read_dir(dir).map_err(invalid)? {
        let entry = entry.map_err(invalid)?;
        if !entry.file_type().map_err(invalid)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            log::warn!("Skipping non UTF-8 file name in {}", dir.display());
            continue;
        };
        if extensions.iter().any(|ext| name.ends_with(ext.as_ref())) {
            videos.push(entry.path());
        }
    }
    videos.sort();
    Ok(videos)
}

/// Remove `dir` with everything in it. A missing `dir` is not an error.
pub fn remove_directory(dir: &Path) -> Result<(), MeanFrameError> {
    if dir.exists() {
        log::debug!("Clearing {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}

/// Remove `dir` with everything in it, then create it empty.
pub fn reset_directory(dir: &Path) -> Result<(), MeanFrameError> {
    remove_directory(dir)?;
    fs::create_dir_all(dir)?;
    Ok(())
}

/// File name of `video` without its last extension.
pub fn video_basename(video: &Path) -> String {
    video
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<output_dir>/<basename>@<stride + 1>.<extension>`.
pub fn mean_image_path(output_dir: &Path, video: &Path, stride: u64, extension: &str) -> PathBuf {
    let period = u128::from(stride) + 1;
    output_dir.join(format!("{}@{period}.{extension}", video_basename(video)))
}

/// `<keyframes_dir>/<basename>`.
pub fn keyframe_directory(keyframes_dir: &Path, video: &Path) -> PathBuf {
    keyframes_dir.join(video_basename(video))
}

/// `<dir>/<frame_index:06>.<extension>`.
pub fn keyframe_path(dir: &Path, frame_index: u64, extension: &str) -> PathBuf {
    dir.join(format!("{frame_index:06}.{extension}"))
}

/// Check that `extension` names an image format the `image` crate can write.
pub fn check_image_extension(extension: &str) -> Result<ImageFormat, MeanFrameError> {
    ImageFormat::from_extension(extension)
        .filter(|format| format.writing_enabled())
        .ok_or_else(|| MeanFrameError::UnsupportedImageExtension(extension.to_string()))
}
