//! Frame input loading
//!
//! Turns the `convert` command's input arguments into an ordered list of
//! [`RawFrame`]s:
//! - Files are taken as given, in argument order
//! - Directories contribute their image files, sorted by file name
//! - Timestamps are synthesized at the configured frame rate
//!
//! Only the compressed bytes are read here; decoding happens in the core
//! pipeline so undecodable files are skipped rather than fatal.

use std::path::{Path, PathBuf};

use gifrec_core::RawFrame;
use thiserror::Error;
use tracing::debug;

/// File extensions picked up from input directories
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tif", "tiff"];

/// Input collection errors
#[derive(Debug, Error)]
pub enum InputError {
    #[error("No input given")]
    NoInputs,

    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Directory {} contains no image files", .0.display())]
    EmptyDirectory(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether `path` has one of [`IMAGE_EXTENSIONS`] (case-insensitive)
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Expand files and directories into the ordered list of frame files
pub async fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, InputError> {
    if inputs.is_empty() {
        return Err(InputError::NoInputs);
    }

    let mut files = Vec::new();
    for input in inputs {
        let meta = tokio::fs::metadata(input)
            .await
            .map_err(|_| InputError::NotFound(input.clone()))?;

        if meta.is_dir() {
            let entries = list_images(input).await?;
            if entries.is_empty() {
                return Err(InputError::EmptyDirectory(input.clone()));
            }
            debug!(dir = %input.display(), count = entries.len(), "Expanded input directory");
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

async fn list_images(dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let read_err = |source| InputError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut images = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Timestamp of the frame at `index` when played back at `fps`
pub fn frame_timestamp_ms(index: usize, fps: u32) -> u64 {
    index as u64 * (1000 / fps.max(1)) as u64
}

/// Read every frame file into memory, in order
pub async fn load_frames(files: &[PathBuf], fps: u32) -> Result<Vec<RawFrame>, InputError> {
    let mut frames = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let bytes = tokio::fs::read(path).await.map_err(|source| InputError::Read {
            path: path.clone(),
            source,
        })?;
        frames.push(RawFrame::new(bytes, frame_timestamp_ms(index, fps)));
    }
    debug!(count = frames.len(), "Frames loaded");
    Ok(frames)
}
