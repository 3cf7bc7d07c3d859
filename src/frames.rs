//! Frame materialization.
//!
//! Renders one image per subtitle occurrence through a [`Renderer`] and
//! recovers render order from the file names. The renderer writes
//! zero-padded, sequentially numbered PNGs, so sorting the directory
//! listing by name yields frames in the same order as the timeline.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EmptyStage, VobsrtError};
use crate::ffmpeg::Renderer;
use crate::metadata::Metadata;
use crate::progress::CancellationToken;
use crate::timeline::SlotId;
use crate::validation::InputPair;

/// One rendered subtitle image.
///
/// The file lives in the run's working directory and is deleted with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFrame {
    /// Slot of the subtitle shown in this frame.
    pub slot: SlotId,
    /// Path to the PNG file.
    pub path: PathBuf,
}

/// Render all subtitle frames into `frames_dir` and list them in order.
///
/// `frames_dir` is created if needed.
///
/// # Errors
///
/// - Any error from the renderer (typically [`VobsrtError::ExternalTool`]).
/// - [`VobsrtError::EmptyResult`] with [`EmptyStage::NoFrames`] if the
///   renderer succeeded but wrote no images.
/// - [`VobsrtError::Io`] if the directory cannot be created or listed.
pub fn render_frames(
    renderer: &dyn Renderer,
    inputs: &InputPair,
    metadata: Metadata,
    frames_dir: &Path,
    cancellation: Option<&CancellationToken>,
) -> Result<Vec<RasterFrame>, VobsrtError> {
    fs::create_dir_all(frames_dir)?;
    log::debug!(
        "Rendering {} frames into {}",
        metadata,
        frames_dir.display()
    );

    renderer.render_frames(inputs, metadata, frames_dir, cancellation)?;

    let frames = collect_frames(frames_dir)?;
    if frames.is_empty() {
        return Err(VobsrtError::EmptyResult(EmptyStage::NoFrames));
    }
    log::info!("Rendered {} subtitle frames", frames.len());
    Ok(frames)
}

/// List the PNG files in `dir`, sorted by file name, as slots `0..n`.
///
/// Subdirectories and files with other extensions are ignored.
pub fn collect_frames(dir: &Path) -> Result<Vec<RasterFrame>, VobsrtError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("png"));
        if is_png {
            paths.push(path);
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(position, path)| RasterFrame {
            slot: SlotId(position),
            path,
        })
        .collect())
}
