//! Error types for the `vobsrt` crate.
//!
//! This module defines [`VobsrtError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry enough context (file paths,
//! tool names, captured diagnostics) to explain a failed conversion without
//! additional logging at the call site.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The pipeline stage that produced nothing to work with.
///
/// Carried by [`VobsrtError::EmptyResult`]. An empty stage is a terminal
/// condition rather than a crash: the input was readable and every tool ran,
/// but there is no subtitle text to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStage {
    /// The timing probe reported no subtitle start signals.
    NoTimelineEntries,
    /// The frame renderer wrote no images.
    NoFrames,
    /// Every slot was discarded during text normalization.
    NoSurvivingEntries,
}

impl Display for EmptyStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            EmptyStage::NoTimelineEntries => {
                write!(f, "the timing probe found no subtitle events")
            }
            EmptyStage::NoFrames => write!(f, "the renderer produced no subtitle frames"),
            EmptyStage::NoSurvivingEntries => {
                write!(f, "no subtitle contained recognizable text")
            }
        }
    }
}

/// The unified error type for all `vobsrt` operations.
///
/// Every public method that can fail returns `Result<T, VobsrtError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VobsrtError {
    /// The index file or its companion payload could not be read.
    #[error("Cannot access input file {path}: {reason}")]
    InputAccess {
        /// The file that was being accessed.
        path: PathBuf,
        /// Why access failed.
        reason: String,
    },

    /// An external tool could not be spawned or exited unsuccessfully.
    #[error("{tool} failed: {reason}{}", format_diagnostics(.diagnostics))]
    ExternalTool {
        /// Program name or path of the tool.
        tool: String,
        /// Spawn error or exit status description.
        reason: String,
        /// Trailing lines of the tool's diagnostic output.
        diagnostics: String,
    },

    /// The recognizer failed as a whole.
    ///
    /// Empty or low-confidence text for a single image is not an error.
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// A stage produced no output, so there is nothing to convert.
    #[error("Nothing to convert: {0}")]
    EmptyResult(EmptyStage),

    /// The output file exists and overwriting was not allowed.
    #[error("Output file already exists: {0}")]
    OutputExists(PathBuf),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate while preparing a frame for recognition.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl VobsrtError {
    /// Returns `true` for errors that mean "no subtitles" rather than a
    /// broken run.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, VobsrtError::EmptyResult(_))
    }
}

fn format_diagnostics(diagnostics: &str) -> String {
    if diagnostics.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", diagnostics.trim_end())
    }
}
