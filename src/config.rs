//! Conversion configuration.
//!
//! [`ConvertOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, tool locations, and recognition settings through a
//! [`Converter`](crate::Converter) run without polluting every stage
//! signature.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vobsrt::{
//!     CancellationToken, ConvertOptions, ProgressCallback, ProgressInfo, RecognitionLevel,
//! };
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}: {} slots handled", info.stage.label(), info.handled);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = ConvertOptions::new()
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_recognition_level(RecognitionLevel::Accurate)
//!     .with_max_line_length(36);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use crate::ffmpeg::FfmpegLogLevel;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};
use crate::recognition::{RecognitionLevel, RecognitionOptions};
use crate::text::DEFAULT_MAX_LINE_LENGTH;

/// Configuration for a conversion run.
///
/// All fields have sensible defaults: a default-constructed value uses
/// `ffmpeg` and `tesseract` from `PATH`, English recognition in fast mode,
/// 42-character lines, and refuses to overwrite an existing output file.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N items).
    pub(crate) progress_interval: u64,
    /// Settings handed to the recognizer.
    pub(crate) recognition: RecognitionOptions,
    /// Path or name of the FFmpeg binary.
    pub(crate) ffmpeg_program: PathBuf,
    /// FFmpeg `-loglevel` used while rendering frames.
    pub(crate) ffmpeg_log_level: FfmpegLogLevel,
    /// Path or name of the Tesseract binary.
    pub(crate) tesseract_program: PathBuf,
    /// Tesseract language code.
    pub(crate) language: String,
    /// Maximum characters per subtitle line.
    pub(crate) max_line_length: usize,
    /// Keep the working directory after the run.
    pub(crate) keep_work_dir: bool,
    /// Replace an existing output file.
    pub(crate) overwrite: bool,
    /// Where to create the working directory. `None` uses the system
    /// temporary directory.
    pub(crate) work_dir_parent: Option<PathBuf>,
}

impl Debug for ConvertOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConvertOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("progress_interval", &self.progress_interval)
            .field("recognition", &self.recognition)
            .field("ffmpeg_program", &self.ffmpeg_program)
            .field("ffmpeg_log_level", &self.ffmpeg_log_level)
            .field("tesseract_program", &self.tesseract_program)
            .field("language", &self.language)
            .field("max_line_length", &self.max_line_length)
            .field("keep_work_dir", &self.keep_work_dir)
            .field("overwrite", &self.overwrite)
            .field("work_dir_parent", &self.work_dir_parent)
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            progress_interval: 1,
            recognition: RecognitionOptions::default(),
            ffmpeg_program: PathBuf::from("ffmpeg"),
            ffmpeg_log_level: FfmpegLogLevel::default(),
            tesseract_program: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            keep_work_dir: false,
            overwrite: false,
            work_dir_parent: None,
        }
    }

    /// Attach a progress callback.
    ///
    /// Each stage reports its start and finish, and every
    /// [`progress_interval`](ConvertOptions::with_progress_interval)-th
    /// slot it keeps or drops.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops at the next check, kills
    /// any running tool, and returns
    /// [`VobsrtError::Cancelled`](crate::VobsrtError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 reports every slot; 10 reports every 10th slot.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Replace the recognition settings wholesale.
    #[must_use]
    pub fn with_recognition(mut self, options: RecognitionOptions) -> Self {
        self.recognition = options;
        self
    }

    /// Set the recognition level.
    #[must_use]
    pub fn with_recognition_level(mut self, level: RecognitionLevel) -> Self {
        self.recognition = self.recognition.with_level(level);
        self
    }

    /// Use a specific FFmpeg binary.
    #[must_use]
    pub fn with_ffmpeg<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.ffmpeg_program = program.into();
        self
    }

    /// Set the FFmpeg log level used while rendering frames.
    #[must_use]
    pub fn with_ffmpeg_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.ffmpeg_log_level = level;
        self
    }

    /// Use a specific Tesseract binary.
    #[must_use]
    pub fn with_tesseract<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.tesseract_program = program.into();
        self
    }

    /// Set the Tesseract language code.
    #[must_use]
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }

    /// Set the maximum characters per subtitle line. Clamped to a minimum
    /// of 1.
    #[must_use]
    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length.max(1);
        self
    }

    /// Keep the working directory (rendered frames) after the run.
    #[must_use]
    pub fn with_keep_work_dir(mut self, keep: bool) -> Self {
        self.keep_work_dir = keep;
        self
    }

    /// Allow replacing an existing output file.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Create the working directory under `parent` instead of the system
    /// temporary directory.
    #[must_use]
    pub fn with_work_dir_parent<P: Into<PathBuf>>(mut self, parent: P) -> Self {
        self.work_dir_parent = Some(parent.into());
        self
    }

    /// The recognition settings.
    pub fn recognition(&self) -> &RecognitionOptions {
        &self.recognition
    }

    /// The maximum characters per subtitle line.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// The cancellation token, if one is attached.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
