//! # vobsrt
//!
//! Convert VobSub bitmap subtitles (`.idx` + `.sub`) to SubRip (`.srt`)
//! text.
//!
//! VobSub tracks store each subtitle as a small palette bitmap. `vobsrt`
//! never decodes those bitmaps itself: it asks FFmpeg when each subtitle
//! appears and disappears, has FFmpeg render every subtitle onto a blank
//! canvas, recognizes the text with Tesseract, cleans it up, and writes a
//! numbered, timed SubRip file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vobsrt::{ConvertOptions, Converter};
//!
//! let summary = Converter::new(ConvertOptions::new()).convert("movie.idx", "movie.srt")?;
//! println!("{summary}");
//! # Ok::<(), vobsrt::VobsrtError>(())
//! ```
//!
//! ### Custom backends
//!
//! Rendering and recognition sit behind the [`Renderer`] and
//! [`Recognizer`] traits:
//!
//! ```no_run
//! use vobsrt::{ConvertOptions, Converter, FfmpegRenderer, TesseractRecognizer};
//!
//! let converter = Converter::with_backends(
//!     ConvertOptions::new(),
//!     Box::new(FfmpegRenderer::new().with_program("/opt/ffmpeg/bin/ffmpeg")),
//!     Box::new(TesseractRecognizer::new().with_language("deu")),
//! );
//! converter.convert("film.idx", "film.srt")?;
//! # Ok::<(), vobsrt::VobsrtError>(())
//! ```
//!
//! ## Features
//!
//! - **Timing from the renderer**: start and end times come from FFmpeg's
//!   `showinfo` probe rather than the index timestamps
//! - **Slot-keyed joins**: timeline entries, frames, and recognition
//!   results share a [`SlotId`], so dropped text never shifts timings
//! - **Text cleanup**: common OCR misreads repaired, noise stripped, lines
//!   re-flowed to at most two lines
//! - **Progress & cancellation**: a [`ProgressCallback`] sees each
//!   [`Stage`] keep or drop every slot, and a [`CancellationToken`] also
//!   kills a running external tool
//! - **Validation**: inspect the index and payload before running tools
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Recognize frames on a bounded worker pool (enabled by default) |
//!
//! ## Requirements
//!
//! The `ffmpeg` and `tesseract` executables must be installed, either on
//! `PATH` or configured through [`ConvertOptions`].

pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod frames;
pub mod metadata;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod progress;
pub mod recognition;
pub mod subtitle;
pub mod text;
pub mod timeline;
pub mod validation;

pub use config::ConvertOptions;
pub use error::{EmptyStage, VobsrtError};
pub use ffmpeg::{FfmpegLogLevel, FfmpegRenderer, Renderer};
pub use frames::RasterFrame;
pub use metadata::{IndexFile, Metadata};
pub use pipeline::{Conversion, ConversionSummary, Converter, RunContext, WorkDir};
pub use probe::ProbeSignal;
pub use progress::{CancellationToken, ProgressCallback, ProgressEvent, ProgressInfo, Stage};
pub use recognition::{
    RecognitionLevel, RecognitionOptions, RecognitionResult, Recognizer, TesseractRecognizer,
};
pub use subtitle::SrtEntry;
pub use timeline::{SlotId, TimelineEntry};
pub use validation::{InputPair, ValidationReport, validate_index, validate_inputs};
