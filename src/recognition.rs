//! Text recognition.
//!
//! A [`Recognizer`] turns rendered subtitle frames into raw candidate text.
//! The converter treats recognition as one all-or-nothing batch call: it
//! either returns exactly one [`RecognitionResult`] per frame, in frame
//! order and with matching slots, or it fails. Empty or low-confidence text
//! for a single frame is a valid result, filtered later by
//! [`normalize`](crate::text::normalize).
//!
//! The provided [`Recognizer::recognize`] splits the frames into
//! sub-batches of [`RecognitionOptions::batch_size`] images and, with the
//! `rayon` feature, runs each sub-batch on a pool of
//! [`RecognitionOptions::max_threads`] workers. Implementations only need
//! [`Recognizer::recognize_image`].
//!
//! [`TesseractRecognizer`] runs the `tesseract` command-line tool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::config::ConvertOptions;
use crate::error::VobsrtError;
use crate::frames::RasterFrame;
use crate::process::run_tool;
use crate::progress::{Stage, StageReporter};
use crate::timeline::SlotId;

/// Default number of recognition workers.
pub const DEFAULT_MAX_THREADS: usize = 4;
/// Default number of images per recognition sub-batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default minimum word confidence.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.3;

/// Speed/accuracy trade-off for recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionLevel {
    /// Recognize the rendered frame as-is.
    #[default]
    Fast,
    /// Pre-process each frame (grayscale, invert, upscale) before
    /// recognition.
    Accurate,
}

impl RecognitionLevel {
    /// Parse `fast` or `accurate` (case-insensitive).
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fast" => Some(RecognitionLevel::Fast),
            "accurate" => Some(RecognitionLevel::Accurate),
            _ => None,
        }
    }
}

/// Recognizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionOptions {
    /// Speed/accuracy trade-off.
    #[serde(rename = "recognitionLevel")]
    pub level: RecognitionLevel,
    /// Words recognized with lower confidence (0.0–1.0) are discarded.
    pub min_confidence: f32,
    /// Upper bound on concurrently recognized images.
    pub max_threads: usize,
    /// Images per sub-batch. Cancellation and progress are checked between
    /// sub-batches.
    pub batch_size: usize,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            level: RecognitionLevel::default(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_threads: DEFAULT_MAX_THREADS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl RecognitionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recognition level.
    #[must_use]
    pub fn with_level(mut self, level: RecognitionLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the minimum word confidence. Clamped to 0.0–1.0.
    #[must_use]
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    /// Set the worker count. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads.max(1);
        self
    }

    /// Set the sub-batch size. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

/// Text recognized in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    /// Slot of the frame this text came from.
    pub slot: SlotId,
    /// Candidate text, possibly empty.
    pub text: String,
    /// Confidence between 0.0 and 1.0.
    pub confidence: f32,
}

/// A text recognition backend.
pub trait Recognizer: Send + Sync {
    /// Recognize the text in a single frame.
    ///
    /// The returned result must carry `frame.slot`.
    fn recognize_image(
        &self,
        frame: &RasterFrame,
        options: &RecognitionOptions,
    ) -> Result<RecognitionResult, VobsrtError>;

    /// Recognize every frame, returning results in frame order.
    ///
    /// Backends with a native batch API can override this; the contract
    /// (one result per frame, same order, all-or-nothing) is checked by the
    /// converter either way.
    fn recognize(
        &self,
        frames: &[RasterFrame],
        config: &ConvertOptions,
    ) -> Result<Vec<RecognitionResult>, VobsrtError> {
        recognize_in_batches(self, frames, config)
    }
}

/// Run `recognizer` over `frames` in sub-batches, preserving order.
///
/// # Errors
///
/// - [`VobsrtError::Cancelled`] if cancellation is requested between
///   sub-batches.
/// - [`VobsrtError::Recognition`] if any single image fails; no partial
///   results are returned.
pub fn recognize_in_batches<R: Recognizer + ?Sized>(
    recognizer: &R,
    frames: &[RasterFrame],
    config: &ConvertOptions,
) -> Result<Vec<RecognitionResult>, VobsrtError> {
    let options = &config.recognition;
    let mut reporter = StageReporter::start(
        config.progress.clone(),
        Stage::Recognition,
        Some(frames.len()),
        config.progress_interval,
    );

    #[cfg(feature = "rayon")]
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.max_threads.max(1))
        .thread_name(|index| format!("vobsrt-ocr-{index}"))
        .build()
        .map_err(|error| {
            VobsrtError::Recognition(format!("could not start recognition workers: {error}"))
        })?;

    let mut results = Vec::with_capacity(frames.len());
    for batch in frames.chunks(options.batch_size.max(1)) {
        if config.is_cancelled() {
            return Err(VobsrtError::Cancelled);
        }

        #[cfg(feature = "rayon")]
        let batch_results: Result<Vec<RecognitionResult>, VobsrtError> = {
            use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
            pool.install(|| {
                batch
                    .par_iter()
                    .map(|frame| recognize_one(recognizer, frame, options))
                    .collect()
            })
        };

        #[cfg(not(feature = "rayon"))]
        let batch_results: Result<Vec<RecognitionResult>, VobsrtError> = batch
            .iter()
            .map(|frame| recognize_one(recognizer, frame, options))
            .collect();

        for result in batch_results? {
            reporter.slot_done(result.slot);
            results.push(result);
        }
    }

    reporter.finish();
    Ok(results)
}

fn recognize_one<R: Recognizer + ?Sized>(
    recognizer: &R,
    frame: &RasterFrame,
    options: &RecognitionOptions,
) -> Result<RecognitionResult, VobsrtError> {
    recognizer
        .recognize_image(frame, options)
        .map_err(|error| match error {
            VobsrtError::Cancelled | VobsrtError::Recognition(_) => error,
            other => VobsrtError::Recognition(format!(
                "frame {} ({}): {other}",
                frame.slot,
                frame.path.display()
            )),
        })
}

/// [`Recognizer`] backed by the `tesseract` executable.
///
/// Each frame is recognized with `tesseract <image> stdout --psm 6 -l
/// <language> tsv`. Word confidences come from the TSV output.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    language: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractRecognizer {
    /// Use `tesseract` from `PATH` with English training data.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            language: "eng".to_string(),
        }
    }

    /// Use a specific `tesseract` binary.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Set the tesseract language code (for example `eng`, `deu+eng`).
    #[must_use]
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.language = language.into();
        self
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize_image(
        &self,
        frame: &RasterFrame,
        options: &RecognitionOptions,
    ) -> Result<RecognitionResult, VobsrtError> {
        let image_path = match options.level {
            RecognitionLevel::Fast => frame.path.clone(),
            RecognitionLevel::Accurate => prepare_for_recognition(&frame.path)?,
        };

        let mut command = Command::new(&self.program);
        command
            .arg(&image_path)
            .arg("stdout")
            .args(["--psm", "6", "-l", self.language.as_str(), "tsv"]);
        let output = run_tool(command, &self.program.display().to_string(), None)?;

        let (text, confidence) =
            parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout), options.min_confidence);
        log::debug!(
            "Frame {} recognized with confidence {confidence:.2}: {text:?}",
            frame.slot
        );

        Ok(RecognitionResult {
            slot: frame.slot,
            text,
            confidence,
        })
    }
}

/// Write a grayscale, inverted, 2× upscaled copy of `path` next to it.
///
/// Rendered frames are light text on a black canvas; tesseract reads dark
/// text on a light background best.
pub fn prepare_for_recognition(path: &Path) -> Result<PathBuf, VobsrtError> {
    let mut gray = image::open(path)?.to_luma8();
    image::imageops::invert(&mut gray);
    let upscaled = image::imageops::resize(
        &gray,
        gray.width().saturating_mul(2).max(1),
        gray.height().saturating_mul(2).max(1),
        FilterType::Lanczos3,
    );

    let prepared = path.with_extension("accurate.png");
    upscaled.save(&prepared)?;
    Ok(prepared)
}

/// Extract text and mean confidence from tesseract TSV output.
///
/// Only word rows (level 5) are used. Words below `min_confidence`
/// (0.0–1.0) are dropped; the remaining words are joined with spaces
/// within a line and with `\n` between lines. The confidence is the mean
/// of the kept words, or 0.0 when none are kept.
pub fn parse_tesseract_tsv(tsv: &str, min_confidence: f32) -> (String, f32) {
    let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<&str>> = BTreeMap::new();
    let mut confidence_sum = 0.0f32;
    let mut word_count = 0usize;

    for row in tsv.lines() {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != "5" {
            continue;
        }
        let Ok(confidence) = columns[10].trim().parse::<f32>() else {
            continue;
        };
        let word = columns[11].trim();
        if confidence < 0.0 || word.is_empty() {
            continue;
        }
        let confidence = (confidence / 100.0).clamp(0.0, 1.0);
        if confidence < min_confidence {
            continue;
        }

        let number = |i: usize| columns[i].trim().parse::<u32>().unwrap_or(0);
        lines
            .entry((number(1), number(2), number(3), number(4)))
            .or_default()
            .push(word);
        confidence_sum += confidence;
        word_count += 1;
    }

    let text = lines
        .values()
        .map(|words| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n");
    let confidence = if word_count == 0 {
        0.0
    } else {
        confidence_sum / word_count as f32
    };
    (text, confidence)
}
