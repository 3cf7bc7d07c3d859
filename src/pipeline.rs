//! The conversion pipeline.
//!
//! [`Converter`] runs the stages strictly in order:
//!
//! 1. Locate and validate the index/payload pair, parse the canvas size.
//! 2. Run the timing probe and build the [`TimelineEntry`] list.
//! 3. Render one frame per subtitle into a scoped working directory.
//! 4. Recognize text in all frames with one batch call.
//! 5. Normalize each result and join with the timeline by [`SlotId`].
//! 6. Write the SubRip document in a single write.
//!
//! Each stage is a free function of explicit inputs; the values that later
//! stages need are collected into an immutable [`RunContext`]. The working
//! directory is a [`WorkDir`] owned by one run and removed when it goes out
//! of scope, whichever way the run ends.
//!
//! # Example
//!
//! ```no_run
//! use vobsrt::{ConvertOptions, Converter, RecognitionLevel};
//!
//! let options = ConvertOptions::new()
//!     .with_recognition_level(RecognitionLevel::Accurate)
//!     .with_overwrite(true);
//! let summary = Converter::new(options).convert("movie.idx", "movie.srt")?;
//! println!("{summary}");
//! # Ok::<(), vobsrt::VobsrtError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::config::ConvertOptions;
use crate::error::{EmptyStage, VobsrtError};
use crate::ffmpeg::{FfmpegRenderer, Renderer};
use crate::frames::{RasterFrame, render_frames};
use crate::metadata::{IndexFile, Metadata};
use crate::probe::parse_probe_log;
use crate::progress::{CancellationToken, Stage, StageReporter};
use crate::recognition::{RecognitionResult, Recognizer, TesseractRecognizer};
use crate::subtitle::{SrtEntry, assemble, save_srt};
use crate::text::normalize;
use crate::timeline::{SlotId, TimelineEntry, build_timeline};
use crate::validation::{InputPair, validate_inputs};

const WORK_DIR_PREFIX: &str = "vobsrt-";
const FRAMES_DIR: &str = "frames";

/// Scoped working directory for one run.
///
/// Removed on drop unless it was created with `keep` set, in which case
/// its location is logged and it is left in place.
#[derive(Debug)]
pub struct WorkDir {
    dir: Option<TempDir>,
    keep: bool,
}

impl WorkDir {
    /// Create a fresh directory under `parent`, or under the system
    /// temporary directory when `parent` is `None`.
    pub fn create(parent: Option<&Path>, keep: bool) -> Result<Self, VobsrtError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORK_DIR_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        log::debug!("Working directory: {}", dir.path().display());
        Ok(Self {
            dir: Some(dir),
            keep,
        })
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Where rendered frames go.
    pub fn frames_dir(&self) -> PathBuf {
        self.path().join(FRAMES_DIR)
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if self.keep {
            let path = dir.keep();
            log::info!("Kept working directory {}", path.display());
        } else {
            let path = dir.path().to_path_buf();
            if let Err(error) = dir.close() {
                log::warn!(
                    "Could not remove working directory {}: {error}",
                    path.display()
                );
            }
        }
    }
}

/// Everything the later stages of a run need, fixed once produced.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// The located input files.
    pub inputs: InputPair,
    /// The parsed index.
    pub index: IndexFile,
    /// Canvas size used for rendering.
    pub metadata: Metadata,
    /// Subtitle timing, one entry per slot.
    pub timeline: Vec<TimelineEntry>,
    /// Rendered frames, one per slot.
    pub frames: Vec<RasterFrame>,
}

/// Counts describing a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Entries built from the timing probe.
    pub timeline_entries: usize,
    /// Frames rendered.
    pub frames: usize,
    /// Subtitle records written.
    pub written: usize,
    /// Slots dropped because no usable text was recognized.
    pub dropped: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl Display for ConversionSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} subtitles written, {} empty slots dropped ({} frames) in {:.2}s",
            self.written,
            self.dropped,
            self.frames,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The result of [`Converter::run`]: entries ready to be written.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Renumbered subtitle records.
    pub entries: Vec<SrtEntry>,
    /// Run statistics.
    pub summary: ConversionSummary,
}

/// Converts VobSub subtitle tracks to SubRip.
pub struct Converter {
    options: ConvertOptions,
    renderer: Box<dyn Renderer>,
    recognizer: Box<dyn Recognizer>,
}

impl Converter {
    /// Create a converter using FFmpeg and Tesseract as configured in
    /// `options`.
    pub fn new(options: ConvertOptions) -> Self {
        let renderer = FfmpegRenderer::new()
            .with_program(options.ffmpeg_program.clone())
            .with_log_level(options.ffmpeg_log_level);
        let recognizer = TesseractRecognizer::new()
            .with_program(options.tesseract_program.clone())
            .with_language(options.language.clone());
        Self::with_backends(options, Box::new(renderer), Box::new(recognizer))
    }

    /// Create a converter with custom rendering and recognition backends.
    pub fn with_backends(
        options: ConvertOptions,
        renderer: Box<dyn Renderer>,
        recognizer: Box<dyn Recognizer>,
    ) -> Self {
        Self {
            options,
            renderer,
            recognizer,
        }
    }

    /// The options this converter runs with.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `index_path` (and its companion payload) to a SubRip file at
    /// `output_path`.
    ///
    /// Nothing is written unless the whole run succeeds.
    ///
    /// # Errors
    ///
    /// - [`VobsrtError::OutputExists`] if `output_path` exists and
    ///   overwriting is not enabled.
    /// - [`VobsrtError::InputAccess`] if the input files are missing or
    ///   unusable.
    /// - Any error from [`Converter::run`].
    /// - [`VobsrtError::Io`] if the output cannot be written.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        index_path: P,
        output_path: Q,
    ) -> Result<ConversionSummary, VobsrtError> {
        let output_path = output_path.as_ref();
        if !self.options.overwrite && output_path.exists() {
            return Err(VobsrtError::OutputExists(output_path.to_path_buf()));
        }

        let (inputs, index, report) = validate_inputs(index_path)?;
        for line in &report.info {
            log::debug!("{line}");
        }
        for warning in &report.warnings {
            log::warn!("{warning}");
        }
        if !report.is_valid() {
            return Err(VobsrtError::InputAccess {
                path: inputs.payload,
                reason: report.errors.join("; "),
            });
        }

        let conversion = self.run(&inputs, index)?;
        save_srt(output_path, &conversion.entries)?;

        log::info!(
            "Wrote {} subtitles to {}",
            conversion.summary.written,
            output_path.display()
        );
        Ok(conversion.summary)
    }

    /// Run every stage up to, but not including, writing the output.
    ///
    /// # Errors
    ///
    /// - [`VobsrtError::ExternalTool`] if the renderer fails.
    /// - [`VobsrtError::Recognition`] if the recognizer fails or breaks its
    ///   one-result-per-frame contract.
    /// - [`VobsrtError::EmptyResult`] if a stage produced nothing.
    /// - [`VobsrtError::Cancelled`] if cancellation was requested.
    pub fn run(&self, inputs: &InputPair, index: IndexFile) -> Result<Conversion, VobsrtError> {
        let started = Instant::now();
        let cancellation = self.options.cancellation();
        self.check_cancelled()?;

        let work_dir = WorkDir::create(
            self.options.work_dir_parent.as_deref(),
            self.options.keep_work_dir,
        )?;

        let timeline = probe_timeline(self.renderer.as_ref(), inputs, cancellation, &self.options)?;
        self.check_cancelled()?;

        let metadata = index.metadata;
        let frames = {
            let mut reporter = self.reporter(Stage::FrameRendering, Some(timeline.len()));
            let frames = render_frames(
                self.renderer.as_ref(),
                inputs,
                metadata,
                &work_dir.frames_dir(),
                cancellation,
            )?;
            for frame in &frames {
                reporter.slot_done(frame.slot);
            }
            reporter.finish();
            frames
        };
        // Both sides number their slots by position, so a count mismatch
        // means the tail of the longer list has no partner.
        if frames.len() != timeline.len() {
            log::warn!(
                "Rendered {} frames for {} timeline entries; unmatched slots are dropped",
                frames.len(),
                timeline.len()
            );
        }

        let context = RunContext {
            inputs: inputs.clone(),
            index,
            metadata,
            timeline,
            frames,
        };
        self.check_cancelled()?;

        let results = recognize_frames(self.recognizer.as_ref(), &context.frames, &self.options)?;
        self.check_cancelled()?;

        let texts = normalize_results(&results, &self.options);
        let entries = assemble_entries(&context.timeline, &texts, &self.options);
        if entries.is_empty() {
            return Err(VobsrtError::EmptyResult(EmptyStage::NoSurvivingEntries));
        }

        let summary = ConversionSummary {
            timeline_entries: context.timeline.len(),
            frames: context.frames.len(),
            written: entries.len(),
            dropped: context.timeline.len().saturating_sub(entries.len()),
            elapsed: started.elapsed(),
        };
        drop(work_dir);

        Ok(Conversion { entries, summary })
    }

    fn reporter(&self, stage: Stage, slots: Option<usize>) -> StageReporter {
        StageReporter::start(
            self.options.progress.clone(),
            stage,
            slots,
            self.options.progress_interval,
        )
    }

    fn check_cancelled(&self) -> Result<(), VobsrtError> {
        self.options
            .cancellation()
            .map_or(Ok(()), CancellationToken::check)
    }
}

/// Run the timing probe and build the timeline from its log.
///
/// # Errors
///
/// Renderer errors are passed through. An empty timeline is
/// [`VobsrtError::EmptyResult`] with [`EmptyStage::NoTimelineEntries`].
pub fn probe_timeline(
    renderer: &dyn Renderer,
    inputs: &InputPair,
    cancellation: Option<&CancellationToken>,
    options: &ConvertOptions,
) -> Result<Vec<TimelineEntry>, VobsrtError> {
    let mut reporter = StageReporter::start(
        options.progress.clone(),
        Stage::TimingProbe,
        None,
        options.progress_interval,
    );
    let log = renderer.probe(inputs, cancellation)?;
    let signals = parse_probe_log(&log);
    let timeline = build_timeline(&signals);
    for entry in &timeline {
        reporter.slot_done(entry.slot);
    }
    reporter.finish();
    log::info!(
        "Timing probe: {} signals, {} subtitle events",
        signals.len(),
        timeline.len()
    );
    if timeline.is_empty() {
        return Err(VobsrtError::EmptyResult(EmptyStage::NoTimelineEntries));
    }
    Ok(timeline)
}

/// Recognize all frames and check the recognizer's contract.
///
/// # Errors
///
/// Recognizer errors are passed through. A result count that differs from
/// the frame count, or a result whose slot differs from its frame's, is a
/// [`VobsrtError::Recognition`] error.
pub fn recognize_frames(
    recognizer: &dyn Recognizer,
    frames: &[RasterFrame],
    options: &ConvertOptions,
) -> Result<Vec<RecognitionResult>, VobsrtError> {
    log::debug!(
        "Recognizing {} frames with {}",
        frames.len(),
        serde_json::to_string(options.recognition()).unwrap_or_default()
    );
    let results = recognizer.recognize(frames, options)?;

    if results.len() != frames.len() {
        return Err(VobsrtError::Recognition(format!(
            "recognizer returned {} results for {} frames",
            results.len(),
            frames.len()
        )));
    }
    if let Some((frame, result)) = frames
        .iter()
        .zip(&results)
        .find(|(frame, result)| frame.slot != result.slot)
    {
        return Err(VobsrtError::Recognition(format!(
            "recognizer returned slot {} for frame {}",
            result.slot, frame.slot
        )));
    }
    Ok(results)
}

/// Clean and wrap each result, keeping only slots with usable text.
pub fn normalize_results(
    results: &[RecognitionResult],
    options: &ConvertOptions,
) -> BTreeMap<SlotId, String> {
    let mut reporter = StageReporter::start(
        options.progress.clone(),
        Stage::Normalization,
        Some(results.len()),
        options.progress_interval,
    );

    let mut texts = BTreeMap::new();
    for result in results {
        match normalize(&result.text, options.max_line_length()) {
            Some(text) => {
                texts.insert(result.slot, text);
                reporter.slot_done(result.slot);
            }
            None => {
                log::debug!("Slot {} has no usable text", result.slot);
                reporter.slot_dropped(result.slot);
            }
        }
    }
    reporter.finish();
    texts
}

/// Join normalized text to the timeline, reporting which slots become
/// subtitle records.
pub fn assemble_entries(
    timeline: &[TimelineEntry],
    texts: &BTreeMap<SlotId, String>,
    options: &ConvertOptions,
) -> Vec<SrtEntry> {
    let mut reporter = StageReporter::start(
        options.progress.clone(),
        Stage::Assembly,
        Some(timeline.len()),
        options.progress_interval,
    );

    let entries = assemble(timeline, texts);
    let mut kept = entries.iter().map(|entry| entry.slot).peekable();
    for entry in timeline {
        if kept.next_if_eq(&entry.slot).is_some() {
            reporter.slot_done(entry.slot);
        } else {
            reporter.slot_dropped(entry.slot);
        }
    }
    reporter.finish();
    entries
}
