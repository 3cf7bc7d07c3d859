//! Stage progress events and cooperative cancellation.
//!
//! A conversion moves every subtitle slot through a fixed sequence of
//! [`Stage`]s. Each stage reports [`ProgressEvent::Started`], then one event
//! per slot it keeps or drops, then [`ProgressEvent::Finished`]. Slot events
//! are thinned by
//! [`ConvertOptions::with_progress_interval`](crate::ConvertOptions::with_progress_interval);
//! start and finish always arrive.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vobsrt::{
//!     ConvertOptions, Converter, ProgressCallback, ProgressEvent, ProgressInfo, VobsrtError,
//! };
//!
//! struct PrintDrops;
//!
//! impl ProgressCallback for PrintDrops {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let ProgressEvent::SlotDropped(slot) = info.event {
//!             println!("{:?} dropped slot {slot}", info.stage);
//!         }
//!     }
//! }
//!
//! let options = ConvertOptions::new().with_progress(Arc::new(PrintDrops));
//! Converter::new(options).convert("movie.idx", "movie.srt")?;
//! # Ok::<(), VobsrtError>(())
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::VobsrtError;
use crate::timeline::SlotId;

/// A conversion stage, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Discovering subtitle slots from the renderer's timing probe.
    TimingProbe,
    /// Rendering one image per slot.
    FrameRendering,
    /// Recognizing text in rendered images.
    Recognition,
    /// Cleaning and wrapping recognized text.
    Normalization,
    /// Joining text to the timeline.
    Assembly,
}

impl Stage {
    /// Short lower-case description for status lines.
    pub fn label(self) -> &'static str {
        match self {
            Stage::TimingProbe => "probing timing",
            Stage::FrameRendering => "rendering frames",
            Stage::Recognition => "recognizing text",
            Stage::Normalization => "cleaning text",
            Stage::Assembly => "assembling subtitles",
        }
    }
}

/// What happened in a [`ProgressInfo`] report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The stage began.
    Started,
    /// The slot passed through the stage.
    SlotDone(SlotId),
    /// The slot produced nothing usable here and leaves the run.
    SlotDropped(SlotId),
    /// The stage ended. `slots` is known from here on.
    Finished,
}

/// One progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub stage: Stage,
    pub event: ProgressEvent,
    /// Slots this stage has handled so far, kept or dropped.
    pub handled: usize,
    /// Slots this stage has dropped so far.
    pub dropped: usize,
    /// Slots this stage will handle, when known.
    pub slots: Option<usize>,
}

impl ProgressInfo {
    /// Fraction of the stage's slots handled, in `0.0..=1.0`.
    ///
    /// `None` while the slot count is unknown. A stage with no slots is
    /// complete.
    pub fn fraction(&self) -> Option<f32> {
        match self.slots? {
            0 => Some(1.0),
            slots => Some((self.handled as f32 / slots as f32).min(1.0)),
        }
    }
}

/// Receives progress reports.
///
/// Reports arrive on the thread driving the conversion. Callbacks observe
/// only; use [`CancellationToken`] to stop a run.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Shared flag for stopping a conversion early.
///
/// Clones observe the same flag. A run checks it between stages, between
/// recognition sub-batches, and while waiting on an external tool, which is
/// then killed.
///
/// ```
/// use vobsrt::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// [`VobsrtError::Cancelled`] once [`cancel`](CancellationToken::cancel)
    /// has been called.
    pub fn check(&self) -> Result<(), VobsrtError> {
        if self.is_cancelled() {
            Err(VobsrtError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Reports one stage's slot events to the configured callback.
///
/// Creating a reporter emits `Started`; [`finish`](StageReporter::finish)
/// emits `Finished`. In between, a slot event is delivered once every
/// `interval` slots.
pub(crate) struct StageReporter {
    callback: Arc<dyn ProgressCallback>,
    stage: Stage,
    slots: Option<usize>,
    handled: usize,
    dropped: usize,
    interval: usize,
    unreported: usize,
}

impl StageReporter {
    pub(crate) fn start(
        callback: Arc<dyn ProgressCallback>,
        stage: Stage,
        slots: Option<usize>,
        interval: u64,
    ) -> Self {
        let reporter = Self {
            callback,
            stage,
            slots,
            handled: 0,
            dropped: 0,
            interval: usize::try_from(interval).unwrap_or(usize::MAX).max(1),
            unreported: 0,
        };
        reporter.emit(ProgressEvent::Started);
        reporter
    }

    pub(crate) fn slot_done(&mut self, slot: SlotId) {
        self.record(ProgressEvent::SlotDone(slot));
    }

    pub(crate) fn slot_dropped(&mut self, slot: SlotId) {
        self.dropped += 1;
        self.record(ProgressEvent::SlotDropped(slot));
    }

    /// Emit `Finished`. A stage that did not know its slot count up front
    /// reports the number it handled.
    pub(crate) fn finish(mut self) {
        self.slots = Some(self.slots.unwrap_or(self.handled));
        self.emit(ProgressEvent::Finished);
    }

    fn record(&mut self, event: ProgressEvent) {
        self.handled += 1;
        self.unreported += 1;
        if self.unreported >= self.interval {
            self.unreported = 0;
            self.emit(event);
        }
    }

    fn emit(&self, event: ProgressEvent) {
        self.callback.on_progress(&ProgressInfo {
            stage: self.stage,
            event,
            handled: self.handled,
            dropped: self.dropped,
            slots: self.slots,
        });
    }
}
