//! Progress and cancellation tests.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use vobsrt::{
    CancellationToken, ConvertOptions, Converter, InputPair, Metadata, ProgressCallback,
    ProgressEvent, ProgressInfo, RasterFrame, RecognitionOptions, RecognitionResult, Recognizer,
    Renderer, SlotId, Stage, VobsrtError,
};

// ── CancellationToken ──────────────────────────────────────────────

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn options_report_cancellation() {
    let token = CancellationToken::new();
    let options = ConvertOptions::new().with_cancellation(token.clone());
    assert!(!options.is_cancelled());
    token.cancel();
    assert!(options.is_cancelled());
    assert!(!ConvertOptions::new().is_cancelled());
}

#[test]
fn cancellation_token_check() {
    let token = CancellationToken::default();
    assert!(token.check().is_ok());
    token.cancel();
    assert!(matches!(token.check(), Err(VobsrtError::Cancelled)));
}

// ── ProgressInfo ───────────────────────────────────────────────────

fn info(handled: usize, slots: Option<usize>) -> ProgressInfo {
    ProgressInfo {
        stage: Stage::Recognition,
        event: ProgressEvent::Finished,
        handled,
        dropped: 0,
        slots,
    }
}

#[test]
fn fraction_follows_handled_slots() {
    assert_eq!(info(1, Some(4)).fraction(), Some(0.25));
    assert_eq!(info(4, Some(4)).fraction(), Some(1.0));
    assert_eq!(info(0, Some(0)).fraction(), Some(1.0));
    assert_eq!(info(3, None).fraction(), None);
}

#[test]
fn stage_labels() {
    assert_eq!(Stage::TimingProbe.label(), "probing timing");
    assert_eq!(Stage::Assembly.label(), "assembling subtitles");
}

// ── Progress callbacks ─────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.events.lock().unwrap().push(info.clone());
    }
}

struct TwoFrames;

impl Renderer for TwoFrames {
    fn probe(
        &self,
        _inputs: &InputPair,
        _cancellation: Option<&CancellationToken>,
    ) -> Result<String, VobsrtError> {
        Ok("pts_time:1 checksum:11111111\n\
            pts_time:2 checksum:00000000\n\
            pts_time:3 checksum:22222222\n"
            .to_string())
    }

    fn render_frames(
        &self,
        _inputs: &InputPair,
        _metadata: Metadata,
        output_dir: &Path,
        _cancellation: Option<&CancellationToken>,
    ) -> Result<(), VobsrtError> {
        for number in 1..=2 {
            image::GrayImage::new(4, 4)
                .save(output_dir.join(format!("frame_{number:06}.png")))
                .map_err(VobsrtError::from)?;
        }
        Ok(())
    }
}

/// Greets every slot except the ones listed as silent.
struct Greeter {
    silent: Vec<SlotId>,
}

impl Greeter {
    fn everyone() -> Self {
        Self { silent: Vec::new() }
    }
}

impl Recognizer for Greeter {
    fn recognize_image(
        &self,
        frame: &RasterFrame,
        _options: &RecognitionOptions,
    ) -> Result<RecognitionResult, VobsrtError> {
        let text = if self.silent.contains(&frame.slot) {
            String::new()
        } else {
            format!("Hello number {}", frame.slot.0)
        };
        Ok(RecognitionResult {
            slot: frame.slot,
            text,
            confidence: 0.8,
        })
    }
}

fn convert_with(greeter: Greeter, interval: u64) -> Vec<ProgressInfo> {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let index = dir.path().join("movie.idx");
    fs::write(&index, "size: 720x480\n").expect("Failed to write index");
    fs::write(dir.path().join("movie.sub"), b"\x00\x01").expect("Failed to write payload");

    let recorder = Arc::new(Recorder::default());
    let options = ConvertOptions::new()
        .with_progress(recorder.clone())
        .with_progress_interval(interval)
        .with_work_dir_parent(dir.path());
    let converter = Converter::with_backends(options, Box::new(TwoFrames), Box::new(greeter));

    converter
        .convert(&index, dir.path().join("movie.srt"))
        .expect("Conversion should succeed");

    recorder.events.lock().unwrap().clone()
}

fn events_for(events: &[ProgressInfo], stage: Stage) -> Vec<ProgressEvent> {
    events
        .iter()
        .filter(|info| info.stage == stage)
        .map(|info| info.event)
        .collect()
}

#[test]
fn every_stage_starts_and_finishes() {
    let events = convert_with(Greeter::everyone(), 1);
    for stage in [
        Stage::TimingProbe,
        Stage::FrameRendering,
        Stage::Recognition,
        Stage::Normalization,
        Stage::Assembly,
    ] {
        let stage_events = events_for(&events, stage);
        assert_eq!(
            stage_events.first(),
            Some(&ProgressEvent::Started),
            "{stage:?} did not start"
        );
        assert_eq!(
            stage_events.last(),
            Some(&ProgressEvent::Finished),
            "{stage:?} did not finish"
        );
    }
}

#[test]
fn stages_run_in_order() {
    let events = convert_with(Greeter::everyone(), 1);
    let started: Vec<Stage> = events
        .iter()
        .filter(|info| info.event == ProgressEvent::Started)
        .map(|info| info.stage)
        .collect();
    assert_eq!(
        started,
        vec![
            Stage::TimingProbe,
            Stage::FrameRendering,
            Stage::Recognition,
            Stage::Normalization,
            Stage::Assembly,
        ]
    );
}

#[test]
fn timing_probe_reports_discovered_slots() {
    let events = convert_with(Greeter::everyone(), 1);
    assert_eq!(
        events_for(&events, Stage::TimingProbe),
        vec![
            ProgressEvent::Started,
            ProgressEvent::SlotDone(SlotId(0)),
            ProgressEvent::SlotDone(SlotId(1)),
            ProgressEvent::Finished,
        ]
    );

    let started = events
        .iter()
        .find(|info| info.stage == Stage::TimingProbe)
        .expect("probe start");
    assert_eq!(started.slots, None);

    let finished = events
        .iter()
        .filter(|info| info.stage == Stage::TimingProbe)
        .last()
        .expect("probe finish");
    assert_eq!(finished.slots, Some(2));
    assert_eq!(finished.fraction(), Some(1.0));
}

#[test]
fn recognition_reports_every_slot() {
    let events = convert_with(Greeter::everyone(), 1);
    assert_eq!(
        events_for(&events, Stage::Recognition),
        vec![
            ProgressEvent::Started,
            ProgressEvent::SlotDone(SlotId(0)),
            ProgressEvent::SlotDone(SlotId(1)),
            ProgressEvent::Finished,
        ]
    );

    let finished = events
        .iter()
        .filter(|info| info.stage == Stage::Recognition)
        .last()
        .expect("recognition finish");
    assert_eq!(finished.handled, 2);
    assert_eq!(finished.slots, Some(2));
    assert_eq!(finished.dropped, 0);
}

#[test]
fn empty_text_is_reported_as_dropped() {
    let greeter = Greeter {
        silent: vec![SlotId(1)],
    };
    let events = convert_with(greeter, 1);

    for stage in [Stage::Normalization, Stage::Assembly] {
        assert_eq!(
            events_for(&events, stage),
            vec![
                ProgressEvent::Started,
                ProgressEvent::SlotDone(SlotId(0)),
                ProgressEvent::SlotDropped(SlotId(1)),
                ProgressEvent::Finished,
            ],
            "{stage:?}"
        );
        let finished = events
            .iter()
            .filter(|info| info.stage == stage)
            .last()
            .expect("stage finish");
        assert_eq!((finished.handled, finished.dropped), (2, 1));
    }
}

#[test]
fn progress_interval_limits_slot_events() {
    let events = convert_with(Greeter::everyone(), 10);
    // Two slots never reach the interval; only the stage boundaries fire.
    assert_eq!(
        events_for(&events, Stage::Normalization),
        vec![ProgressEvent::Started, ProgressEvent::Finished]
    );

    let events = convert_with(Greeter::everyone(), 2);
    assert_eq!(
        events_for(&events, Stage::Recognition),
        vec![
            ProgressEvent::Started,
            ProgressEvent::SlotDone(SlotId(1)),
            ProgressEvent::Finished,
        ]
    );
}
