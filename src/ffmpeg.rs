//! The external renderer.
//!
//! Subtitle bitmaps are never decoded in-process. Instead the `ffmpeg`
//! command-line tool renders the VobSub track twice:
//!
//! 1. **Timing probe**: the subtitle track goes through the `showinfo`
//!    filter and the per-frame log lines are returned for
//!    [`probe`](crate::probe) to parse.
//! 2. **Frame materialization**: the track is scaled onto a blank canvas
//!    and every output frame is written as a numbered PNG.
//!
//! Both invocations sit behind the [`Renderer`] trait so the pipeline can be
//! driven by scripted renderers in tests.
//!
//! # Example
//!
//! ```no_run
//! use vobsrt::{FfmpegLogLevel, FfmpegRenderer, InputPair, Renderer};
//!
//! let renderer = FfmpegRenderer::new().with_log_level(FfmpegLogLevel::Warning);
//! let inputs = InputPair::locate("movie.idx")?;
//! let log = renderer.probe(&inputs, None)?;
//! println!("{} probe lines", log.lines().count());
//! # Ok::<(), vobsrt::VobsrtError>(())
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::VobsrtError;
use crate::metadata::Metadata;
use crate::process::run_tool;
use crate::progress::CancellationToken;
use crate::validation::InputPair;

/// File name pattern for rendered frames. Zero padding keeps lexicographic
/// order equal to render order.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// FFmpeg log verbosity passed to `-loglevel`.
///
/// The timing probe always runs at [`FfmpegLogLevel::Info`] because
/// `showinfo` reports at that level; this setting controls frame rendering.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions the process cannot recover from.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is the default.
    #[default]
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value FFmpeg expects after `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// The rendering backend used by the converter.
///
/// Implementations must be all-or-nothing: either the call succeeds
/// completely or it returns an error. Partial output is never reported as
/// success.
pub trait Renderer: Send + Sync {
    /// Run the timing probe and return its diagnostic log.
    fn probe(
        &self,
        inputs: &InputPair,
        cancellation: Option<&CancellationToken>,
    ) -> Result<String, VobsrtError>;

    /// Render one PNG per subtitle frame into `output_dir`, which already
    /// exists and is empty. File names must sort in render order.
    fn render_frames(
        &self,
        inputs: &InputPair,
        metadata: Metadata,
        output_dir: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<(), VobsrtError>;
}

/// [`Renderer`] backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
    program: PathBuf,
    log_level: FfmpegLogLevel,
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRenderer {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            log_level: FfmpegLogLevel::default(),
        }
    }

    /// Use a specific `ffmpeg` binary.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(mut self, program: P) -> Self {
        self.program = program.into();
        self
    }

    /// Set the log level used while rendering frames.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Renderer for FfmpegRenderer {
    fn probe(
        &self,
        inputs: &InputPair,
        cancellation: Option<&CancellationToken>,
    ) -> Result<String, VobsrtError> {
        let mut command = Command::new(&self.program);
        command.args(probe_arguments(inputs));
        let output = run_tool(command, &self.tool_name(), cancellation)?;
        Ok(output.stderr)
    }

    fn render_frames(
        &self,
        inputs: &InputPair,
        metadata: Metadata,
        output_dir: &Path,
        cancellation: Option<&CancellationToken>,
    ) -> Result<(), VobsrtError> {
        let mut command = Command::new(&self.program);
        command.args(render_arguments(inputs, metadata, output_dir, self.log_level));
        run_tool(command, &self.tool_name(), cancellation)?;
        Ok(())
    }
}

/// Arguments for the timing probe.
///
/// The index and payload are separate inputs; the first subtitle track of
/// the index input is fed to `showinfo` and the video output is discarded.
pub fn probe_arguments(inputs: &InputPair) -> Vec<OsString> {
    let mut arguments: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "info"]
        .into_iter()
        .map(OsString::from)
        .collect();
    arguments.push("-i".into());
    arguments.push(inputs.index.clone().into_os_string());
    arguments.push("-i".into());
    arguments.push(inputs.payload.clone().into_os_string());
    arguments.extend(
        ["-filter_complex", "[0:s:0]showinfo", "-f", "null", "-"]
            .into_iter()
            .map(OsString::from),
    );
    arguments
}

/// Arguments for frame materialization.
///
/// Input 0 is a one-second blank canvas of the parsed size, input 1 the
/// index, input 2 the payload. The subtitle track is scaled to the canvas
/// and overlaid; variable frame rate output yields one image per change.
pub fn render_arguments(
    inputs: &InputPair,
    metadata: Metadata,
    output_dir: &Path,
    log_level: FfmpegLogLevel,
) -> Vec<OsString> {
    let Metadata { width, height } = metadata;
    let mut arguments: Vec<OsString> = vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-loglevel".into(),
        log_level.as_arg().into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!("color=c=black:s={width}x{height}:d=1").into(),
        "-i".into(),
        inputs.index.clone().into_os_string(),
        "-i".into(),
        inputs.payload.clone().into_os_string(),
        "-filter_complex".into(),
        format!("[1:s:0]scale={width}:{height}[sub];[0:v][sub]overlay").into(),
        "-fps_mode".into(),
        "vfr".into(),
    ];
    arguments.push(output_dir.join(FRAME_PATTERN).into_os_string());
    arguments
}
