//! External tool invocation.
//!
//! Both external collaborators (the FFmpeg renderer and the Tesseract
//! recognizer) run as child processes through [`run_tool`]. A run is
//! all-or-nothing: a spawn error or a non-zero exit becomes
//! [`VobsrtError::ExternalTool`] carrying the tail of the tool's stderr.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::VobsrtError;
use crate::progress::CancellationToken;

/// How many trailing stderr lines are kept in error diagnostics.
const DIAGNOSTIC_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Everything the tool wrote to stdout.
    pub stdout: Vec<u8>,
    /// Everything the tool wrote to stderr, lossily decoded.
    pub stderr: String,
}

/// Run `command` to completion and capture both output streams.
///
/// `tool` names the program in error messages. When `cancellation` fires
/// while the child is running, the child is killed and
/// [`VobsrtError::Cancelled`] is returned.
///
/// # Errors
///
/// - [`VobsrtError::ExternalTool`] if the program cannot be started or exits
///   with a non-zero status.
/// - [`VobsrtError::Cancelled`] if cancellation was requested.
pub fn run_tool(
    mut command: Command,
    tool: &str,
    cancellation: Option<&CancellationToken>,
) -> Result<ToolOutput, VobsrtError> {
    configure_command(&mut command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    log::debug!("Running {tool}: {command:?}");

    let mut child = command.spawn().map_err(|error| VobsrtError::ExternalTool {
        tool: tool.to_string(),
        reason: format!("could not be started: {error}"),
        diagnostics: String::new(),
    })?;

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = wait_for(&mut child, cancellation);

    let stdout = join_reader(stdout_reader);
    let stderr = String::from_utf8_lossy(&join_reader(stderr_reader)).into_owned();

    let status = status.map_err(|error| match error {
        WaitError::Cancelled => VobsrtError::Cancelled,
        WaitError::Io(error) => VobsrtError::ExternalTool {
            tool: tool.to_string(),
            reason: format!("could not be awaited: {error}"),
            diagnostics: tail_lines(&stderr, DIAGNOSTIC_LINES),
        },
    })?;

    if !status.success() {
        return Err(VobsrtError::ExternalTool {
            tool: tool.to_string(),
            reason: describe_status(status),
            diagnostics: tail_lines(&stderr, DIAGNOSTIC_LINES),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

/// Keep the last `count` non-empty lines of `text`.
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let skip = lines.len().saturating_sub(count);
    lines[skip..].join("\n")
}

enum WaitError {
    Cancelled,
    Io(std::io::Error),
}

fn wait_for(
    child: &mut Child,
    cancellation: Option<&CancellationToken>,
) -> Result<ExitStatus, WaitError> {
    let Some(token) = cancellation else {
        return child.wait().map_err(WaitError::Io);
    };

    loop {
        if let Some(status) = child.try_wait().map_err(WaitError::Io)? {
            return Ok(status);
        }
        if token.is_cancelled() {
            // The child may exit between the check and the kill.
            let _ = child.kill();
            let _ = child.wait();
            return Err(WaitError::Cancelled);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stream.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn join_reader(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by a signal".to_string(),
    }
}

/// Apply platform-specific flags so console tools do not pop up windows.
fn configure_command(command: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(target_os = "windows"))]
    let _ = command;
}
