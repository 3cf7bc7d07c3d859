//! Timing probe log grammar.
//!
//! The timing probe runs FFmpeg's `showinfo` filter over the rendered
//! subtitle track and scrapes its diagnostic output. Exactly one line format
//! is recognised:
//!
//! ```text
//! [Parsed_showinfo_0 @ 0x...] n:   0 pts:  90000 pts_time:1.0 ... checksum:5A1F0C3B ...
//!                                                 ^^^^^^^^^^^^         ^^^^^^^^^^^^^^^^^
//!                                                 capture 1            capture 2
//! ```
//!
//! Capture 1 is the presentation time in decimal seconds (optional
//! fraction); capture 2 is an 8-digit hexadecimal content checksum. Every
//! other line in the log is ignored.
//!
//! A frame whose checksum is [`BLANK_CHECKSUM`] carries no subtitle pixels.

use std::sync::LazyLock;

use regex::Regex;

/// Checksum reported for a frame with no subtitle pixels.
pub const BLANK_CHECKSUM: &str = "00000000";

static PROBE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"pts_time:\s*(\d+(?:\.\d+)?)\b.*?\bchecksum:\s*([0-9A-Fa-f]{8})\b")
        .expect("probe line pattern is valid")
});

/// One frame reported by the timing probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSignal {
    /// Presentation time, rounded to whole milliseconds.
    pub pts_ms: u64,
    /// Content checksum as eight upper-case hex digits.
    pub checksum: [u8; 8],
}

impl ProbeSignal {
    /// Returns `true` when the frame is empty, i.e. the previous subtitle
    /// has ended.
    pub fn is_blank(&self) -> bool {
        &self.checksum == BLANK_CHECKSUM.as_bytes()
    }

    /// The checksum as a string slice.
    pub fn checksum_str(&self) -> &str {
        // Only ASCII hex digits are ever stored.
        std::str::from_utf8(&self.checksum).unwrap_or(BLANK_CHECKSUM)
    }
}

/// Parse a single probe line.
///
/// Returns `None` for lines that do not match the grammar or whose time does
/// not fit in a `u64` of milliseconds.
///
/// # Example
///
/// ```
/// use vobsrt::probe::parse_probe_line;
///
/// let signal = parse_probe_line(
///     "[Parsed_showinfo_0 @ 0x1] n:0 pts:1000 pts_time:1.25 checksum:deadbeef",
/// )
/// .unwrap();
/// assert_eq!(signal.pts_ms, 1250);
/// assert_eq!(signal.checksum_str(), "DEADBEEF");
/// assert!(!signal.is_blank());
/// ```
pub fn parse_probe_line(line: &str) -> Option<ProbeSignal> {
    let captures = PROBE_LINE.captures(line)?;
    let seconds = captures[1].parse::<f64>().ok()?;
    // Times past the millisecond range cannot be placed on the timeline.
    if !seconds.is_finite() || seconds * 1000.0 >= u64::MAX as f64 {
        return None;
    }

    let mut checksum = [0u8; 8];
    for (slot, byte) in checksum.iter_mut().zip(captures[2].bytes()) {
        *slot = byte.to_ascii_uppercase();
    }

    Some(ProbeSignal {
        pts_ms: seconds_to_millis(seconds),
        checksum,
    })
}

/// Parse a complete probe log, keeping matching lines in order.
pub fn parse_probe_log(log: &str) -> Vec<ProbeSignal> {
    log.lines().filter_map(parse_probe_line).collect()
}

/// Convert fractional seconds to milliseconds, rounding half away from zero.
pub fn seconds_to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}
