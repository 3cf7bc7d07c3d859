//! SubRip assembly.
//!
//! This module merges the timeline with normalized text into [`SrtEntry`]
//! values and serializes them. Entries are joined to text by [`SlotId`];
//! slots without text are dropped and the survivors renumbered from 1.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use vobsrt::subtitle::{assemble, to_srt};
//! use vobsrt::timeline::{SlotId, TimelineEntry};
//!
//! let timeline = [
//!     TimelineEntry { slot: SlotId(0), start_ms: 1000, end_ms: 4000, closed: true },
//!     TimelineEntry { slot: SlotId(1), start_ms: 5000, end_ms: 8000, closed: false },
//! ];
//! let texts = BTreeMap::from([(SlotId(0), "Hello world".to_string())]);
//!
//! let entries = assemble(&timeline, &texts);
//! assert_eq!(to_srt(&entries), "1\n00:00:01,000 --> 00:00:04,000\nHello world\n\n");
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VobsrtError;
use crate::timeline::{SlotId, TimelineEntry};

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2,}):([0-5]\d):([0-5]\d),(\d{3})$").expect("timestamp pattern is valid")
});

/// A single subtitle record ready for output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtEntry {
    /// One-based sequence number, contiguous over the written entries.
    pub index: usize,
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds.
    pub end_ms: u64,
    /// One or two lines of text, separated by `\n`. Never empty.
    pub text: String,
    /// The slot this entry came from.
    pub slot: SlotId,
}

/// Merge timeline entries with the text recognized for each slot.
///
/// Entries are produced in timeline order. Slots with no text, or with
/// text that is blank, are dropped, and indices are assigned 1..N over
/// what remains.
pub fn assemble(timeline: &[TimelineEntry], texts: &BTreeMap<SlotId, String>) -> Vec<SrtEntry> {
    let mut entries = Vec::with_capacity(texts.len().min(timeline.len()));

    for entry in timeline {
        let Some(text) = texts.get(&entry.slot) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        entries.push(SrtEntry {
            index: entries.len() + 1,
            start_ms: entry.start_ms,
            end_ms: entry.end_ms,
            text: text.clone(),
            slot: entry.slot,
        });
    }

    entries
}

/// Serialize entries as a SubRip document.
///
/// Each record is its index, the timing line, the text, and a blank line.
pub fn to_srt(entries: &[SrtEntry]) -> String {
    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            entry.index,
            format_srt_timestamp(entry.start_ms),
            format_srt_timestamp(entry.end_ms),
            entry.text,
        ));
    }
    output
}

/// Write entries to `path` in a single write.
///
/// # Errors
///
/// Returns [`VobsrtError::Io`] if the file cannot be written.
pub fn save_srt<P: AsRef<Path>>(path: P, entries: &[SrtEntry]) -> Result<(), VobsrtError> {
    std::fs::write(path, to_srt(entries))?;
    Ok(())
}

/// Format milliseconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// Hours are zero-padded to two digits and grow as needed past 99.
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse an SRT timestamp (`HH:MM:SS,mmm`) back into milliseconds.
///
/// Inverse of [`format_srt_timestamp`]. Minutes and seconds must be below
/// 60 and milliseconds exactly three digits; otherwise returns `None`.
pub fn parse_srt_timestamp(timestamp: &str) -> Option<u64> {
    let captures = TIMESTAMP.captures(timestamp.trim())?;
    let hours: u64 = captures[1].parse().ok()?;
    let minutes: u64 = captures[2].parse().ok()?;
    let seconds: u64 = captures[3].parse().ok()?;
    let millis: u64 = captures[4].parse().ok()?;

    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes * 60_000 + seconds * 1000 + millis)
}
