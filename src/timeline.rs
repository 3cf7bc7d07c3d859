//! Subtitle timeline construction.
//!
//! The timeline is derived from the renderer's own frame probe rather than
//! the timestamps stored in the index file. Each non-blank probe frame opens
//! a new entry; the next blank frame closes the most recently opened one.
//!
//! # Example
//!
//! ```
//! use vobsrt::probe::parse_probe_log;
//! use vobsrt::timeline::build_timeline;
//!
//! let signals = parse_probe_log(
//!     "pts_time:1.0 checksum:1234ABCD\n\
//!      pts_time:4.0 checksum:00000000\n\
//!      pts_time:5.0 checksum:CAFEF00D\n",
//! );
//! let timeline = build_timeline(&signals);
//! assert_eq!(timeline.len(), 2);
//! assert_eq!((timeline[0].start_ms, timeline[0].end_ms), (1000, 4000));
//! assert_eq!((timeline[1].start_ms, timeline[1].end_ms), (5000, 8000));
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::probe::ProbeSignal;

/// Duration given to an entry until its closing blank frame is seen.
pub const DEFAULT_DURATION_MS: u64 = 3000;

/// Position of one subtitle occurrence in render order.
///
/// Timeline entries, rendered frames, and recognition results all carry the
/// slot they belong to, so the final join never depends on list positions
/// lining up by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub usize);

impl Display for SlotId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

/// One subtitle's on-screen interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry {
    /// Slot this entry occupies.
    pub slot: SlotId,
    /// Start time in milliseconds.
    pub start_ms: u64,
    /// End time in milliseconds. Always greater than `start_ms`.
    pub end_ms: u64,
    /// Whether a blank frame closed this entry. Unclosed entries keep the
    /// default duration.
    pub closed: bool,
}

impl TimelineEntry {
    /// On-screen duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

/// Build the timeline from probe signals.
///
/// Consecutive non-blank signals without a blank between them each open
/// their own entry; nothing is merged. A blank signal before the first
/// entry, or one that is not later than the open entry's start, is ignored.
pub fn build_timeline(signals: &[ProbeSignal]) -> Vec<TimelineEntry> {
    let mut timeline: Vec<TimelineEntry> = Vec::new();

    for signal in signals {
        if !signal.is_blank() {
            timeline.push(TimelineEntry {
                slot: SlotId(timeline.len()),
                start_ms: signal.pts_ms,
                end_ms: signal.pts_ms.saturating_add(DEFAULT_DURATION_MS),
                closed: false,
            });
            continue;
        }

        let Some(last) = timeline.last_mut() else {
            continue;
        };
        if signal.pts_ms > last.start_ms {
            last.end_ms = signal.pts_ms;
            last.closed = true;
        } else {
            log::debug!(
                "Ignoring blank frame at {} ms for entry {} starting at {} ms",
                signal.pts_ms,
                last.slot,
                last.start_ms
            );
        }
    }

    log::debug!(
        "Built timeline with {} entries ({} closed)",
        timeline.len(),
        timeline.iter().filter(|entry| entry.closed).count()
    );
    timeline
}
