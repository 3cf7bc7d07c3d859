//! Index file metadata.
//!
//! A VobSub index (`.idx`) is a line-oriented text file that describes the
//! companion binary payload (`.sub`). Conversion only needs the frame size
//! declared by `size: WxH`; everything else ([`IndexFile::palette`],
//! [`IndexFile::track`], [`IndexFile::entries`]) is parsed for callers that
//! want it and carried through unmodified.
//!
//! # Example
//!
//! ```
//! use vobsrt::IndexFile;
//!
//! let index = IndexFile::parse("size: 1920x1080\nid: en, index: 0\n");
//! assert_eq!(index.metadata.width, 1920);
//! assert_eq!(index.metadata.height, 1080);
//! assert_eq!(index.track.unwrap().language, "en");
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::VobsrtError;

/// Width used when the index file does not declare a size.
pub const DEFAULT_WIDTH: u32 = 720;
/// Height used when the index file does not declare a size.
pub const DEFAULT_HEIGHT: u32 = 480;

static SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*size\s*:\s*(\d+)\s*x\s*(\d+)").expect("size pattern is valid")
});

static TRACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*id\s*:\s*([A-Za-z-]*)\s*,\s*index\s*:\s*(\d+)")
        .expect("track pattern is valid")
});

static ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*timestamp\s*:\s*(\d+):(\d{2}):(\d{2}):(\d{3})\s*,\s*filepos\s*:\s*([0-9a-f]+)",
    )
    .expect("entry pattern is valid")
});

/// Canvas dimensions for rendered subtitle frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Metadata {
    /// Frame width in pixels. Always greater than zero.
    pub width: u32,
    /// Frame height in pixels. Always greater than zero.
    pub height: u32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Metadata {
    /// Extract the `size: WxH` declaration from index text.
    ///
    /// Returns the 720×480 fallback when the declaration is missing or
    /// declares a zero dimension. Rendering still proceeds on the default
    /// canvas in that case.
    pub fn parse(text: &str) -> Self {
        Self::parse_declared(text).unwrap_or_else(|| {
            log::debug!("No usable size declaration, using {}", Self::default());
            Self::default()
        })
    }

    /// Like [`parse`](Metadata::parse) but returns `None` instead of the
    /// fallback.
    pub fn parse_declared(text: &str) -> Option<Self> {
        let captures = SIZE.captures(text)?;
        let width = captures[1].parse::<u32>().ok()?;
        let height = captures[2].parse::<u32>().ok()?;
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

/// The labeled track an index file describes (`id: en, index: 0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackId {
    /// Language code as written in the index file. May be empty.
    pub language: String,
    /// Track index within the payload.
    pub index: u32,
}

/// A `timestamp: ..., filepos: ...` line from the index file.
///
/// These are the index's own, frame-quantized start times. Conversion
/// derives timing from the renderer instead; entries are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Start time in milliseconds.
    pub timestamp_ms: u64,
    /// Byte offset of the subtitle packet in the payload.
    pub filepos: u64,
}

/// A parsed index file.
#[derive(Debug, Clone, Default)]
pub struct IndexFile {
    /// Canvas size (fallback 720×480).
    pub metadata: Metadata,
    /// Whether `metadata` came from an explicit `size:` line.
    pub size_declared: bool,
    /// The 16-colour RGB palette, if declared.
    pub palette: Vec<[u8; 3]>,
    /// Track label, if declared.
    pub track: Option<TrackId>,
    /// Per-subtitle timestamp/filepos entries.
    pub entries: Vec<IndexEntry>,
}

impl IndexFile {
    /// Read and parse an index file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`VobsrtError::InputAccess`] if the file cannot be read.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, VobsrtError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|error| VobsrtError::InputAccess {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        // Index files are nominally ASCII; stray Latin-1 bytes in comments
        // must not abort the run.
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Parse index text. Never fails: unknown or malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let declared = Metadata::parse_declared(text);
        let mut index = IndexFile {
            metadata: declared.unwrap_or_default(),
            size_declared: declared.is_some(),
            ..Default::default()
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(value) = strip_key(line, "palette") {
                index.palette = parse_palette(value);
            } else if let Some(captures) = TRACK.captures(line) {
                if let Ok(track_index) = captures[2].parse() {
                    index.track = Some(TrackId {
                        language: captures[1].to_string(),
                        index: track_index,
                    });
                }
            } else if let Some(captures) = ENTRY.captures(line) {
                let timestamp_ms =
                    entry_millis(&captures[1], &captures[2], &captures[3], &captures[4]);
                let filepos = u64::from_str_radix(&captures[5], 16).ok();
                match (timestamp_ms, filepos) {
                    (Some(timestamp_ms), Some(filepos)) => index.entries.push(IndexEntry {
                        timestamp_ms,
                        filepos,
                    }),
                    _ => log::debug!("Skipping unrepresentable index entry: {line}"),
                }
            }
        }

        index
    }
}

/// `hours:minutes:seconds:millis` in milliseconds, or `None` on overflow.
fn entry_millis(hours: &str, minutes: &str, seconds: &str, millis: &str) -> Option<u64> {
    let minutes_total = hours
        .parse::<u64>()
        .ok()?
        .checked_mul(60)?
        .checked_add(minutes.parse().ok()?)?;
    let seconds_total = minutes_total
        .checked_mul(60)?
        .checked_add(seconds.parse().ok()?)?;
    seconds_total
        .checked_mul(1000)?
        .checked_add(millis.parse().ok()?)
}

fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = line.split_once(':')?;
    name.trim().eq_ignore_ascii_case(key).then_some(value)
}

fn parse_palette(value: &str) -> Vec<[u8; 3]> {
    value
        .split(',')
        .filter_map(|color| {
            let color = color.trim();
            if color.len() != 6 {
                return None;
            }
            let rgb = u32::from_str_radix(color, 16).ok()?;
            Some([(rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8])
        })
        .collect()
}
