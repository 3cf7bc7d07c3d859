//! Input location and validation.
//!
//! A conversion takes the path of a VobSub index (`.idx`); the binary
//! payload must sit next to it with the same stem and the `.sub`
//! extension. [`InputPair::locate`] resolves and checks both files, and
//! [`validate_index`] inspects the parsed index for anything worth telling
//! the user before the external tools run.
//!
//! # Example
//!
//! ```no_run
//! use vobsrt::{IndexFile, InputPair, validate_index};
//!
//! let inputs = InputPair::locate("movie.idx")?;
//! let index = IndexFile::read(&inputs.index)?;
//! let report = validate_index(&index, &inputs);
//! for warning in &report.warnings {
//!     println!("Warning: {warning}");
//! }
//! # Ok::<(), vobsrt::VobsrtError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VobsrtError;
use crate::metadata::IndexFile;

/// Extension of the binary payload that accompanies an index file.
pub const PAYLOAD_EXTENSION: &str = "sub";

/// The two files that make up one VobSub subtitle track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPair {
    /// The textual index (`.idx`).
    pub index: PathBuf,
    /// The binary payload (`.sub`).
    pub payload: PathBuf,
}

impl InputPair {
    /// Derive the payload path from an index path without touching the
    /// filesystem.
    pub fn from_index<P: AsRef<Path>>(index: P) -> Self {
        let index = index.as_ref().to_path_buf();
        let payload = index.with_extension(PAYLOAD_EXTENSION);
        Self { index, payload }
    }

    /// Derive the payload path and check that both files exist and are
    /// regular files.
    ///
    /// # Errors
    ///
    /// Returns [`VobsrtError::InputAccess`] naming the first missing or
    /// unusable file.
    pub fn locate<P: AsRef<Path>>(index: P) -> Result<Self, VobsrtError> {
        let pair = Self::from_index(index);
        if pair.payload == pair.index {
            return Err(VobsrtError::InputAccess {
                path: pair.index,
                reason: format!(
                    "the index file must not use the .{PAYLOAD_EXTENSION} extension"
                ),
            });
        }
        check_file(&pair.index)?;
        check_file(&pair.payload)?;
        Ok(pair)
    }
}

fn check_file(path: &Path) -> Result<(), VobsrtError> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(()),
        Ok(_) => Err(VobsrtError::InputAccess {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        }),
        Err(error) => Err(VobsrtError::InputAccess {
            path: path.to_path_buf(),
            reason: error.to_string(),
        }),
    }
}

/// Summary of input validation.
///
/// Contains lists of informational notices, warnings, and errors.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect output quality.
    pub warnings: Vec<String>,
    /// Fatal issues that will prevent conversion.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result. Only errors make the report
    /// invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Locate the payload next to `index_path`, parse the index, and inspect
/// both.
///
/// Returns the located pair, the parsed index, and the report. Callers
/// decide what to do with report errors.
///
/// # Errors
///
/// Returns [`VobsrtError::InputAccess`] if either file is missing or the
/// index cannot be read.
pub fn validate_inputs<P: AsRef<Path>>(
    index_path: P,
) -> Result<(InputPair, IndexFile, ValidationReport), VobsrtError> {
    let inputs = InputPair::locate(index_path)?;
    let index = IndexFile::read(&inputs.index)?;
    let report = validate_index(&index, &inputs);
    Ok((inputs, index, report))
}

/// Inspect a parsed index and its payload.
pub fn validate_index(index: &IndexFile, inputs: &InputPair) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Payload ────────────────────────────────────────────────────
    match fs::metadata(&inputs.payload) {
        Ok(metadata) if metadata.len() == 0 => {
            report.errors.push(format!(
                "Subtitle payload {} is empty",
                inputs.payload.display()
            ));
        }
        Ok(metadata) => {
            report
                .info
                .push(format!("Payload: {} bytes", metadata.len()));
        }
        Err(error) => {
            report.errors.push(format!(
                "Cannot read subtitle payload {}: {error}",
                inputs.payload.display()
            ));
        }
    }

    // ── Canvas ─────────────────────────────────────────────────────
    if index.size_declared {
        report
            .info
            .push(format!("Frame size: {}", index.metadata));
    } else {
        report.warnings.push(format!(
            "No size declaration in index, rendering on a {} canvas",
            index.metadata
        ));
    }

    // ── Pass-through fields ────────────────────────────────────────
    if let Some(track) = &index.track {
        let language = if track.language.is_empty() {
            "unknown language"
        } else {
            track.language.as_str()
        };
        report
            .info
            .push(format!("Track {} ({language})", track.index));
    }

    if !index.palette.is_empty() && index.palette.len() != 16 {
        report.warnings.push(format!(
            "Palette declares {} colours (expected 16)",
            index.palette.len()
        ));
    }

    if index.entries.is_empty() {
        report.warnings.push(
            "Index lists no timestamp entries, the track may be empty".to_string(),
        );
    } else {
        report
            .info
            .push(format!("Index lists {} subtitles", index.entries.len()));
    }

    report
}
