//! Error taxonomy for the session pipeline.
//!
//! Source-file and record errors are recovered locally (the file or row is
//! skipped and counted); configuration and output errors abort a run.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::schema::CanonicalField;

/// A single input file could not be used.
#[derive(Debug, Error)]
pub enum SourceFileError {
    #[error("failed to open {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is empty")]
    Empty { path: PathBuf },
    #[error("{path} has no column resolving to `{field}`")]
    MissingColumn { path: PathBuf, field: CanonicalField },
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SourceFileError {
    /// Path of the file that failed.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::Unreadable { path, .. }
            | Self::Empty { path }
            | Self::MissingColumn { path, .. }
            | Self::Csv { path, .. } => path,
        }
    }
}

/// Fatal configuration problems detected before or instead of synthesis.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u64,
        value: u64,
    },
    #[error("{field} must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be finite (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be within 0..=23 (got {value})")]
    HourRange { field: &'static str, value: f64 },
    #[error("weekend hour model requires low <= mode <= high (got {low}, {mode}, {high})")]
    TriangularOrder { low: f64, mode: f64, high: f64 },
    #[error("duration bounds {min}..={max} invalid (need 1 <= min <= max and a representable max)")]
    DurationBounds { min: i64, max: i64 },
    #[error("simulation window of {days} days from {start} overflows the calendar")]
    DateWindow { start: String, days: u32 },
    #[error("data directory {path} is not readable: {message}")]
    DataDir { path: PathBuf, message: String },
    #[error("no usable input files in {path} ({scanned} scanned, {skipped} skipped)")]
    NoUsableInput {
        path: PathBuf,
        scanned: usize,
        skipped: usize,
    },
    #[error("no named games left to weight after normalization")]
    EmptyPopularity,
}

/// Why a synthesized or re-read session row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingField,
    BadTimestamp,
    Unparseable,
    NonPositiveDuration,
    DurationOutOfBounds,
    Decode,
}

/// A single session row failed a structural check.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("row {row}: missing value for `{column}`")]
    MissingField { row: usize, column: &'static str },
    #[error("row {row}: `{column}` is not a timestamp: {value:?}")]
    BadTimestamp {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: `{column}` could not be parsed: {value:?}")]
    Unparseable {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: session duration {minutes} is not positive")]
    NonPositiveDuration { row: usize, minutes: i64 },
    #[error("row {row}: session duration {minutes} outside {min}..={max}")]
    DurationOutOfBounds {
        row: usize,
        minutes: i64,
        min: i64,
        max: i64,
    },
    #[error("row {row}: {message}")]
    Decode { row: usize, message: String },
}

impl RecordError {
    #[must_use]
    pub const fn reason(&self) -> DropReason {
        match self {
            Self::MissingField { .. } => DropReason::MissingField,
            Self::BadTimestamp { .. } => DropReason::BadTimestamp,
            Self::Unparseable { .. } => DropReason::Unparseable,
            Self::NonPositiveDuration { .. } => DropReason::NonPositiveDuration,
            Self::DurationOutOfBounds { .. } => DropReason::DurationOutOfBounds,
            Self::Decode { .. } => DropReason::Decode,
        }
    }
}

/// The destination could not be written.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to flush {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceFileError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("cleaning left no sessions ({dropped} dropped); nothing written")]
    EmptyDataset { dropped: usize },
}
