//! Schema normalization for heterogeneous player-count CSV files.
//!
//! Every input file names its columns differently. Headers are cleaned
//! (trimmed, unquoted, lowercased, separator runs collapsed to `_`) and then
//! looked up in a fixed alias table. Only `name` and `peak_players` are
//! carried forward; the optional usage fields are recognised so that a file
//! carrying them is not mistaken for an unknown layout.

use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SourceFileError};

static SEPARATOR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-]+").expect("separator pattern is valid"));

/// Target field names every input layout is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    PeakPlayers,
    CurrentPlayers,
    HoursPlayed,
}

impl CanonicalField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::PeakPlayers => "peak_players",
            Self::CurrentPlayers => "current_players",
            Self::HoursPlayed => "hours_played",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a cleaned header onto its canonical field.
#[must_use]
pub fn canonical_field(header: &str) -> Option<CanonicalField> {
    match header {
        "name" | "game" | "title" | "game_name" => Some(CanonicalField::Name),
        "peak_players" | "peakplayers" | "peak_concurrent" | "peak_no._of_players" => {
            Some(CanonicalField::PeakPlayers)
        }
        "current_players" | "players_now" => Some(CanonicalField::CurrentPlayers),
        "hours_played" | "hoursplayed" | "playtime" => Some(CanonicalField::HoursPlayed),
        _ => None,
    }
}

/// Clean a raw header: strip quotes and whitespace, lowercase, and collapse
/// runs of spaces and hyphens into a single underscore.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let unquoted = raw.replace('"', "");
    let lowered = unquoted.trim().to_lowercase();
    SEPARATOR_RUN.replace_all(&lowered, "_").into_owned()
}

/// Keep only decimal digits and parse them; an empty result is zero.
///
/// Lossy by contract: `"1,234"` is 1234, `"N/A"` is 0 and `"1.5"` is 15.
/// Digit runs beyond `u64::MAX` saturate.
#[must_use]
pub fn clean_numeric(raw: &str) -> u64 {
    raw.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(u64::from(digit))
        })
}

/// One row of a normalized input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub name: String,
    pub peak_players: u64,
}

/// Column positions resolved for a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub name: usize,
    pub peak_players: usize,
}

impl ColumnMap {
    /// Resolve canonical columns from raw headers. The first column mapping
    /// to a field wins.
    ///
    /// # Errors
    ///
    /// Returns the first required field no header resolves to.
    pub fn resolve(headers: &StringRecord) -> Result<Self, CanonicalField> {
        let mut name = None;
        let mut peak_players = None;

        for (idx, raw) in headers.iter().enumerate() {
            let slot = match canonical_field(&normalize_header(raw)) {
                Some(CanonicalField::Name) => &mut name,
                Some(CanonicalField::PeakPlayers) => &mut peak_players,
                Some(CanonicalField::CurrentPlayers | CanonicalField::HoursPlayed) | None => {
                    continue;
                }
            };
            slot.get_or_insert(idx);
        }

        Ok(Self {
            name: name.ok_or(CanonicalField::Name)?,
            peak_players: peak_players.ok_or(CanonicalField::PeakPlayers)?,
        })
    }
}

/// Normalized rows from one accepted file, in file row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub source: PathBuf,
    pub records: Vec<NormalizedRecord>,
}

/// Normalize CSV content read from `reader`; `source` labels errors.
///
/// # Errors
///
/// Returns a [`SourceFileError`] if the content has no header row, lacks a
/// required column, or is not valid CSV.
pub fn normalize_reader<R: Read>(
    reader: R,
    source: &Path,
) -> Result<NormalizedBatch, SourceFileError> {
    let csv_error = |source_err: csv::Error| SourceFileError::Csv {
        path: source.to_path_buf(),
        source: source_err,
    };

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SourceFileError::Empty {
            path: source.to_path_buf(),
        });
    }

    let columns =
        ColumnMap::resolve(&headers).map_err(|field| SourceFileError::MissingColumn {
            path: source.to_path_buf(),
            field,
        })?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.map_err(csv_error)?;
        records.push(NormalizedRecord {
            name: row.get(columns.name).unwrap_or_default().trim().to_string(),
            peak_players: clean_numeric(row.get(columns.peak_players).unwrap_or_default()),
        });
    }

    Ok(NormalizedBatch {
        source: source.to_path_buf(),
        records,
    })
}

/// Normalize a single CSV file from disk.
///
/// # Errors
///
/// Returns a [`SourceFileError`] if the file cannot be opened or normalized.
pub fn normalize_file(path: &Path) -> Result<NormalizedBatch, SourceFileError> {
    let file = File::open(path).map_err(|source| SourceFileError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    normalize_reader(file, path)
}

/// A file that was skipped during a scan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters describing a directory scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub files_seen: usize,
    pub files_accepted: usize,
    pub rows_accepted: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Lazy single pass over the CSV files of a directory.
///
/// The file list is taken when the scan is opened; each file is read only
/// when the iterator reaches it. Open a new scan to start over.
#[derive(Debug)]
pub struct DirectoryScan {
    root: PathBuf,
    pending: std::vec::IntoIter<PathBuf>,
    report: ScanReport,
}

impl DirectoryScan {
    /// List the `.csv` files of `dir` in path order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DataDir`] if the directory cannot be listed.
    pub fn open(dir: &Path) -> Result<Self, ConfigError> {
        let data_dir_error = |err: std::io::Error| ConfigError::DataDir {
            path: dir.to_path_buf(),
            message: err.to_string(),
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(data_dir_error)? {
            let path = entry.map_err(data_dir_error)?.path();
            if path.is_file() && has_csv_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        debug!("Found {} CSV files in {}", files.len(), dir.display());

        Ok(Self {
            root: dir.to_path_buf(),
            pending: files.into_iter(),
            report: ScanReport::default(),
        })
    }

    #[must_use]
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Drain the scan, keeping accepted batches and logging every skip.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoUsableInput`] if no file of the scan was
    /// accepted.
    pub fn collect_batches(mut self) -> Result<(Vec<NormalizedBatch>, ScanReport), ConfigError> {
        let mut batches = Vec::new();
        for outcome in self.by_ref() {
            match outcome {
                Ok(batch) => batches.push(batch),
                Err(err) => warn!("Skipping input file: {err}"),
            }
        }

        info!(
            "Finished processing input files. Found {} CSVs, extracted data from {}.",
            self.report.files_seen, self.report.files_accepted
        );

        if self.report.files_accepted == 0 {
            return Err(ConfigError::NoUsableInput {
                path: self.root,
                scanned: self.report.files_seen,
                skipped: self.report.skipped.len(),
            });
        }
        Ok((batches, self.report))
    }
}

impl Iterator for DirectoryScan {
    type Item = Result<NormalizedBatch, SourceFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.pending.next()?;
        self.report.files_seen += 1;
        info!("Processing file: {}", path.display());

        let outcome = normalize_file(&path);
        match &outcome {
            Ok(batch) => {
                self.report.files_accepted += 1;
                self.report.rows_accepted += batch.records.len();
            }
            Err(err) => self.report.skipped.push(SkippedFile {
                path: err.path().clone(),
                reason: err.to_string(),
            }),
        }
        Some(outcome)
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
