//! Session cleaning: structural validation and duration recomputation.
//!
//! Bad rows are dropped and counted, never fatal. Surviving rows keep their
//! input order and always satisfy `session_end > session_start` with
//! `session_duration` equal to the elapsed minutes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::Weekday;
use csv::ReaderBuilder;
use log::{debug, info};
use serde::Serialize;

use crate::error::{DropReason, RecordError, SourceFileError};
use crate::numbers::{i64_to_f64, round_f64_to_i64};
use crate::sampling::DurationBounds;
use crate::session::{RawSession, SessionRecord, parse_timestamp};

/// Row counts for one cleaning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub rows_in: usize,
    pub rows_kept: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl CleanReport {
    #[must_use]
    pub fn rows_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    fn record_drop(&mut self, err: &RecordError) {
        debug!("Dropping session: {err}");
        *self.dropped.entry(err.reason()).or_default() += 1;
    }
}

/// Validated sessions plus the counts describing what was removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanOutcome {
    pub sessions: Vec<SessionRecord>,
    pub report: CleanReport,
}

/// Validates rows and recomputes their durations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionCleaner {
    bounds: Option<DurationBounds>,
}

impl SessionCleaner {
    /// Cleaner that only enforces structure and positive durations.
    #[must_use]
    pub const fn new() -> Self {
        Self { bounds: None }
    }

    /// Also drop rows whose recomputed duration falls outside `bounds`.
    #[must_use]
    pub const fn with_bounds(bounds: DurationBounds) -> Self {
        Self {
            bounds: Some(bounds),
        }
    }

    /// Clean synthesized rows.
    #[must_use]
    pub fn clean<I>(&self, rows: I) -> CleanOutcome
    where
        I: IntoIterator<Item = RawSession>,
    {
        self.clean_decoded(rows.into_iter().map(Ok))
    }

    /// Clean rows that may already have failed to decode.
    #[must_use]
    pub fn clean_decoded<I>(&self, rows: I) -> CleanOutcome
    where
        I: IntoIterator<Item = Result<RawSession, RecordError>>,
    {
        info!("Cleaning generated session data...");
        let mut outcome = CleanOutcome::default();
        for (row, decoded) in rows.into_iter().enumerate() {
            outcome.report.rows_in += 1;
            match decoded.and_then(|raw| self.validate(row, raw)) {
                Ok(session) => outcome.sessions.push(session),
                Err(err) => outcome.report.record_drop(&err),
            }
        }
        outcome.report.rows_kept = outcome.sessions.len();
        info!(
            "Cleaning complete. Removed {} invalid/incomplete sessions.",
            outcome.report.rows_dropped()
        );
        outcome
    }

    /// Read a raw session CSV and clean it. Rows that fail to decode are
    /// dropped and counted like any other invalid row.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceFileError`] if the file cannot be opened or has no
    /// header row.
    pub fn clean_file(&self, path: &Path) -> Result<CleanOutcome, SourceFileError> {
        let file = File::open(path).map_err(|source| SourceFileError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        self.clean_reader(file, path)
    }

    /// # Errors
    ///
    /// Returns a [`SourceFileError`] if the content has no header row.
    pub fn clean_reader<R: Read>(
        &self,
        reader: R,
        source: &Path,
    ) -> Result<CleanOutcome, SourceFileError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|source_err| SourceFileError::Csv {
                path: source.to_path_buf(),
                source: source_err,
            })?;
        if headers.is_empty() {
            return Err(SourceFileError::Empty {
                path: source.to_path_buf(),
            });
        }

        let rows = csv_reader
            .deserialize::<RawSession>()
            .enumerate()
            .map(|(row, decoded)| {
                decoded.map_err(|err| RecordError::Decode {
                    row,
                    message: err.to_string(),
                })
            });
        Ok(self.clean_decoded(rows))
    }

    fn validate(&self, row: usize, raw: RawSession) -> Result<SessionRecord, RecordError> {
        let RawSession {
            user_id,
            game_id,
            session_start,
            session_end,
            session_duration,
            day_of_week,
            hour_of_day,
        } = raw;

        let user_id = required_text(row, "user_id", user_id)?;
        let game_id = required_text(row, "game_id", game_id)?;
        let start = required_timestamp(row, "session_start", &session_start)?;
        let end = required_timestamp(row, "session_end", &session_end)?;
        if session_duration.is_none() {
            return Err(RecordError::MissingField {
                row,
                column: "session_duration",
            });
        }
        let day_of_week = required_text(row, "day_of_week", day_of_week)?;
        if day_of_week.parse::<Weekday>().is_err() {
            return Err(RecordError::Unparseable {
                row,
                column: "day_of_week",
                value: day_of_week,
            });
        }
        let hour_of_day = hour_of_day.ok_or(RecordError::MissingField {
            row,
            column: "hour_of_day",
        })?;
        if hour_of_day > 23 {
            return Err(RecordError::Unparseable {
                row,
                column: "hour_of_day",
                value: hour_of_day.to_string(),
            });
        }

        let minutes = round_f64_to_i64(i64_to_f64((end - start).num_seconds()) / 60.0);
        if minutes <= 0 {
            return Err(RecordError::NonPositiveDuration { row, minutes });
        }
        if let Some(bounds) = self.bounds
            && !bounds.contains(minutes)
        {
            return Err(RecordError::DurationOutOfBounds {
                row,
                minutes,
                min: bounds.min_minutes,
                max: bounds.max_minutes,
            });
        }

        Ok(SessionRecord {
            user_id,
            game_id,
            session_start: start,
            session_end: end,
            session_duration: minutes,
            day_of_week,
            hour_of_day,
        })
    }
}

fn required_text(row: usize, column: &'static str, value: String) -> Result<String, RecordError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::MissingField { row, column });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}

fn required_timestamp(
    row: usize,
    column: &'static str,
    value: &str,
) -> Result<chrono::NaiveDateTime, RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::MissingField { row, column });
    }
    parse_timestamp(value).ok_or_else(|| RecordError::BadTimestamp {
        row,
        column,
        value: value.to_string(),
    })
}
