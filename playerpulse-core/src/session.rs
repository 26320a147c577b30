//! Session row shapes before and after cleaning.

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// Sortable ISO-8601 layout used for every written timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Column order of the session dataset.
pub const SESSION_HEADER: [&str; 7] = [
    "user_id",
    "game_id",
    "session_start",
    "session_end",
    "session_duration",
    "day_of_week",
    "hour_of_day",
];

/// Format a timestamp in [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp written as ISO-8601 (`T` or space separated, optional
/// fractional seconds).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    trimmed
        .parse::<NaiveDateTime>()
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f").ok())
}

/// Full English weekday name, as `%A` renders it.
#[must_use]
pub const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A session row as synthesized or as read back from a raw file.
///
/// Text columns hold whatever was written; nothing is trusted until the
/// cleaner has validated the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSession {
    pub user_id: String,
    pub game_id: String,
    pub session_start: String,
    pub session_end: String,
    pub session_duration: Option<i64>,
    pub day_of_week: String,
    pub hour_of_day: Option<u32>,
}

/// A validated session: `session_end > session_start` and
/// `session_duration` equals the elapsed whole minutes between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub game_id: String,
    #[serde(with = "timestamp")]
    pub session_start: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub session_end: NaiveDateTime,
    pub session_duration: i64,
    pub day_of_week: String,
    pub hour_of_day: u32,
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(super::TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {raw:?}")))
    }
}
