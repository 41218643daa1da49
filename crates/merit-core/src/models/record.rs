//! Record model

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize};

use crate::clock::{format_date, format_time};
use crate::error::{Error, Result};

/// Smallest accepted score.
pub const MIN_SCORE: u32 = 1;
/// Largest accepted score.
pub const MAX_SCORE: u32 = 1000;
/// Maximum note length, in characters.
pub const MAX_NOTE_CHARS: usize = 500;
/// Weights offered by the record-creation UI.
pub const PRESET_SCORES: [u32; 4] = [1, 10, 30, 100];

const DEFAULT_SCORE: u32 = 1;

/// The two record categories. Serialized with the backend's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A merit ("gong")
    #[serde(rename = "gong", alias = "merit")]
    Merit,
    /// A fault ("guo")
    #[serde(rename = "guo", alias = "fault")]
    Fault,
}

impl RecordKind {
    /// Lowercase display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Merit => "merit",
            Self::Fault => "fault",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merit" | "gong" => Ok(Self::Merit),
            "fault" | "guo" => Ok(Self::Fault),
            other => Err(Error::InvalidInput(format!(
                "record type must be merit or fault, got '{other}'"
            ))),
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// `{date}-{unix ms}` while local, server-issued once synced
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    /// Logical day (`YYYY-MM-DD`); immutable after creation
    #[serde(default)]
    pub date: String,
    /// Local creation time (`HH:mm`), used for same-day ordering
    #[serde(default)]
    pub time: String,
    /// Merit or fault
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Positive weight
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u32,
    /// Optional free text
    #[serde(default)]
    pub note: Option<String>,
    /// ISO-8601 creation timestamp; immutable
    #[serde(default)]
    pub created_at: String,
    /// ISO-8601 timestamp of the last mutation
    #[serde(default)]
    pub updated_at: String,
}

impl Record {
    /// Build a locally-identified record created at `now`.
    #[must_use]
    pub fn new_local(input: &NewRecord, now: &DateTime<Local>) -> Self {
        let date = format_date(now.date_naive());
        let stamp = iso_timestamp(now);
        Self {
            id: local_id(&date, now.timestamp_millis()),
            date,
            time: format_time(now),
            kind: input.kind,
            score: input.score.unwrap_or(DEFAULT_SCORE),
            note: input.note.clone(),
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }

    /// Signed contribution of this record (merit positive, fault negative).
    #[must_use]
    pub fn signed_score(&self) -> i64 {
        match self.kind {
            RecordKind::Merit => i64::from(self.score),
            RecordKind::Fault => -i64::from(self.score),
        }
    }

    /// Whether the record carries enough data to be counted in a day bucket.
    #[must_use]
    pub fn is_countable(&self) -> bool {
        !self.id.trim().is_empty() && !self.date.trim().is_empty()
    }

    /// Ordering by recency: `created_at` first, then `updated_at`.
    ///
    /// Timestamps that parse as RFC 3339 are compared as instants; anything
    /// else falls back to a plain string comparison.
    #[must_use]
    pub fn recency_cmp(&self, other: &Self) -> Ordering {
        compare_timestamps(&self.created_at, &other.created_at)
            .then_with(|| compare_timestamps(&self.updated_at, &other.updated_at))
    }

    /// Key used for same-day ordering: `time`, else `HH:mm` of `created_at`.
    #[must_use]
    pub fn sort_time(&self) -> String {
        if !self.time.trim().is_empty() {
            return self.time.clone();
        }
        parse_timestamp(&self.created_at)
            .map(|instant| format_time(&instant.with_timezone(&Local)))
            .unwrap_or_default()
    }
}

/// User input for a new record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Defaults to 1 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewRecord {
    #[must_use]
    pub fn new(kind: RecordKind, score: u32) -> Self {
        Self {
            kind,
            score: Some(score),
            note: None,
        }
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        validate_note(self.note.as_deref())
    }
}

/// Partial update of an existing record. `date` and `created_at` are not
/// updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<RecordKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// `Some(None)` clears the note; on the wire that is `"note": null`
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<Option<String>>,
}

impl RecordUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none() && self.score.is_none() && self.note.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        if let Some(note) = &self.note {
            validate_note(note.as_deref())?;
        }
        Ok(())
    }

    /// Merge this update into `record` and stamp `updated_at`.
    pub fn apply_to(&self, record: &mut Record, now: &DateTime<Local>) {
        if let Some(kind) = self.kind {
            record.kind = kind;
        }
        if let Some(score) = self.score {
            record.score = score;
        }
        if let Some(note) = &self.note {
            record.note.clone_from(note);
        }
        record.updated_at = iso_timestamp(now);
    }
}

/// Decode records one by one, skipping entries that are not a valid record.
pub fn decode_records(values: Vec<serde_json::Value>) -> Vec<Record> {
    let total = values.len();
    let records = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<Record>(value).ok())
        .collect::<Vec<_>>();
    if records.len() < total {
        tracing::warn!(
            "Skipped {} malformed record entries out of {}",
            total - records.len(),
            total
        );
    }
    records
}

/// Local identifier for a record created on `date` at `millis`.
#[must_use]
pub fn local_id(date: &str, millis: i64) -> String {
    format!("{date}-{millis}")
}

/// ISO-8601 timestamp (UTC, millisecond precision) for `instant`.
#[must_use]
pub fn iso_timestamp(instant: &DateTime<Local>) -> String {
    instant
        .with_timezone(&chrono::Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate_score(score: u32) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )))
    }
}

fn validate_note(note: Option<&str>) -> Result<()> {
    match note {
        Some(note) if note.chars().count() > MAX_NOTE_CHARS => Err(Error::InvalidInput(format!(
            "note must be at most {MAX_NOTE_CHARS} characters"
        ))),
        _ => Ok(()),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

fn compare_timestamps(left: &str, right: &str) -> Ordering {
    match (parse_timestamp(left), parse_timestamp(right)) {
        (Some(left), Some(right)) => left.cmp(&right),
        _ => left.cmp(right),
    }
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "record id must be a string or number, got {other}"
        ))),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|score| u32::try_from(score).ok())
        .unwrap_or(0))
}

/// A field that is present, even as `null`, decodes to `Some`.
fn present_field<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
