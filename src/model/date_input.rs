//! Date inputs and the normalization policy shared by task creation, task
//! updates and persisted-state repair.
//!
//! # Invariants
//! - [`DateInput::resolve`] never panics; malformed input and instants
//!   outside four-digit years resolve to `None`.
//! - [`normalize`] is total: it always yields a valid instant.
//! - [`clamp_start`] keeps `start + default_span()` inside four-digit years.
//! - [`enforce_order`] guarantees `end > start`.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::repair::{CorrectionKind, RepairLog};

/// Span used when an end date has to be invented from a start date.
pub fn default_span() -> Duration {
    Duration::days(7)
}

/// Minimum gap forced between start and end when they are out of order.
pub fn min_span() -> Duration {
    Duration::days(1)
}

/// Dates are limited to four-digit years, the range RFC 3339 can carry.
pub fn is_supported(dt: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&dt.year())
}

/// Latest usable start date. Leaves room for the default span so every
/// derived end date stays inside the supported range.
pub fn latest_start() -> DateTime<Utc> {
    let last_day = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
    midnight_utc(last_day) - default_span()
}

/// Any value a caller may hand over as a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Instant(DateTime<Utc>),
    Text(String),
    EpochMillis(i64),
}

impl DateInput {
    /// Convert to an instant, or `None` if the value is not a usable date.
    /// Instants outside four-digit years are not usable.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        let dt = match self {
            Self::Instant(dt) => Some(*dt),
            Self::Text(s) => parse_date_text(s),
            Self::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
        }?;
        is_supported(&dt).then_some(dt)
    }

    /// Read a date input out of a JSON value. Strings and numbers qualify;
    /// anything else is not a date input at all.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
                .map(Self::EpochMillis),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Instant(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        Self::Instant(midnight_utc(value))
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for DateInput {
    fn from(value: i64) -> Self {
        Self::EpochMillis(value)
    }
}

impl std::fmt::Display for DateInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instant(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::EpochMillis(ms) => write!(f, "{ms}ms"),
        }
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Try parsing a date string with several common formats.
///
/// Full timestamps are tried first, then calendar dates which resolve to
/// midnight UTC.
pub fn parse_date_text(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%m-%d-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(midnight_utc(d));
        }
    }
    None
}

/// The date-bearing fields the repair policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
    CreatedAt,
    UpdatedAt,
}

impl DateField {
    pub const ALL: [DateField; 4] = [Self::Start, Self::End, Self::CreatedAt, Self::UpdatedAt];

    /// Key used in the persisted form.
    pub fn key(self) -> &'static str {
        match self {
            Self::Start => "startDate",
            Self::End => "endDate",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    /// Default used when the field holds no valid date and nothing better is
    /// known.
    pub fn default_value(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::End => now + default_span(),
            Self::Start | Self::CreatedAt | Self::UpdatedAt => now,
        }
    }
}

/// Resolve `input` for `field`, substituting `fallback` when the input is
/// missing or unusable. Never fails.
pub fn normalize(
    field: DateField,
    input: Option<&DateInput>,
    fallback: DateTime<Utc>,
    log: &mut RepairLog,
) -> DateTime<Utc> {
    match input {
        Some(raw) => match raw.resolve() {
            Some(dt) => dt,
            None => {
                log.record(field.key(), CorrectionKind::Unparsable(raw.to_string()), fallback.to_rfc3339());
                fallback
            }
        },
        None => {
            log.record(field.key(), CorrectionKind::Missing, fallback.to_rfc3339());
            fallback
        }
    }
}

/// Pulls a start date back to [`latest_start`] when it is later.
pub fn clamp_start(start: DateTime<Utc>, log: &mut RepairLog) -> DateTime<Utc> {
    let latest = latest_start();
    if start <= latest {
        return start;
    }
    log.record(DateField::Start.key(), CorrectionKind::Clamped, latest.to_rfc3339());
    latest
}

/// Returns an end date strictly after `start`, pushing it to one day past
/// the start when needed. `start` must already have passed [`clamp_start`].
pub fn enforce_order(start: DateTime<Utc>, end: DateTime<Utc>, log: &mut RepairLog) -> DateTime<Utc> {
    if end > start {
        return end;
    }
    let fixed = start + min_span();
    log.record(DateField::End.key(), CorrectionKind::Reordered, fixed.to_rfc3339());
    fixed
}
