//! Diagnostics for self-healing paths.
//!
//! Malformed dates, out-of-range completion values and broken persisted
//! records are never reported as failures. Each correction is written here
//! and emitted as a `tracing` warning so it can be inspected in tests and
//! debugging sessions without surfacing to the user.

use std::fmt;

/// What was wrong with the value that got replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrectionKind {
    /// Value was absent; a default was applied.
    Missing,
    /// Value could not be read as the expected type.
    Unparsable(String),
    /// End date was not after the start date.
    Reordered,
    /// Numeric value fell outside its allowed range.
    Clamped,
    /// Blank text replaced by a default.
    Blank,
    /// Entry duplicated an earlier one and was dropped.
    Duplicate,
    /// Back-reference did not match its owner.
    Mismatch,
    /// Legacy shape rewritten into the current one.
    Migrated,
    /// Whole payload discarded.
    Discarded(String),
}

impl fmt::Display for CorrectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing"),
            Self::Unparsable(raw) => write!(f, "unparsable value {raw:?}"),
            Self::Reordered => f.write_str("end not after start"),
            Self::Clamped => f.write_str("out of range"),
            Self::Blank => f.write_str("blank"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::Mismatch => f.write_str("mismatched reference"),
            Self::Migrated => f.write_str("legacy format"),
            Self::Discarded(reason) => write!(f, "discarded: {reason}"),
        }
    }
}

/// A single applied correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub field: String,
    pub kind: CorrectionKind,
    /// Human-readable form of the value that was substituted.
    pub applied: String,
}

/// Ordered record of corrections made since the log was last cleared.
#[derive(Debug, Clone, Default)]
pub struct RepairLog {
    entries: Vec<Correction>,
}

impl RepairLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        field: impl Into<String>,
        kind: CorrectionKind,
        applied: impl fmt::Display,
    ) {
        let correction = Correction {
            field: field.into(),
            kind,
            applied: applied.to_string(),
        };
        tracing::warn!(
            field = %correction.field,
            applied = %correction.applied,
            "corrected value ({})",
            correction.kind
        );
        self.entries.push(correction);
    }

    pub fn entries(&self) -> &[Correction] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Corrections recorded against `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Correction> + 'a {
        self.entries.iter().filter(move |c| c.field == field)
    }
}
