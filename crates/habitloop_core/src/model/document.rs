//! Versioned document shape and schema validation.
//!
//! # Responsibility
//! - Define the unit of persistence: schema version, habits, completions.
//! - Decode candidate data from either storage tier through one shared,
//!   non-throwing validation path.
//!
//! # Invariants
//! - Decoding is total: malformed input yields a typed error, never a panic.
//! - A writable in-memory document always carries `CURRENT_SCHEMA_VERSION`.
//! - Absence of a date key is equivalent to an empty completion set.

use crate::model::habit::{Habit, HabitId, HabitValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The single schema version this client can write.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Cap on concurrently active habits.
pub const MAX_ACTIVE_HABITS: usize = 50;

/// Calendar date (ISO `YYYY-MM-DD`) to ids completed on that date.
///
/// Membership is set-like; the `Vec` preserves wire shape and insertion
/// order but never holds duplicates.
pub type CompletionIndex = BTreeMap<String, Vec<HabitId>>;

/// The full persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "schemaVersion")]
    pub schema_version: i64,
    pub habits: Vec<Habit>,
    #[serde(rename = "completionsByDate")]
    pub completions: CompletionIndex,
}

/// Validation failure for a candidate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    /// Schema version value is not a non-negative integer.
    SchemaVersion(String),
    /// Habits payload is not a JSON array of habit records.
    HabitsShape(String),
    /// One habit record violates field constraints.
    Habit(HabitValidationError),
    /// Completions payload is not a map from string keys to id arrays.
    CompletionsShape(String),
    /// Consolidated snapshot payload is not a document object.
    SnapshotShape(String),
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaVersion(value) => {
                write!(f, "schema version `{value}` is not a non-negative integer")
            }
            Self::HabitsShape(details) => write!(f, "habits payload is malformed: {details}"),
            Self::Habit(err) => write!(f, "{err}"),
            Self::CompletionsShape(details) => {
                write!(f, "completions payload is malformed: {details}")
            }
            Self::SnapshotShape(details) => write!(f, "snapshot payload is malformed: {details}"),
        }
    }
}

impl Error for DocumentValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Habit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HabitValidationError> for DocumentValidationError {
    fn from(value: HabitValidationError) -> Self {
        Self::Habit(value)
    }
}

impl Document {
    /// Fresh first-use document at the current schema version.
    pub fn empty() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            habits: Vec::new(),
            completions: CompletionIndex::new(),
        }
    }

    /// Validates every habit record and the schema version field.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        if self.schema_version < 0 {
            return Err(DocumentValidationError::SchemaVersion(
                self.schema_version.to_string(),
            ));
        }
        for habit in &self.habits {
            habit.validate()?;
        }
        Ok(())
    }

    /// Returns the number of active habits.
    pub fn active_count(&self) -> usize {
        self.habits.iter().filter(|habit| habit.is_active()).count()
    }

    /// Highest order value across all habits, or 0 when empty.
    ///
    /// Used by add/unarchive so restored and new habits surface at the end
    /// of the active list.
    pub fn max_order(&self) -> i64 {
        self.habits.iter().map(|habit| habit.order).max().unwrap_or(0)
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == id)
    }

    pub fn habit_mut(&mut self, id: &str) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|habit| habit.id == id)
    }

    /// Flips completion membership of `id` on `date`.
    ///
    /// Returns `true` when the habit is completed after the toggle. The date
    /// entry is created lazily; a double toggle restores the original set.
    pub fn toggle_completion(&mut self, date: &str, id: &str) -> bool {
        let entry = self.completions.entry(date.to_string()).or_default();
        if let Some(position) = entry.iter().position(|existing| existing == id) {
            entry.remove(position);
            false
        } else {
            entry.push(id.to_string());
            true
        }
    }

    /// Removes the whole completion record for `date`.
    pub fn reset_day(&mut self, date: &str) {
        self.completions.remove(date);
    }
}

/// Parses the stringified schema version key.
///
/// # Errors
/// Rejects values that are not non-negative integers after trimming.
pub fn parse_schema_version(raw: &str) -> Result<i64, DocumentValidationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(version) if version >= 0 => Ok(version),
        _ => Err(DocumentValidationError::SchemaVersion(trimmed.to_string())),
    }
}

/// Decodes the three-key wire representation into a writable document.
///
/// Absent keys mean empty collections; the caller has already established
/// that the wire schema version is writable by this client.
///
/// # Errors
/// Any shape or field violation is returned as a typed error; this path is
/// the corruption detector for data at or below the current version.
pub fn decode_wire(
    habits_raw: Option<&str>,
    completions_raw: Option<&str>,
) -> Result<Document, DocumentValidationError> {
    let habits: Vec<Habit> = match habits_raw {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|err| DocumentValidationError::HabitsShape(err.to_string()))?,
        None => Vec::new(),
    };
    let completions: CompletionIndex = match completions_raw {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|err| DocumentValidationError::CompletionsShape(err.to_string()))?,
        None => CompletionIndex::new(),
    };

    let document = Document {
        schema_version: CURRENT_SCHEMA_VERSION,
        habits,
        completions,
    };
    document.validate()?;
    Ok(document)
}

/// Defensive decode for data written by a newer client.
///
/// Payloads that are not an array/object are treated as empty, and a
/// candidate that still fails validation degrades to an empty document so
/// the user can at least view what this client understands.
pub fn decode_lenient(habits_raw: Option<&str>, completions_raw: Option<&str>) -> Document {
    let habits_raw = habits_raw.filter(|raw| {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(|value| value.is_array())
            .unwrap_or(false)
    });
    let completions_raw = completions_raw.filter(|raw| {
        serde_json::from_str::<serde_json::Value>(raw)
            .map(|value| value.is_object())
            .unwrap_or(false)
    });

    decode_wire(habits_raw, completions_raw).unwrap_or_else(|_| Document::empty())
}

/// Decodes the consolidated local fallback snapshot.
///
/// # Errors
/// Rejects non-document payloads, snapshots from a newer schema version and
/// any field violation; the caller treats all of these as "no usable local
/// data".
pub fn decode_snapshot(raw: &str) -> Result<Document, DocumentValidationError> {
    let document: Document = serde_json::from_str(raw)
        .map_err(|err| DocumentValidationError::SnapshotShape(err.to_string()))?;
    if document.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(DocumentValidationError::SchemaVersion(
            document.schema_version.to_string(),
        ));
    }
    document.validate()?;
    Ok(document)
}
