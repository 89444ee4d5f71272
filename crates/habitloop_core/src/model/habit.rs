//! Habit domain model.
//!
//! # Responsibility
//! - Define the canonical tracked-habit record and its lifecycle states.
//! - Provide title normalization shared by validation and duplicate checks.
//!
//! # Invariants
//! - `id` is stable and never reused for another habit.
//! - `title` is non-empty and at most `MAX_HABIT_TITLE_LENGTH` characters
//!   after whitespace normalization.
//! - `order` is non-negative; gaps between order values are allowed.

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum habit title length in characters after normalization.
pub const MAX_HABIT_TITLE_LENGTH: usize = 60;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Stable identifier for a habit.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type HabitId = String;

/// Lifecycle state of a habit.
///
/// Archived habits stay in the document with their history; only an
/// explicit delete removes a habit permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitStatus {
    /// Shown in the daily checklist and counted in stats.
    Active,
    /// Hidden from the checklist, excluded from duplicate checks.
    Archived,
}

/// One trackable habit.
///
/// Field names serialize in camelCase to match the persisted wire shape
/// shared with other clients of the same cloud keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Stable global id used in completion sets.
    pub id: HabitId,
    /// Display title, normalized at mutation boundaries.
    pub title: String,
    /// Display position among active habits. Non-negative, not necessarily
    /// contiguous.
    pub order: i64,
    pub status: HabitStatus,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last title/status/order change.
    pub updated_at: String,
}

/// Field-level validation failure for one habit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitValidationError {
    EmptyId,
    EmptyTitle,
    TitleTooLong { length: usize },
    NegativeOrder { order: i64 },
    BadTimestamp { field: &'static str, value: String },
}

impl Display for HabitValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "habit id is empty"),
            Self::EmptyTitle => write!(f, "habit title is empty after normalization"),
            Self::TitleTooLong { length } => write!(
                f,
                "habit title has {length} characters, maximum is {MAX_HABIT_TITLE_LENGTH}"
            ),
            Self::NegativeOrder { order } => write!(f, "habit order {order} is negative"),
            Self::BadTimestamp { field, value } => {
                write!(f, "habit {field} `{value}` is not an RFC 3339 timestamp")
            }
        }
    }
}

impl Error for HabitValidationError {}

impl Habit {
    /// Creates a new active habit with a generated stable id.
    ///
    /// The caller is expected to pass an already-normalized title and the
    /// next free order slot; see `AppStore::add_habit`.
    pub fn new(title: impl Into<String>, order: i64) -> Self {
        let now = now_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            order,
            status: HabitStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Validates field constraints on this record.
    ///
    /// # Errors
    /// Returns the first violated constraint. Title length is measured on
    /// the normalized form so stray whitespace never fails a valid title.
    pub fn validate(&self) -> Result<(), HabitValidationError> {
        if self.id.trim().is_empty() {
            return Err(HabitValidationError::EmptyId);
        }
        let normalized = normalize_title(&self.title);
        if normalized.is_empty() {
            return Err(HabitValidationError::EmptyTitle);
        }
        let length = normalized.chars().count();
        if length > MAX_HABIT_TITLE_LENGTH {
            return Err(HabitValidationError::TitleTooLong { length });
        }
        if self.order < 0 {
            return Err(HabitValidationError::NegativeOrder { order: self.order });
        }
        for (field, value) in [
            ("created_at", &self.created_at),
            ("updated_at", &self.updated_at),
        ] {
            if DateTime::parse_from_rfc3339(value).is_err() {
                return Err(HabitValidationError::BadTimestamp {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Returns whether this habit appears in the daily checklist.
    pub fn is_active(&self) -> bool {
        self.status == HabitStatus::Active
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }
}

/// Collapses internal whitespace runs to single spaces and trims the ends.
pub fn normalize_title(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Normalized lowercase form used for duplicate-title comparison.
pub fn title_key(value: &str) -> String {
    normalize_title(value).to_lowercase()
}

/// Current wall-clock time as an RFC 3339 string with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
