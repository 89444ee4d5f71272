//! Application state store.
//!
//! # Responsibility
//! - Own the in-memory document, sync status and UI-derived selection state.
//! - Apply user mutations synchronously, then run the save protocol.
//!
//! # Invariants
//! - Every mutation reads the current in-memory document at invocation time;
//!   there is no save queue, the remote tier is last-write-wins.
//! - In read-only mode every mutation is rejected before touching state.
//! - A second load is gated on the explicit `Loading` status flag.

use crate::model::document::{Document, MAX_ACTIVE_HABITS};
use crate::model::habit::{
    normalize_title, title_key, Habit, HabitId, HabitStatus, MAX_HABIT_TITLE_LENGTH,
};
use crate::service::dates;
use crate::service::views::{self, WeekStatPoint};
use crate::storage::local::LocalStore;
use crate::storage::orchestrator::{Orchestrator, LOAD_FAILED_MESSAGE};
use crate::storage::remote::RemoteStore;
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse lifecycle of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Loading,
    Error,
    Ready,
}

/// Outcome of the most recent save attempt's remote leg. Never blocks reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    Syncing,
    Error,
}

/// User-facing mutation rejection. Recovered entirely locally; rejected
/// mutations never reach storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    EmptyTitle,
    TitleTooLong,
    DuplicateTitle,
    TooManyActive,
    HabitNotFound(HabitId),
    InvalidDate(String),
    ReadOnly,
}

impl Display for MutationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Enter a habit name."),
            Self::TitleTooLong => {
                write!(f, "Keep the name under {MAX_HABIT_TITLE_LENGTH} characters.")
            }
            Self::DuplicateTitle => write!(f, "A habit with this name already exists."),
            Self::TooManyActive => {
                write!(f, "You can track up to {MAX_ACTIVE_HABITS} active habits.")
            }
            Self::HabitNotFound(id) => write!(f, "Habit not found: {id}."),
            Self::InvalidDate(value) => write!(f, "`{value}` is not a calendar date."),
            Self::ReadOnly => write!(
                f,
                "A newer app version owns this data; changes are disabled."
            ),
        }
    }
}

impl Error for MutationError {}

/// Single-owner application state for the process lifetime.
///
/// Created once at process start and injected into the presentation layer;
/// never reinitialized mid-run.
pub struct AppStore<R: RemoteStore, L: LocalStore> {
    remote: R,
    local: L,
    document: Document,
    status: AppStatus,
    load_error: Option<String>,
    notice: Option<String>,
    read_only: bool,
    sync_state: SyncState,
    selected_date: String,
    selected_week_start: String,
    first_use_hint: bool,
}

impl<R: RemoteStore, L: LocalStore> AppStore<R, L> {
    pub fn new(remote: R, local: L) -> Self {
        let today = dates::today_iso();
        let week_start = dates::iso_week_start(&today).unwrap_or_else(|| today.clone());
        Self {
            remote,
            local,
            document: Document::empty(),
            status: AppStatus::Idle,
            load_error: None,
            notice: None,
            read_only: false,
            sync_state: SyncState::Synced,
            selected_date: today,
            selected_week_start: week_start,
            first_use_hint: false,
        }
    }

    /// Runs the load protocol and installs the result.
    ///
    /// A call while a load is already in flight is ignored; the status flag
    /// is the concurrency gate the orchestrator itself does not provide.
    pub async fn initialize(&mut self) {
        if self.status == AppStatus::Loading {
            warn!("event=app_load module=service status=skipped reason=load_in_flight");
            return;
        }
        self.status = AppStatus::Loading;
        self.load_error = None;

        let loaded = Orchestrator::new(&self.remote, &self.local).load().await;
        match loaded {
            Ok(result) => {
                self.first_use_hint = result.document.habits.is_empty();
                self.document = result.document;
                self.read_only = result.read_only;
                self.notice = result.warning;
                self.status = AppStatus::Ready;
                info!(
                    "event=app_load module=service status=ok origin={} read_only={} habits={}",
                    result.origin.as_str(),
                    self.read_only,
                    self.document.habits.len()
                );
            }
            Err(err) => {
                self.status = AppStatus::Error;
                self.load_error = Some(LOAD_FAILED_MESSAGE.to_string());
                error!("event=app_load module=service status=error error={err}");
            }
        }
    }

    /// Manual retry affordance for the blocking load-error screen.
    pub async fn retry_load(&mut self) {
        self.initialize().await;
    }

    /// Manual retry affordance for the non-blocking sync-error banner.
    pub async fn retry_sync(&mut self) {
        if self.read_only {
            return;
        }
        self.persist().await;
    }

    // ---- habit mutations ------------------------------------------------

    /// Adds an active habit at the end of the list.
    ///
    /// # Errors
    /// Rejects empty/overlong titles, duplicates among active habits, the
    /// active-habit cap, and any mutation in read-only mode.
    pub async fn add_habit(&mut self, title: &str) -> Result<HabitId, MutationError> {
        self.ensure_writable()?;
        let normalized = validate_title(title)?;
        if self.has_active_duplicate(&normalized, None) {
            return Err(MutationError::DuplicateTitle);
        }
        if self.document.active_count() >= MAX_ACTIVE_HABITS {
            return Err(MutationError::TooManyActive);
        }

        let habit = Habit::new(normalized, self.document.max_order() + 1);
        let id = habit.id.clone();
        self.document.habits.push(habit);
        self.first_use_hint = false;
        self.persist().await;
        Ok(id)
    }

    /// Renames a habit, keeping active titles unique.
    pub async fn rename_habit(&mut self, id: &str, title: &str) -> Result<(), MutationError> {
        self.ensure_writable()?;
        let normalized = validate_title(title)?;
        if self.document.habit(id).is_none() {
            return Err(MutationError::HabitNotFound(id.to_string()));
        }
        if self.has_active_duplicate(&normalized, Some(id)) {
            return Err(MutationError::DuplicateTitle);
        }

        if let Some(habit) = self.document.habit_mut(id) {
            habit.title = normalized;
            habit.touch();
        }
        self.persist().await;
        Ok(())
    }

    /// Hides a habit from the checklist without losing its history.
    pub async fn archive_habit(&mut self, id: &str) -> Result<(), MutationError> {
        self.set_status(id, HabitStatus::Archived, None).await
    }

    /// Restores an archived habit at the end of the active list.
    pub async fn unarchive_habit(&mut self, id: &str) -> Result<(), MutationError> {
        let order = self.document.max_order() + 1;
        self.set_status(id, HabitStatus::Active, Some(order)).await
    }

    /// Permanently removes a habit. Completion history keeps the raw id but
    /// derived views no longer count it.
    pub async fn delete_habit(&mut self, id: &str) -> Result<(), MutationError> {
        self.ensure_writable()?;
        let before = self.document.habits.len();
        self.document.habits.retain(|habit| habit.id != id);
        if self.document.habits.len() == before {
            return Err(MutationError::HabitNotFound(id.to_string()));
        }
        self.persist().await;
        Ok(())
    }

    /// Rewrites active orders from 0-based positions in `ordered_ids`.
    ///
    /// Archived habits and active habits missing from the sequence keep
    /// their current order.
    pub async fn reorder_active_habits(
        &mut self,
        ordered_ids: &[HabitId],
    ) -> Result<(), MutationError> {
        self.ensure_writable()?;
        for habit in &mut self.document.habits {
            if !habit.is_active() {
                continue;
            }
            if let Some(position) = ordered_ids.iter().position(|id| id == &habit.id) {
                let order = position as i64;
                if habit.order != order {
                    habit.order = order;
                    habit.touch();
                }
            }
        }
        self.persist().await;
        Ok(())
    }

    // ---- completion mutations -------------------------------------------

    /// Toggles completion of `id` on the selected date.
    ///
    /// Returns whether the habit is completed after the toggle.
    pub async fn toggle_habit(&mut self, id: &str) -> Result<bool, MutationError> {
        self.ensure_writable()?;
        if self.document.habit(id).is_none() {
            return Err(MutationError::HabitNotFound(id.to_string()));
        }
        let date = self.selected_date.clone();
        let completed = self.document.toggle_completion(&date, id);
        self.persist().await;
        Ok(completed)
    }

    /// Clears the selected date's completion record entirely.
    pub async fn reset_selected_day(&mut self) -> Result<(), MutationError> {
        self.ensure_writable()?;
        let date = self.selected_date.clone();
        self.document.reset_day(&date);
        self.persist().await;
        Ok(())
    }

    // ---- selection and hints --------------------------------------------

    /// Selects a date and re-anchors the week to its Monday.
    pub fn select_date(&mut self, date: &str) -> Result<(), MutationError> {
        let week_start = dates::iso_week_start(date)
            .ok_or_else(|| MutationError::InvalidDate(date.to_string()))?;
        self.selected_date = date.to_string();
        self.selected_week_start = week_start;
        Ok(())
    }

    /// Moves the visible week by `delta` and selects its first day.
    pub fn shift_week(&mut self, delta: i64) {
        if let Some(week_start) = dates::shift_weeks(&self.selected_week_start, delta) {
            self.selected_date = week_start.clone();
            self.selected_week_start = week_start;
        }
    }

    pub fn dismiss_first_use_hint(&mut self) {
        self.first_use_hint = false;
    }

    // ---- derived state ---------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn read_only(&self) -> bool {
        self.read_only
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn selected_date(&self) -> &str {
        &self.selected_date
    }

    pub fn selected_week_start(&self) -> &str {
        &self.selected_week_start
    }

    pub fn first_use_hint(&self) -> bool {
        self.first_use_hint
    }

    pub fn active_habits(&self) -> Vec<&Habit> {
        views::active_habits(&self.document.habits)
    }

    pub fn archived_habits(&self) -> Vec<&Habit> {
        views::archived_habits(&self.document.habits)
    }

    /// Completed ids for the selected date.
    pub fn selected_day_completions(&self) -> HashSet<&str> {
        views::completed_set_for_date(&self.document.completions, &self.selected_date)
    }

    /// Week chart data for the selected week.
    pub fn selected_week_stats(&self) -> Vec<WeekStatPoint> {
        views::week_stats(
            &self.selected_week_start,
            &self.document.habits,
            &self.document.completions,
        )
    }

    // ---- internals -------------------------------------------------------

    async fn set_status(
        &mut self,
        id: &str,
        status: HabitStatus,
        order: Option<i64>,
    ) -> Result<(), MutationError> {
        self.ensure_writable()?;
        let Some(habit) = self.document.habit_mut(id) else {
            return Err(MutationError::HabitNotFound(id.to_string()));
        };
        habit.status = status;
        if let Some(order) = order {
            habit.order = order;
        }
        habit.touch();
        self.persist().await;
        Ok(())
    }

    async fn persist(&mut self) {
        self.sync_state = SyncState::Syncing;
        let result = Orchestrator::new(&self.remote, &self.local)
            .save(&self.document)
            .await;
        if result.synced {
            self.sync_state = SyncState::Synced;
            self.notice = None;
        } else {
            self.sync_state = SyncState::Error;
            self.notice = result.warning;
        }
    }

    fn ensure_writable(&self) -> Result<(), MutationError> {
        if self.read_only {
            return Err(MutationError::ReadOnly);
        }
        Ok(())
    }

    fn has_active_duplicate(&self, normalized_title: &str, exclude_id: Option<&str>) -> bool {
        let key = title_key(normalized_title);
        self.document.habits.iter().any(|habit| {
            habit.is_active()
                && exclude_id != Some(habit.id.as_str())
                && title_key(&habit.title) == key
        })
    }
}

fn validate_title(title: &str) -> Result<String, MutationError> {
    let normalized = normalize_title(title);
    if normalized.is_empty() {
        return Err(MutationError::EmptyTitle);
    }
    if normalized.chars().count() > MAX_HABIT_TITLE_LENGTH {
        return Err(MutationError::TitleTooLong);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{validate_title, MutationError};

    #[test]
    fn validate_title_normalizes_and_bounds() {
        assert_eq!(
            validate_title("  Drink   water ").expect("valid title"),
            "Drink water"
        );
        assert_eq!(validate_title(" \t "), Err(MutationError::EmptyTitle));
        assert_eq!(
            validate_title(&"x".repeat(61)),
            Err(MutationError::TitleTooLong)
        );
    }
}
