//! Core persistence and synchronization logic for HabitLoop.
//! This crate is the single source of truth for document invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    Document, DocumentValidationError, CURRENT_SCHEMA_VERSION, MAX_ACTIVE_HABITS,
};
pub use model::habit::{Habit, HabitId, HabitStatus, HabitValidationError, MAX_HABIT_TITLE_LENGTH};
pub use service::app_store::{AppStore, AppStatus, MutationError, SyncState};
pub use storage::local::{LocalStore, SqliteLocalStore};
pub use storage::orchestrator::{LoadError, LoadResult, Orchestrator, Origin, SaveResult};
pub use storage::remote::{RemoteError, RemoteStore};
pub use storage::retry::RetryPolicy;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
