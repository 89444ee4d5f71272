//! UI-facing use-case layer.
//!
//! # Responsibility
//! - Own the in-memory document and its derived state for process lifetime.
//! - Translate user mutations into validated document changes plus saves.
//!
//! # Invariants
//! - Service APIs never bypass document validation or the save protocol.
//! - The service layer remains transport- and storage-agnostic.

pub mod app_store;
pub mod dates;
pub mod views;
