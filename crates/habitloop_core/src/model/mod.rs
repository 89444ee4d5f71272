//! Domain model for the tracked-habit document.
//!
//! # Responsibility
//! - Define the versioned document shape persisted across both tiers.
//! - Provide validation used identically for remote and local candidates.
//!
//! # Invariants
//! - Every habit is identified by a stable string id.
//! - Active habit titles are unique under normalized, case-insensitive
//!   comparison (enforced by mutation paths, not by decode).

pub mod document;
pub mod habit;
