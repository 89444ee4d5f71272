//! Persistence boundary: storage tiers, retry policy and orchestration.
//!
//! # Responsibility
//! - Define the remote and local store contracts and the persisted keys.
//! - Coordinate load/save across both tiers with a bounded retry policy.
//!
//! # Invariants
//! - The remote tier is only ever written as the full three-key set from a
//!   single authoritative in-memory document.
//! - The local tier additionally carries one consolidated snapshot key used
//!   exclusively by the load fallback path.

pub mod local;
pub mod orchestrator;
pub mod remote;
pub mod retry;

/// Stringified schema version, both tiers.
pub const KEY_SCHEMA_VERSION: &str = "schema_version_v1";
/// Serialized habit list, both tiers.
pub const KEY_HABITS: &str = "habits_v1";
/// Serialized completion index, both tiers.
pub const KEY_COMPLETIONS: &str = "completions_v1";
/// Consolidated full-document snapshot, local tier only.
pub const KEY_FALLBACK_SNAPSHOT: &str = "snapshot_v1";
