//! Load/save orchestration across the remote and local tiers.
//!
//! # Responsibility
//! - Drive the load protocol: remote read, validation, local fallback.
//! - Drive the save protocol: local-first write, best-effort remote write.
//! - Apply the schema-version policy (newer data is read-only).
//!
//! # Invariants
//! - The orchestrator owns no long-lived state; it is invoked per load/save
//!   and returns immutable result values.
//! - Every successful writable load refreshes the local mirror before
//!   returning, so the local tier tracks the last good remote read.
//! - A first-use empty document is only invented when the remote tier
//!   affirmatively reports all three keys absent, never on fallback.

use crate::model::document::{
    decode_lenient, decode_snapshot, decode_wire, parse_schema_version, Document,
    DocumentValidationError, CURRENT_SCHEMA_VERSION,
};
use crate::storage::local::LocalStore;
use crate::storage::remote::{RemoteError, RemoteStore};
use crate::storage::retry::RetryPolicy;
use crate::storage::{KEY_COMPLETIONS, KEY_FALLBACK_SNAPSHOT, KEY_HABITS, KEY_SCHEMA_VERSION};
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Non-blocking banner shown when data came from the local tier.
pub const CLOUD_UNAVAILABLE_MESSAGE: &str =
    "Sync is temporarily unavailable. Your data is saved on this device.";
/// Non-blocking banner shown when a save did not reach the cloud.
pub const SYNC_ERROR_MESSAGE: &str = "Could not sync the latest changes. Tap retry to try again.";
/// Banner shown while running against data from a newer client version.
pub const NEWER_VERSION_MESSAGE: &str =
    "Data from a newer app version was found. Running in read-only mode.";
/// Blocking message shown when neither tier yields usable data.
pub const LOAD_FAILED_MESSAGE: &str =
    "Could not load your data. Check your connection and try again.";

/// Which tier a loaded document came from, or which tier a save reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Local,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

/// Outcome of one load protocol run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub document: Document,
    pub origin: Origin,
    pub read_only: bool,
    pub warning: Option<String>,
}

/// Outcome of one save protocol run. Never an error: degradation is a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub mode: Origin,
    pub synced: bool,
    pub warning: Option<String>,
}

/// Fatal load failure; the caller must block the main view and offer retry.
#[derive(Debug)]
pub enum LoadError {
    /// Remote data at or below the current version failed validation.
    Corrupted(DocumentValidationError),
    /// Remote unreachable and the local snapshot is absent or invalid.
    NoUsableData {
        remote: RemoteError,
        snapshot: Option<DocumentValidationError>,
    },
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupted(err) => write!(f, "persisted data is corrupted: {err}"),
            Self::NoUsableData { remote, snapshot } => match snapshot {
                Some(err) => write!(
                    f,
                    "no usable data: remote failed ({remote}) and local snapshot is invalid ({err})"
                ),
                None => write!(
                    f,
                    "no usable data: remote failed ({remote}) and no local snapshot exists"
                ),
            },
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Corrupted(err) => Some(err),
            Self::NoUsableData { remote, .. } => Some(remote),
        }
    }
}

/// Serialized forms of one document for both tiers.
struct WirePayload {
    schema_version: String,
    habits: String,
    completions: String,
    snapshot: String,
}

fn encode(document: &Document) -> Result<WirePayload, serde_json::Error> {
    Ok(WirePayload {
        schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        habits: serde_json::to_string(&document.habits)?,
        completions: serde_json::to_string(&document.completions)?,
        snapshot: serde_json::to_string(document)?,
    })
}

/// Stateless coordinator for the load and save protocols.
pub struct Orchestrator<'a, R: RemoteStore, L: LocalStore> {
    remote: &'a R,
    local: &'a L,
    policy: RetryPolicy,
}

impl<'a, R: RemoteStore, L: LocalStore> Orchestrator<'a, R, L> {
    pub fn new(remote: &'a R, local: &'a L) -> Self {
        Self::with_policy(remote, local, RetryPolicy::default())
    }

    pub fn with_policy(remote: &'a R, local: &'a L, policy: RetryPolicy) -> Self {
        Self {
            remote,
            local,
            policy,
        }
    }

    /// Runs the load protocol once.
    ///
    /// Not reentrant by contract: the caller must not issue a second load
    /// while one is in flight.
    ///
    /// # Errors
    /// `LoadError::Corrupted` for invalid writable-version remote data,
    /// `LoadError::NoUsableData` when both tiers fail.
    pub async fn load(&self) -> Result<LoadResult, LoadError> {
        info!("event=load module=storage status=start");
        let keys = [KEY_SCHEMA_VERSION, KEY_HABITS, KEY_COMPLETIONS];

        match self.policy.run("get_many", || self.remote.get_many(&keys)).await {
            Ok(values) => self.interpret_remote(values),
            Err(remote_err) => {
                warn!("event=load module=storage status=remote_failed error={remote_err}");
                self.load_local_fallback(remote_err)
            }
        }
    }

    /// Runs the save protocol once against the given document.
    ///
    /// The local tier is written first and unconditionally; the remote tier
    /// is written as three concurrent single-key writes, each under its own
    /// retry budget. Partial remote writes are not rolled back: the next
    /// full save overwrites all three keys again.
    pub async fn save(&self, document: &Document) -> SaveResult {
        info!("event=save module=storage status=start");

        let payload = match encode(document) {
            Ok(payload) => payload,
            Err(err) => {
                error!("event=save module=storage status=error error_code=encode_failed error={err}");
                return SaveResult {
                    mode: Origin::Local,
                    synced: false,
                    warning: Some(SYNC_ERROR_MESSAGE.to_string()),
                };
            }
        };

        self.write_local_mirror(&payload);

        let (schema, habits, completions) = tokio::join!(
            self.policy.run("set_schema_version", || self
                .remote
                .set_one(KEY_SCHEMA_VERSION, &payload.schema_version)),
            self.policy
                .run("set_habits", || self.remote.set_one(KEY_HABITS, &payload.habits)),
            self.policy.run("set_completions", || self
                .remote
                .set_one(KEY_COMPLETIONS, &payload.completions)),
        );

        let failed: Vec<&RemoteError> = [&schema, &habits, &completions]
            .into_iter()
            .filter_map(|outcome| outcome.as_ref().err())
            .collect();

        if failed.is_empty() {
            info!("event=save module=storage status=ok mode=remote");
            SaveResult {
                mode: Origin::Remote,
                synced: true,
                warning: None,
            }
        } else {
            warn!(
                "event=save module=storage status=degraded mode=local failed_keys={} error={}",
                failed.len(),
                failed[0]
            );
            SaveResult {
                mode: Origin::Local,
                synced: false,
                warning: Some(SYNC_ERROR_MESSAGE.to_string()),
            }
        }
    }

    fn interpret_remote(
        &self,
        values: BTreeMap<String, String>,
    ) -> Result<LoadResult, LoadError> {
        let schema_raw = values.get(KEY_SCHEMA_VERSION);
        let habits_raw = values.get(KEY_HABITS).map(String::as_str);
        let completions_raw = values.get(KEY_COMPLETIONS).map(String::as_str);

        if schema_raw.is_none() && habits_raw.is_none() && completions_raw.is_none() {
            // Legitimate first use: the remote tier reports no keys yet.
            let document = Document::empty();
            self.mirror_document(&document);
            info!("event=load module=storage status=ok origin=remote first_use=true");
            return Ok(LoadResult {
                document,
                origin: Origin::Remote,
                read_only: false,
                warning: None,
            });
        }

        let version = match schema_raw {
            Some(raw) => parse_schema_version(raw).map_err(|err| {
                error!("event=load module=storage status=error error_code=corrupt error={err}");
                LoadError::Corrupted(err)
            })?,
            None => CURRENT_SCHEMA_VERSION,
        };

        if version > CURRENT_SCHEMA_VERSION {
            let document = decode_lenient(habits_raw, completions_raw);
            warn!(
                "event=load module=storage status=ok origin=remote read_only=true remote_version={version} supported={CURRENT_SCHEMA_VERSION}"
            );
            return Ok(LoadResult {
                document,
                origin: Origin::Remote,
                read_only: true,
                warning: Some(NEWER_VERSION_MESSAGE.to_string()),
            });
        }

        let document = decode_wire(habits_raw, completions_raw).map_err(|err| {
            error!("event=load module=storage status=error error_code=corrupt error={err}");
            LoadError::Corrupted(err)
        })?;

        self.mirror_document(&document);
        info!(
            "event=load module=storage status=ok origin=remote habits={} dates={}",
            document.habits.len(),
            document.completions.len()
        );
        Ok(LoadResult {
            document,
            origin: Origin::Remote,
            read_only: false,
            warning: None,
        })
    }

    fn load_local_fallback(&self, remote: RemoteError) -> Result<LoadResult, LoadError> {
        let raw = match self.local.get(KEY_FALLBACK_SNAPSHOT) {
            Some(raw) => raw,
            None => {
                error!("event=load module=storage status=fatal error_code=no_usable_data snapshot=absent");
                return Err(LoadError::NoUsableData {
                    remote,
                    snapshot: None,
                });
            }
        };

        match decode_snapshot(&raw) {
            Ok(mut document) => {
                document.schema_version = CURRENT_SCHEMA_VERSION;
                info!(
                    "event=load module=storage status=ok origin=local habits={}",
                    document.habits.len()
                );
                Ok(LoadResult {
                    document,
                    origin: Origin::Local,
                    read_only: false,
                    warning: Some(CLOUD_UNAVAILABLE_MESSAGE.to_string()),
                })
            }
            Err(err) => {
                error!(
                    "event=load module=storage status=fatal error_code=no_usable_data snapshot=invalid error={err}"
                );
                Err(LoadError::NoUsableData {
                    remote,
                    snapshot: Some(err),
                })
            }
        }
    }

    fn mirror_document(&self, document: &Document) {
        match encode(document) {
            Ok(payload) => self.write_local_mirror(&payload),
            Err(err) => {
                error!("event=local_mirror module=storage status=error error_code=encode_failed error={err}");
            }
        }
    }

    fn write_local_mirror(&self, payload: &WirePayload) {
        self.local.set(KEY_SCHEMA_VERSION, &payload.schema_version);
        self.local.set(KEY_HABITS, &payload.habits);
        self.local.set(KEY_COMPLETIONS, &payload.completions);
        self.local.set(KEY_FALLBACK_SNAPSHOT, &payload.snapshot);
    }
}
