//! Remote key-value store contract.
//!
//! # Responsibility
//! - Define the async capability the cloud tier must provide.
//!
//! # Invariants
//! - Implementations carry no timeout of their own; the caller wraps every
//!   invocation in the retry/timeout policy.
//! - Absent keys are simply missing from a `get_many` result, not an error.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use tokio::time::error::Elapsed;

/// Failure surfaced by the remote tier or the policy wrapping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport could not reach the service.
    Unavailable(String),
    /// The service answered with a rejection.
    Rejected(String),
    /// One attempt exceeded the per-attempt time limit.
    Timeout,
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(details) => write!(f, "remote store unavailable: {details}"),
            Self::Rejected(details) => write!(f, "remote store rejected the request: {details}"),
            Self::Timeout => write!(f, "remote store attempt timed out"),
        }
    }
}

impl Error for RemoteError {}

impl From<Elapsed> for RemoteError {
    fn from(_: Elapsed) -> Self {
        Self::Timeout
    }
}

/// Async capability over the external cloud key-value service.
///
/// Implementations may fail at any time, including mid-flight with no
/// response; callers must treat every invocation as fallible and slow.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads several keys at once. Absent keys are omitted from the result.
    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, RemoteError>;

    /// Writes a single key.
    async fn set_one(&self, key: &str, value: &str) -> Result<(), RemoteError>;
}

#[async_trait]
impl<'a, T: RemoteStore + ?Sized> RemoteStore for &'a T {
    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, RemoteError> {
        (**self).get_many(keys).await
    }

    async fn set_one(&self, key: &str, value: &str) -> Result<(), RemoteError> {
        (**self).set_one(key, value).await
    }
}
