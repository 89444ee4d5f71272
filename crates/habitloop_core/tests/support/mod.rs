#![allow(dead_code)]

//! Shared test doubles for the storage integration tests.

use async_trait::async_trait;
use habitloop_core::{Habit, RemoteError, RemoteStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Configurable in-memory stand-in for the cloud key-value service.
#[derive(Default)]
pub struct MockRemote {
    values: Mutex<BTreeMap<String, String>>,
    reads_fail: AtomicBool,
    failing_keys: Mutex<BTreeSet<String>>,
    get_attempts: AtomicU32,
    set_attempts: Mutex<BTreeMap<String, u32>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(entries: &[(&str, &str)]) -> Self {
        let remote = Self::new();
        for (key, value) in entries {
            remote.seed(key, value);
        }
        remote
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("mock values lock")
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().expect("mock values lock").get(key).cloned()
    }

    /// Makes every `get_many` call fail until healed.
    pub fn refuse_reads(&self) {
        self.reads_fail.store(true, Ordering::SeqCst);
    }

    /// Makes `set_one` for `key` fail until healed.
    pub fn refuse_key(&self, key: &str) {
        self.failing_keys
            .lock()
            .expect("mock failing keys lock")
            .insert(key.to_string());
    }

    /// Clears all injected failures.
    pub fn heal(&self) {
        self.reads_fail.store(false, Ordering::SeqCst);
        self.failing_keys
            .lock()
            .expect("mock failing keys lock")
            .clear();
    }

    pub fn get_attempts(&self) -> u32 {
        self.get_attempts.load(Ordering::SeqCst)
    }

    pub fn set_attempts_for(&self, key: &str) -> u32 {
        self.set_attempts
            .lock()
            .expect("mock set attempts lock")
            .get(key)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, RemoteError> {
        self.get_attempts.fetch_add(1, Ordering::SeqCst);
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("mock remote is down".to_string()));
        }
        let values = self.values.lock().expect("mock values lock");
        Ok(keys
            .iter()
            .filter_map(|key| {
                values
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect())
    }

    async fn set_one(&self, key: &str, value: &str) -> Result<(), RemoteError> {
        *self
            .set_attempts
            .lock()
            .expect("mock set attempts lock")
            .entry(key.to_string())
            .or_insert(0) += 1;
        let failing = self
            .failing_keys
            .lock()
            .expect("mock failing keys lock")
            .contains(key);
        if failing {
            return Err(RemoteError::Rejected(format!("mock rejects key {key}")));
        }
        self.values
            .lock()
            .expect("mock values lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A habit record with a deterministic id, valid for wire seeding.
pub fn habit_with_id(id: &str, title: &str, order: i64) -> Habit {
    let mut habit = Habit::new(title, order);
    habit.id = id.to_string();
    habit
}

/// Serializes habits the way the wire `habits_v1` key stores them.
pub fn habits_json(habits: &[Habit]) -> String {
    serde_json::to_string(habits).expect("habits serialize")
}
