mod support;

use habitloop_core::storage::{
    KEY_COMPLETIONS, KEY_FALLBACK_SNAPSHOT, KEY_HABITS, KEY_SCHEMA_VERSION,
};
use habitloop_core::{Document, LocalStore, Orchestrator, Origin, SqliteLocalStore};
use support::{habit_with_id, habits_json, MockRemote};

fn sample_document() -> Document {
    let mut document = Document::empty();
    document.habits.push(habit_with_id("a", "Drink water", 1));
    document.toggle_completion("2024-01-10", "a");
    document
}

#[tokio::test]
async fn successful_save_writes_both_tiers() {
    let remote = MockRemote::new();
    let local = SqliteLocalStore::in_memory().unwrap();
    let document = sample_document();

    let result = Orchestrator::new(&remote, &local).save(&document).await;

    assert!(result.synced);
    assert_eq!(result.mode, Origin::Remote);
    assert!(result.warning.is_none());

    assert_eq!(remote.value(KEY_SCHEMA_VERSION).as_deref(), Some("1"));
    assert_eq!(
        remote.value(KEY_HABITS).as_deref(),
        Some(habits_json(&document.habits).as_str())
    );
    assert_eq!(
        remote.value(KEY_COMPLETIONS).as_deref(),
        Some(r#"{"2024-01-10":["a"]}"#)
    );

    assert_eq!(local.get(KEY_SCHEMA_VERSION).as_deref(), Some("1"));
    assert_eq!(
        local.get(KEY_FALLBACK_SNAPSHOT).as_deref(),
        Some(serde_json::to_string(&document).unwrap().as_str())
    );
}

#[tokio::test(start_paused = true)]
async fn one_failed_key_degrades_save_but_keeps_local_copy() {
    let remote = MockRemote::new();
    remote.refuse_key(KEY_COMPLETIONS);
    let local = SqliteLocalStore::in_memory().unwrap();
    let document = sample_document();

    let result = Orchestrator::new(&remote, &local).save(&document).await;

    assert!(!result.synced);
    assert_eq!(result.mode, Origin::Local);
    let warning = result.warning.expect("sync warning expected");
    assert!(warning.contains("Could not sync"));

    // The local tier already reflects the mutation despite the failure.
    assert_eq!(
        local.get(KEY_FALLBACK_SNAPSHOT).as_deref(),
        Some(serde_json::to_string(&document).unwrap().as_str())
    );
    // Partial remote writes are left in place, not rolled back.
    assert_eq!(remote.value(KEY_SCHEMA_VERSION).as_deref(), Some("1"));
    assert!(remote.value(KEY_COMPLETIONS).is_none());
}

#[tokio::test(start_paused = true)]
async fn each_remote_key_has_its_own_retry_budget() {
    let remote = MockRemote::new();
    remote.refuse_key(KEY_HABITS);
    let local = SqliteLocalStore::in_memory().unwrap();
    let document = sample_document();

    let result = Orchestrator::new(&remote, &local).save(&document).await;

    assert!(!result.synced);
    assert_eq!(remote.set_attempts_for(KEY_HABITS), 3);
    assert_eq!(remote.set_attempts_for(KEY_SCHEMA_VERSION), 1);
    assert_eq!(remote.set_attempts_for(KEY_COMPLETIONS), 1);
}

#[tokio::test]
async fn next_full_save_overwrites_all_three_keys() {
    let remote = MockRemote::new();
    remote.refuse_key(KEY_COMPLETIONS);
    let local = SqliteLocalStore::in_memory().unwrap();
    let mut document = sample_document();

    // Degrade once, heal, then save the evolved document.
    tokio::time::pause();
    let degraded = Orchestrator::new(&remote, &local).save(&document).await;
    assert!(!degraded.synced);
    tokio::time::resume();

    remote.heal();
    document.toggle_completion("2024-01-11", "a");
    let result = Orchestrator::new(&remote, &local).save(&document).await;

    assert!(result.synced);
    assert_eq!(
        remote.value(KEY_COMPLETIONS).as_deref(),
        Some(serde_json::to_string(&document.completions).unwrap().as_str())
    );
}
