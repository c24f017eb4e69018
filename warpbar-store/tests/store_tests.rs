//! Store behavior against real preference files on disk.

use std::path::Path;
use std::time::Duration;

use warpbar_core::{ErrorKind, SubscriptionTier};
use warpbar_store::{LoadState, Settings, SettingsStore, UsageStateStore};

const WAIT: Duration = Duration::from_secs(10);

fn write_usage(path: &Path, used: i64, limit: i64) {
    let payload = format!(
        r#"{{"num_requests_used_since_refresh": {used}, "limit": {limit}, "is_unlimited": false,
            "next_refresh_time": "2025-03-01T00:00:00Z"}}"#
    );
    let mut dict = plist::Dictionary::new();
    dict.insert(
        "AIRequestLimitInfo".to_string(),
        plist::Value::String(payload),
    );
    plist::Value::Dictionary(dict).to_file_xml(path).unwrap();
}

fn settings_for(dir: &Path) -> Settings {
    Settings {
        preferences_dir: Some(dir.to_path_buf()),
        base_delay_ms: 10,
        ..Settings::default()
    }
}

async fn wait_until(
    store: &UsageStateStore,
    predicate: impl FnMut(&LoadState) -> bool,
) -> LoadState {
    let mut rx = store.subscribe();
    let state = tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("store closed");
    state.clone()
}

#[tokio::test]
async fn test_load_from_located_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dev.warp.Warp-Stable.plist");
    write_usage(&path, 2300, 2500);

    let store = UsageStateStore::from_settings(&settings_for(dir.path()));
    assert_eq!(store.state().source_path, Some(path));

    store.load(true).unwrap();
    let state = wait_until(&store, |s| s.snapshot.is_some()).await;

    let snapshot = state.snapshot.unwrap();
    assert_eq!(snapshot.requests_used, 2300);
    assert_eq!(snapshot.subscription_tier, SubscriptionTier::Standard);
    assert!(state.watch_error.is_none());

    store.shutdown().await;
}

#[tokio::test]
async fn test_missing_file_reports_exhaustion() {
    let dir = tempfile::tempdir().unwrap();
    let store = UsageStateStore::from_settings(&settings_for(dir.path()));

    assert!(store.state().source_path.is_none());

    store.load(true).unwrap();
    let state = wait_until(&store, |s| s.last_error.is_some()).await;

    let error = state.last_error.unwrap();
    assert_eq!(error.kind, ErrorKind::RetriesExhausted);
    assert!(error.message.contains("not found"));
    assert!(state.snapshot.is_none());
}

#[tokio::test]
async fn test_file_write_triggers_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dev.warp.Warp-Stable.plist");
    write_usage(&path, 1, 150);

    let store = UsageStateStore::from_settings(&settings_for(dir.path()));
    store.load(true).unwrap();
    wait_until(&store, |s| s.snapshot.is_some()).await;

    // Same second as the first write; the event forces the read regardless of mtime.
    write_usage(&path, 2, 150);

    let state = wait_until(&store, |s| {
        s.snapshot.as_ref().is_some_and(|snap| snap.requests_used == 2)
    })
    .await;
    assert!(state.last_error.is_none());

    store.shutdown().await;
}

#[tokio::test]
async fn test_store_built_from_saved_settings() {
    let dir = tempfile::tempdir().unwrap();
    let prefs = dir.path().join("prefs");
    std::fs::create_dir(&prefs).unwrap();
    write_usage(&prefs.join("custom.plist"), 10, 150);

    let settings_path = dir.path().join("settings.json");
    let settings_store = SettingsStore::new(settings_path.clone());
    settings_store
        .update(|s| {
            s.preferences_dir = Some(prefs.clone());
            s.candidates = vec!["custom.plist".to_string()];
            s.watch_file = false;
        })
        .await;
    settings_store.save().await.unwrap();

    let settings = SettingsStore::load(settings_path).await.unwrap().get().await;
    let store = UsageStateStore::from_settings(&settings);
    store.load(false).unwrap();
    let state = wait_until(&store, |s| s.snapshot.is_some()).await;

    assert_eq!(state.snapshot.unwrap().requests_used, 10);
}
