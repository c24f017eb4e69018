//! End-to-end tests: locate a preferences file, then load it with retries.

use std::path::Path;
use std::sync::Arc;

use warpbar_core::SubscriptionTier;
use warpbar_fetch::{
    FALLBACK_LIMIT_INFO_KEY, FetchError, LIMIT_INFO_KEY, PlistLocator, PlistSource,
    RetryStrategy, RetryingLoader, UsageSnapshotParser,
};

fn write_prefs(path: &Path, key: &str, payload: &str, binary: bool) {
    let mut dict = plist::Dictionary::new();
    dict.insert(key.to_string(), plist::Value::String(payload.to_string()));
    dict.insert("Theme".to_string(), plist::Value::String("Dracula".to_string()));
    let value = plist::Value::Dictionary(dict);
    if binary {
        value.to_file_binary(path).unwrap();
    } else {
        value.to_file_xml(path).unwrap();
    }
}

fn candidates() -> Vec<String> {
    warpbar_fetch::DEFAULT_CANDIDATES
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

#[tokio::test]
async fn test_locate_and_load_beta_channel() {
    let dir = tempfile::tempdir().unwrap();
    write_prefs(
        &dir.path().join("dev.warp.Warp-Beta.plist"),
        LIMIT_INFO_KEY,
        r#"{"num_requests_used_since_refresh": 42, "limit": 150, "is_unlimited": false,
            "next_refresh_time": "2025-02-01T08:00:00.123Z"}"#,
        true,
    );
    write_prefs(
        &dir.path().join("dev.warp.Warp.plist"),
        LIMIT_INFO_KEY,
        r#"{"limit": 9999}"#,
        false,
    );

    let path = PlistLocator::new(dir.path(), candidates()).locate();
    assert_eq!(path, Some(dir.path().join("dev.warp.Warp-Beta.plist")));

    let source = Arc::new(PlistSource::new(path, UsageSnapshotParser::default()));
    let snapshot = RetryingLoader::new(source, RetryStrategy::no_retry())
        .load()
        .await
        .unwrap();

    assert_eq!(snapshot.requests_used, 42);
    assert_eq!(snapshot.requests_limit, 150);
    assert_eq!(snapshot.subscription_tier, SubscriptionTier::Free);
}

#[tokio::test]
async fn test_fallback_key_in_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dev.warp.Warp-Stable.plist");
    write_prefs(
        &path,
        FALLBACK_LIMIT_INFO_KEY,
        r#"{"num_requests_used_since_refresh": 5, "limit": 2500, "is_unlimited": true}"#,
        false,
    );

    let snapshot = UsageSnapshotParser::default().parse_file(&path).unwrap();
    assert!(snapshot.is_unlimited);
    assert_eq!(snapshot.subscription_tier, SubscriptionTier::Pro);
}

#[tokio::test]
async fn test_malformed_payload_exhausts_retries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dev.warp.Warp-Stable.plist");
    write_prefs(&path, LIMIT_INFO_KEY, "{not json", false);

    let source = Arc::new(PlistSource::new(Some(path), UsageSnapshotParser::default()));
    let strategy = RetryStrategy::new(2).with_base_delay(std::time::Duration::from_millis(1));
    let err = RetryingLoader::new(source, strategy).load().await.unwrap_err();

    match err {
        FetchError::RetriesExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("Unable to parse Warp usage data"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
