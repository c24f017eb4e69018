//! Warp preferences parser.
//!
//! Warp stores its AI quota as a JSON document serialized into a string
//! value of its preferences property list, so decoding happens twice: plist
//! to dictionary, then string to JSON object.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use warpbar_core::{SubscriptionClassifier, TierThresholds, UsageSnapshot};

use crate::error::FetchError;

/// Preferences key holding the usage payload.
pub const LIMIT_INFO_KEY: &str = "AIRequestLimitInfo";
/// Older preferences key, read when [`LIMIT_INFO_KEY`] is absent.
pub const FALLBACK_LIMIT_INFO_KEY: &str = "AIAssistantRequestLimitInfo";

// ============================================================================
// Limit Info Payload
// ============================================================================

/// Typed view of the decoded usage payload.
///
/// Every field is lenient: a missing value or one of the wrong type takes
/// the default named on the field rather than failing the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitInfo {
    /// `num_requests_used_since_refresh`, default 0.
    pub requests_used: i64,
    /// `limit`, default 0.
    pub limit: i64,
    /// `is_unlimited`, default false.
    pub is_unlimited: bool,
    /// `next_refresh_time`, `None` when missing or unparseable.
    pub next_refresh_time: Option<DateTime<Utc>>,
}

impl LimitInfo {
    /// Extracts the fields from a decoded payload.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let requests_used = map
            .get("num_requests_used_since_refresh")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let limit = map.get("limit").and_then(Value::as_i64).unwrap_or(0);
        let is_unlimited = map
            .get("is_unlimited")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let next_refresh_time = map
            .get("next_refresh_time")
            .and_then(Value::as_str)
            .and_then(parse_refresh_time);

        Self {
            requests_used,
            limit,
            is_unlimited,
            next_refresh_time,
        }
    }
}

/// Parses an ISO-8601 timestamp, with or without fractional seconds.
pub fn parse_refresh_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!(value = raw, error = %e, "Unparseable next_refresh_time");
            None
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Turns a preferences file into a [`UsageSnapshot`].
///
/// Stateless apart from the classifier thresholds; every call reads the file
/// afresh.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshotParser {
    classifier: SubscriptionClassifier,
}

impl UsageSnapshotParser {
    /// Creates a parser with custom tier thresholds.
    pub fn new(thresholds: TierThresholds) -> Self {
        Self {
            classifier: SubscriptionClassifier::new(thresholds),
        }
    }

    /// Reads and parses a preferences file.
    ///
    /// # Errors
    ///
    /// `SourceNotFound` when the file is missing or is not a dictionary
    /// plist, `MalformedPayload` when the usage field is absent or not JSON.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn parse_file(&self, path: &Path) -> Result<UsageSnapshot, FetchError> {
        let value = plist::Value::from_file(path).map_err(|e| {
            debug!(error = %e, "Failed to read preferences plist");
            FetchError::SourceNotFound(format!("{}: {e}", path.display()))
        })?;

        let dict = value.into_dictionary().ok_or_else(|| {
            FetchError::SourceNotFound(format!("{} is not a dictionary", path.display()))
        })?;

        self.parse_preferences(&dict)
    }

    /// Parses an already decoded preferences dictionary.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` when neither usage key holds a JSON object string.
    pub fn parse_preferences(&self, dict: &plist::Dictionary) -> Result<UsageSnapshot, FetchError> {
        let raw = [LIMIT_INFO_KEY, FALLBACK_LIMIT_INFO_KEY]
            .iter()
            .find_map(|key| {
                let found = dict.get(key).and_then(plist::Value::as_string);
                if found.is_some() {
                    debug!(key = *key, "Using usage payload key");
                }
                found
            })
            .ok_or_else(|| {
                FetchError::MalformedPayload(format!(
                    "neither {LIMIT_INFO_KEY} nor {FALLBACK_LIMIT_INFO_KEY} is present"
                ))
            })?;

        self.parse_limit_info(raw)
    }

    /// Parses the JSON usage payload.
    ///
    /// # Errors
    ///
    /// `MalformedPayload` when the string is not a JSON object.
    pub fn parse_limit_info(&self, raw: &str) -> Result<UsageSnapshot, FetchError> {
        let map: Map<String, Value> = serde_json::from_str(raw).map_err(|e| {
            warn!(error = %e, "Failed to decode usage payload JSON");
            FetchError::MalformedPayload(format!("invalid JSON: {e}"))
        })?;

        let info = LimitInfo::from_map(&map);
        let tier = self
            .classifier
            .classify(&map, info.limit, info.is_unlimited);

        debug!(
            used = info.requests_used,
            limit = info.limit,
            unlimited = info.is_unlimited,
            tier = %tier,
            "Parsed usage payload"
        );

        Ok(UsageSnapshot::new(
            info.requests_used,
            info.limit,
            info.next_refresh_time.unwrap_or_else(Utc::now),
            info.is_unlimited,
            tier,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use warpbar_core::SubscriptionTier;

    const PAYLOAD: &str = r#"{
        "num_requests_used_since_refresh": 150,
        "limit": 2500,
        "is_unlimited": false,
        "voice_request_limit": 999999,
        "max_codebase_indices": 50,
        "next_refresh_time": "2024-01-01T00:00:00.000Z"
    }"#;

    fn dict(entries: &[(&str, plist::Value)]) -> plist::Dictionary {
        let mut dict = plist::Dictionary::new();
        for (k, v) in entries {
            dict.insert((*k).to_string(), v.clone());
        }
        dict
    }

    #[test]
    fn test_parse_full_payload() {
        let snapshot = UsageSnapshotParser::default().parse_limit_info(PAYLOAD).unwrap();
        assert_eq!(snapshot.requests_used, 150);
        assert_eq!(snapshot.requests_limit, 2500);
        assert!(!snapshot.is_unlimited);
        assert_eq!(snapshot.subscription_tier, SubscriptionTier::Pro);
        assert_eq!(
            snapshot.next_refresh_time,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let snapshot = UsageSnapshotParser::default().parse_limit_info("{}").unwrap();
        assert_eq!(snapshot.requests_used, 0);
        assert_eq!(snapshot.requests_limit, 0);
        assert!(!snapshot.is_unlimited);
        assert_eq!(snapshot.subscription_tier, SubscriptionTier::Free);
    }

    #[test]
    fn test_wrong_types_take_defaults() {
        let raw = r#"{"num_requests_used_since_refresh": "ten", "limit": 1.5, "is_unlimited": 1}"#;
        let info = LimitInfo::from_map(&serde_json::from_str(raw).unwrap());
        assert_eq!(info.requests_used, 0);
        assert_eq!(info.limit, 0);
        assert!(!info.is_unlimited);
    }

    #[test]
    fn test_unparseable_refresh_time_is_now() {
        let raw = r#"{"limit": 100, "next_refresh_time": "next tuesday"}"#;
        let before = Utc::now();
        let snapshot = UsageSnapshotParser::default().parse_limit_info(raw).unwrap();
        let after = Utc::now();
        assert!(snapshot.next_refresh_time >= before);
        assert!(snapshot.next_refresh_time <= after);
    }

    #[test]
    fn test_refresh_time_without_fraction() {
        let parsed = parse_refresh_time("2024-03-05T10:20:30Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap());
        assert!(parse_refresh_time("2024-03-05").is_none());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = UsageSnapshotParser::default()
            .parse_limit_info("not json")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));

        let err = UsageSnapshotParser::default()
            .parse_limit_info("[1, 2, 3]")
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));
    }

    #[test]
    fn test_fallback_key_used_when_primary_absent() {
        let prefs = dict(&[(
            FALLBACK_LIMIT_INFO_KEY,
            plist::Value::String(r#"{"num_requests_used_since_refresh": 7, "limit": 200}"#.into()),
        )]);
        let snapshot = UsageSnapshotParser::default().parse_preferences(&prefs).unwrap();
        assert_eq!(snapshot.requests_used, 7);
        assert_eq!(snapshot.subscription_tier, SubscriptionTier::Basic);
    }

    #[test]
    fn test_primary_key_preferred() {
        let prefs = dict(&[
            (LIMIT_INFO_KEY, plist::Value::String(r#"{"limit": 3000}"#.into())),
            (FALLBACK_LIMIT_INFO_KEY, plist::Value::String(r#"{"limit": 100}"#.into())),
        ]);
        let snapshot = UsageSnapshotParser::default().parse_preferences(&prefs).unwrap();
        assert_eq!(snapshot.requests_limit, 3000);
    }

    #[test]
    fn test_non_string_primary_falls_back() {
        let prefs = dict(&[
            (LIMIT_INFO_KEY, plist::Value::from(5_i64)),
            (FALLBACK_LIMIT_INFO_KEY, plist::Value::String(r#"{"limit": 100}"#.into())),
        ]);
        let snapshot = UsageSnapshotParser::default().parse_preferences(&prefs).unwrap();
        assert_eq!(snapshot.requests_limit, 100);
    }

    #[test]
    fn test_missing_keys_is_malformed() {
        let prefs = dict(&[("SomethingElse", plist::Value::Boolean(true))]);
        let err = UsageSnapshotParser::default()
            .parse_preferences(&prefs)
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedPayload(_)));
    }

    #[test]
    fn test_parse_file_roundtrip_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.warp.Warp-Stable.plist");
        let prefs = dict(&[(LIMIT_INFO_KEY, plist::Value::String(PAYLOAD.into()))]);
        plist::Value::Dictionary(prefs).to_file_xml(&path).unwrap();

        let snapshot = UsageSnapshotParser::default().parse_file(&path).unwrap();
        assert_eq!(snapshot.requests_used, 150);
        assert_eq!(snapshot.requests_limit, 2500);
        assert!(!snapshot.is_unlimited);
    }

    #[test]
    fn test_parse_missing_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = UsageSnapshotParser::default()
            .parse_file(&dir.path().join("missing.plist"))
            .unwrap_err();
        assert!(matches!(err, FetchError::SourceNotFound(_)));
    }

    #[test]
    fn test_parse_garbage_file_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.plist");
        std::fs::write(&path, b"\x00\x01 definitely not a plist").unwrap();
        let err = UsageSnapshotParser::default().parse_file(&path).unwrap_err();
        assert!(matches!(err, FetchError::SourceNotFound(_)));
    }
}
