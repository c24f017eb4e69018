//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use warpbar_core::{LoadError, StatusThresholds, UsageSnapshot};
use warpbar_store::LoadState;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the current load state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageOutput>,
    pub is_loading: bool,
    pub retry_attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watch_error: Option<ErrorOutput>,
}

/// Parsed quota.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub requests_used: i64,
    pub requests_limit: i64,
    pub remaining: i64,
    pub used_percent: f64,
    pub is_unlimited: bool,
    pub tier: String,
    pub plan: String,
    pub status: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub next_refresh_time: DateTime<Utc>,
}

/// A published failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub kind: String,
    pub message: String,
}

/// One candidate preferences file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOutput {
    pub name: String,
    pub path: String,
    pub exists: bool,
}

/// Locate command output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateOutput {
    pub directory: String,
    pub candidates: Vec<CandidateOutput>,
    pub selected: Option<String>,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339())
}

#[allow(clippy::ref_option)]
fn serialize_datetime_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
    thresholds: StatusThresholds,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self {
            pretty,
            thresholds: StatusThresholds::default(),
        }
    }

    /// Classifies status with custom thresholds.
    pub fn with_thresholds(mut self, thresholds: StatusThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the load state.
    pub fn format_state(&self, state: &LoadState) -> Result<String> {
        self.format(&self.state_to_output(state))
    }

    /// Converts a load state to output.
    pub fn state_to_output(&self, state: &LoadState) -> StatusOutput {
        StatusOutput {
            source_path: state.source_path.as_ref().map(|p| p.display().to_string()),
            usage: state.snapshot.as_ref().map(|s| self.snapshot_to_output(s)),
            is_loading: state.is_loading,
            retry_attempt: state.retry_attempt,
            last_update_time: state.last_update_time,
            error: state.last_error.as_ref().map(error_to_output),
            watch_error: state.watch_error.as_ref().map(error_to_output),
        }
    }

    fn snapshot_to_output(&self, snapshot: &UsageSnapshot) -> UsageOutput {
        UsageOutput {
            requests_used: snapshot.requests_used,
            requests_limit: snapshot.requests_limit,
            remaining: snapshot.remaining(),
            used_percent: snapshot.usage_ratio() * 100.0,
            is_unlimited: snapshot.is_unlimited,
            tier: snapshot.subscription_tier.to_string().to_lowercase(),
            plan: snapshot.plan_display_name().to_string(),
            status: snapshot.status_with(&self.thresholds).to_string(),
            next_refresh_time: snapshot.next_refresh_time,
        }
    }
}

fn error_to_output(error: &LoadError) -> ErrorOutput {
    ErrorOutput {
        kind: error.kind.as_str().to_string(),
        message: error.message.clone(),
    }
}
