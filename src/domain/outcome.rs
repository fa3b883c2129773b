//! Per-backend results of fan-out operations.
//!
//! Every fan-out produces exactly one entry per registered backend, in
//! registry order. Failures are carried as data, never as errors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::BackendFailure;

/// Result of writing one batch to one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BackendOutcome {
    /// Backend name.
    pub name: String,
    /// `true` if the whole batch was applied without a fatal error.
    pub success: bool,
    /// Rows actually inserted; duplicates of an existing `guid` are not counted.
    pub inserted: u64,
    /// Error text when `success` is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendOutcome {
    /// Outcome of a backend that applied the batch.
    #[must_use]
    pub fn succeeded(name: &str, inserted: u64) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            inserted,
            error: None,
        }
    }

    /// Outcome of a backend that failed part-way or before starting.
    #[must_use]
    pub fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            inserted: 0,
            error: Some(error),
        }
    }
}

/// Aggregate of a replicated batch write.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchReport {
    /// Correlation ID used in the logs of this batch.
    pub batch_id: Uuid,
    /// One outcome per backend, registry order.
    pub outcomes: Vec<BackendOutcome>,
}

impl BatchReport {
    /// Number of backends that applied the batch.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Number of backends that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Returns the outcome recorded for `name`, if any.
    #[must_use]
    pub fn outcome(&self, name: &str) -> Option<&BackendOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// Failures in the shape used by aggregate errors.
    #[must_use]
    pub fn failures(&self) -> Vec<BackendFailure> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| BackendFailure {
                backend: o.name.clone(),
                message: o.error.clone().unwrap_or_default(),
            })
            .collect()
    }
}

/// Connectivity of one backend as seen by a liveness query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct HealthEntry {
    /// Backend name.
    pub name: String,
    /// Whether the liveness query round-tripped.
    pub connected: bool,
    /// Error text when not connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status of a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    /// Statistics were collected.
    Healthy,
    /// The backend could not be queried.
    Error,
}

/// Row statistics of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    /// Backend name.
    pub name: String,
    /// Number of stored posts, `-1` when the backend could not be queried.
    pub total_posts: i64,
    /// Creation time of the most recent post.
    pub latest_post: Option<DateTime<Utc>>,
    /// Whether the numbers above are real.
    pub status: BackendStatus,
    /// Error text when `status` is [`BackendStatus::Error`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsSnapshot {
    /// Sentinel snapshot for a backend whose statistics query failed.
    #[must_use]
    pub fn unavailable(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            total_posts: -1,
            latest_post: None,
            status: BackendStatus::Error,
            error: Some(error),
        }
    }
}

/// How an existence check was answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadResolution {
    /// Backend that reported the match, `None` if nobody did.
    pub found_in: Option<String>,
    /// Backends whose query failed during the scan.
    pub failed: Vec<String>,
}

impl ReadResolution {
    /// `true` if any backend reported a match.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.found_in.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_and_failures() {
        let report = BatchReport {
            batch_id: Uuid::new_v4(),
            outcomes: vec![
                BackendOutcome::succeeded("primary", 3),
                BackendOutcome::failed("replica", "connection refused".to_string()),
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.failures(),
            vec![BackendFailure {
                backend: "replica".to_string(),
                message: "connection refused".to_string(),
            }]
        );
        assert_eq!(report.outcome("primary").map(|o| o.inserted), Some(3));
    }

    #[test]
    fn sentinel_snapshot_serializes_as_error() {
        let snapshot = StatsSnapshot::unavailable("replica", "timeout".to_string());
        let json = serde_json::to_value(&snapshot).unwrap_or_default();
        assert_eq!(json["totalPosts"], -1);
        assert_eq!(json["status"], "error");
        assert!(json["latestPost"].is_null());
    }

    #[test]
    fn healthy_outcome_omits_error_field() {
        let json = serde_json::to_value(BackendOutcome::succeeded("p", 0)).unwrap_or_default();
        assert!(json.get("error").is_none());
    }
}
