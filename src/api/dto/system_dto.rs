//! Health and statistics DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{HealthEntry, StatsSnapshot};

/// Overall state of the replica set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaSetStatus {
    /// Every backend answered.
    Healthy,
    /// Some backends answered.
    Degraded,
    /// No backend answered.
    Unhealthy,
}

impl ReplicaSetStatus {
    /// Derives the set status from per-backend health check results.
    #[must_use]
    pub fn from_entries(entries: &[HealthEntry]) -> Self {
        let connected = entries.iter().filter(|e| e.connected).count();
        if connected == 0 {
            Self::Unhealthy
        } else if connected == entries.len() {
            Self::Healthy
        } else {
            Self::Degraded
        }
    }
}

/// Response body for `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status.
    pub status: ReplicaSetStatus,
    /// Probe time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Service version.
    pub version: String,
    /// Per-backend connectivity, registry order.
    pub backends: Vec<HealthEntry>,
}

/// Response body for `GET /stats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Collection time (RFC 3339).
    pub timestamp: DateTime<Utc>,
    /// Per-backend statistics, registry order.
    pub backends: Vec<StatsSnapshot>,
}
