//! Post write and lookup DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{BackendOutcome, BatchReport, Post};

/// Request body for `POST /posts`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WritePostsRequest {
    /// Posts to persist, in the order they should be inserted.
    pub posts: Vec<Post>,
}

/// Response body for `POST /posts`.
#[derive(Debug, Serialize, ToSchema)]
pub struct WritePostsResponse {
    /// Correlation ID of the batch.
    pub batch_id: Uuid,
    /// Number of posts received.
    pub received: usize,
    /// Backends that applied the batch.
    pub succeeded: usize,
    /// Backends that failed.
    pub failed: usize,
    /// Per-backend detail, registry order.
    pub outcomes: Vec<BackendOutcome>,
}

impl WritePostsResponse {
    /// Builds the response for a batch of `received` posts.
    #[must_use]
    pub fn from_report(report: BatchReport, received: usize) -> Self {
        Self {
            batch_id: report.batch_id,
            received,
            succeeded: report.succeeded(),
            failed: report.failed(),
            outcomes: report.outcomes,
        }
    }
}

/// Response body for `GET /posts/{guid}/exists`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    /// The guid that was looked up.
    pub guid: String,
    /// Whether any backend holds the post.
    pub exists: bool,
    /// Backend that reported the match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answered_by: Option<String>,
    /// Backends whose lookup failed.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<String>,
}
