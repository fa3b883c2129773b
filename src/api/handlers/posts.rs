//! Post handlers: replicated batch write and existence lookup.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{ExistsResponse, WritePostsRequest, WritePostsResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, ReplicaError};

/// `POST /posts` — Write a batch of posts to every backend.
///
/// # Errors
///
/// Returns [`ReplicaError::InvalidRequest`] for an oversized batch or a
/// post without `guid`, and [`ReplicaError::AllBackendsFailed`] if no
/// backend applied the batch.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    tag = "Posts",
    summary = "Write a batch of posts",
    description = "Inserts the posts into every backend concurrently, skipping guids a backend already holds. Succeeds if at least one backend applied the whole batch.",
    request_body = WritePostsRequest,
    responses(
        (status = 200, description = "Batch applied on at least one backend", body = WritePostsResponse),
        (status = 400, description = "Invalid batch", body = ErrorResponse),
        (status = 503, description = "Every backend failed", body = ErrorResponse),
    )
)]
pub async fn write_posts(
    State(state): State<AppState>,
    Json(req): Json<WritePostsRequest>,
) -> Result<impl IntoResponse, ReplicaError> {
    validate_batch(&req, state.max_batch_size)?;

    let received = req.posts.len();
    let report = state.replica_service.write_batch(&req.posts).await?;

    Ok(Json(WritePostsResponse::from_report(report, received)))
}

/// `GET /posts/{guid}/exists` — Check whether any backend holds a post.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{guid}/exists",
    tag = "Posts",
    summary = "Check post existence",
    description = "Looks the guid up on the primary backend, then on each fallback in registration order, stopping at the first match.",
    params(
        ("guid" = String, Path, description = "Post guid (URL-encoded)"),
    ),
    responses(
        (status = 200, description = "Lookup result", body = ExistsResponse),
    )
)]
pub async fn post_exists(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> impl IntoResponse {
    let resolution = state.replica_service.resolve(&guid).await;
    Json(ExistsResponse {
        exists: resolution.exists(),
        guid,
        answered_by: resolution.found_in,
        unavailable: resolution.failed,
    })
}

/// Post routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(write_posts))
        .route("/posts/{guid}/exists", get(post_exists))
}

fn validate_batch(req: &WritePostsRequest, max_batch_size: usize) -> Result<(), ReplicaError> {
    if req.posts.len() > max_batch_size {
        return Err(ReplicaError::InvalidRequest(format!(
            "batch of {} posts exceeds the limit of {max_batch_size}",
            req.posts.len()
        )));
    }
    if let Some(idx) = req.posts.iter().position(|p| !p.has_guid()) {
        return Err(ReplicaError::InvalidRequest(format!(
            "post at index {idx} has an empty guid"
        )));
    }
    Ok(())
}
