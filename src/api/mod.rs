//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Post endpoints are mounted under `/api/v1`; health and statistics live
//! at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "feed-replica", description = "Replicated feed post storage"),
    paths(
        handlers::posts::write_posts,
        handlers::posts::post_exists,
        handlers::system::health_handler,
        handlers::system::stats_handler,
    ),
    components(schemas(
        crate::domain::Post,
        crate::domain::BackendOutcome,
        crate::domain::HealthEntry,
        crate::domain::StatsSnapshot,
        crate::domain::BackendStatus,
        dto::WritePostsRequest,
        dto::WritePostsResponse,
        dto::ExistsResponse,
        dto::HealthResponse,
        dto::StatsResponse,
        dto::ReplicaSetStatus,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Posts", description = "Replicated post writes and lookups"),
        (name = "System", description = "Replica health and statistics"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in ["/api/v1/posts", "/api/v1/posts/{guid}/exists", "/health", "/stats"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
