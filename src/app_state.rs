//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::ReplicaService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Replica service for all backend operations.
    pub replica_service: Arc<ReplicaService>,
    /// Largest batch accepted by `POST /posts`.
    pub max_batch_size: usize,
}
