//! Replica service: fan-out writes, fallback reads, health checks and shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use uuid::Uuid;

use crate::domain::{
    Backend, BackendOutcome, BackendRegistry, BackendStatus, BatchReport, HealthEntry, Post,
    ReadResolution, StatsSnapshot,
};
use crate::error::ReplicaError;
use crate::persistence::StoreError;

/// Orchestration layer over the replica set.
///
/// Every fan-out launches one future per backend and waits for all of
/// them; a failing backend never stops its siblings. Statements against
/// a single backend are issued one at a time.
#[derive(Debug)]
pub struct ReplicaService {
    registry: Arc<BackendRegistry>,
    shut_down: AtomicBool,
}

impl ReplicaService {
    /// Creates a new `ReplicaService`.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Returns a reference to the inner [`BackendRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    /// Writes `posts` to every backend.
    ///
    /// Each backend ensures its schema, then inserts the posts in the
    /// given order, skipping `guid`s it already holds. The first failing
    /// statement ends that backend's batch.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::AllBackendsFailed`] if no backend applied
    /// the batch. Any partial success is reported as `Ok`.
    pub async fn write_batch(&self, posts: &[Post]) -> Result<BatchReport, ReplicaError> {
        let batch_id = Uuid::new_v4();
        if posts.is_empty() {
            tracing::debug!(%batch_id, "empty batch, nothing to write");
            return Ok(BatchReport {
                batch_id,
                outcomes: Vec::new(),
            });
        }

        let outcomes = join_all(
            self.registry
                .iter()
                .map(|backend| write_to_backend(backend, posts)),
        )
        .await;

        for outcome in &outcomes {
            match &outcome.error {
                None => tracing::info!(
                    %batch_id,
                    backend = %outcome.name,
                    posts = posts.len(),
                    inserted = outcome.inserted,
                    "batch written"
                ),
                Some(error) => tracing::warn!(
                    %batch_id,
                    backend = %outcome.name,
                    %error,
                    "batch failed on backend"
                ),
            }
        }

        let report = BatchReport { batch_id, outcomes };
        let succeeded = report.succeeded();
        if succeeded == 0 {
            tracing::error!(%batch_id, backends = report.outcomes.len(), "all backends failed");
            return Err(ReplicaError::AllBackendsFailed {
                attempted: report.outcomes.len(),
                failures: report.failures(),
            });
        }

        tracing::info!(
            %batch_id,
            succeeded,
            total = report.outcomes.len(),
            "batch replicated"
        );
        Ok(report)
    }

    /// Returns `true` if any backend holds a post with `guid`.
    ///
    /// See [`ReplicaService::resolve`] for the lookup order. Never fails:
    /// unreachable backends count as misses.
    pub async fn exists(&self, guid: &str) -> bool {
        self.resolve(guid).await.exists()
    }

    /// Looks `guid` up on the primary, then on each fallback in order.
    ///
    /// Stops at the first backend reporting a match. A miss and a failure
    /// on the primary are treated alike: both move on to the fallbacks.
    /// A backend without a post table yet (no write received) counts as
    /// failed, not as a miss.
    pub async fn resolve(&self, guid: &str) -> ReadResolution {
        let mut resolution = ReadResolution::default();

        for backend in self.registry.iter() {
            match backend.store().exists(guid).await {
                Ok(true) => {
                    tracing::debug!(backend = %backend.name(), guid, "post found");
                    resolution.found_in = Some(backend.name().to_string());
                    return resolution;
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(
                        backend = %backend.name(),
                        guid,
                        %error,
                        "existence check failed, trying next backend"
                    );
                    resolution.failed.push(backend.name().to_string());
                }
            }
        }

        tracing::debug!(guid, failed = resolution.failed.len(), "post not found");
        resolution
    }

    /// Issues a liveness query against every backend.
    ///
    /// Returns one entry per backend in registry order. Never fails.
    pub async fn check_health(&self) -> Vec<HealthEntry> {
        join_all(self.registry.iter().map(|backend| async move {
            match backend.store().ping().await {
                Ok(()) => HealthEntry {
                    name: backend.name().to_string(),
                    connected: true,
                    error: None,
                },
                Err(error) => {
                    tracing::warn!(backend = %backend.name(), %error, "health check failed");
                    HealthEntry {
                        name: backend.name().to_string(),
                        connected: false,
                        error: Some(error.to_string()),
                    }
                }
            }
        }))
        .await
    }

    /// Collects row count and newest timestamp from every backend.
    ///
    /// Backends that cannot be queried yield a sentinel snapshot with
    /// `total_posts == -1`. Never fails.
    ///
    /// The post table is created by the first write, so a reachable backend
    /// that has never received a batch also reports the sentinel; check
    /// [`ReplicaService::check_health`] to tell it apart from an outage.
    pub async fn collect_stats(&self) -> Vec<StatsSnapshot> {
        join_all(self.registry.iter().map(|backend| async move {
            match backend.store().stats().await {
                Ok(stats) => StatsSnapshot {
                    name: backend.name().to_string(),
                    total_posts: stats.total_posts,
                    latest_post: stats.latest_post,
                    status: BackendStatus::Healthy,
                    error: None,
                },
                Err(error) => {
                    tracing::warn!(backend = %backend.name(), %error, "stats query failed");
                    StatsSnapshot::unavailable(backend.name(), error.to_string())
                }
            }
        }))
        .await
    }

    /// Releases every backend's connection pool.
    ///
    /// All releases run concurrently and each failure is only logged.
    /// Only the first call does any work.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("replica set already shut down");
            return;
        }

        let results = join_all(self.registry.iter().map(|backend| async move {
            (backend.name(), backend.store().close().await)
        }))
        .await;

        for (name, result) in results {
            match result {
                Ok(()) => tracing::info!(backend = %name, "backend released"),
                Err(error) => tracing::warn!(backend = %name, %error, "backend release failed"),
            }
        }
    }
}

async fn write_to_backend(backend: &Backend, posts: &[Post]) -> BackendOutcome {
    match insert_all(backend, posts).await {
        Ok(inserted) => BackendOutcome::succeeded(backend.name(), inserted),
        Err(error) => BackendOutcome::failed(backend.name(), error.to_string()),
    }
}

async fn insert_all(backend: &Backend, posts: &[Post]) -> Result<u64, StoreError> {
    backend.ensure_schema().await?;

    let mut inserted = 0;
    for post in posts {
        if backend.store().insert_post(post).await? {
            inserted += 1;
        } else {
            tracing::trace!(backend = %backend.name(), guid = %post.guid, "duplicate guid skipped");
        }
    }
    Ok(inserted)
}
