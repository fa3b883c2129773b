//! Domain layer: posts, the backend registry, and fan-out results.
//!
//! This module contains the feed post model, the ordered replica set
//! every operation runs against, and the per-backend outcome types
//! returned by writes, health checks and statistics.

pub mod backend_registry;
pub mod outcome;
pub mod post;

pub use backend_registry::{Backend, BackendRegistry};
pub use outcome::{
    BackendOutcome, BackendStatus, BatchReport, HealthEntry, ReadResolution, StatsSnapshot,
};
pub use post::{PersistedPost, Post};
