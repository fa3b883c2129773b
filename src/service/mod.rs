//! Service layer: replication orchestration.
//!
//! [`ReplicaService`] runs every operation across the
//! [`super::domain::BackendRegistry`] and folds per-backend failures into
//! structured results.

pub mod replica_service;

pub use replica_service::ReplicaService;
