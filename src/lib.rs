//! # feed-replica
//!
//! Redundant persistence of ingested feed posts across several
//! independent PostgreSQL backends.
//!
//! Backends are interchangeable replicas with best-effort consistency:
//! writes fan out to every backend and succeed if any backend applied
//! them, existence checks consult the primary and then each fallback,
//! and health and statistics are gathered from all backends at once.
//!
//! ## Architecture
//!
//! ```text
//! Ingestion pipeline / operators (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── ReplicaService (service/)
//!     │
//!     ├── BackendRegistry (domain/)   primary, fallback, fallback, ...
//!     │
//!     └── PostStore per backend (persistence/)
//!             ├── PgPostStore (sqlx::PgPool)
//!             └── MemoryStore
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
