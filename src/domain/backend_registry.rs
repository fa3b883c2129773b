//! Ordered, immutable set of replica backends.
//!
//! [`BackendRegistry`] is built once at startup and shared behind an
//! `Arc`. The first backend is the primary; the rest are fallbacks,
//! consulted in registration order.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ReplicaConfig;
use crate::error::ReplicaError;
use crate::persistence::{self, PostStore, StoreError};

/// One named backend and its store.
#[derive(Debug)]
pub struct Backend {
    name: String,
    store: Arc<dyn PostStore>,
    schema_ready: AtomicBool,
}

impl Backend {
    /// Wraps `store` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, store: Arc<dyn PostStore>) -> Self {
        Self {
            name: name.into(),
            store,
            schema_ready: AtomicBool::new(false),
        }
    }

    /// Backend name as used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backend's store.
    #[must_use]
    pub fn store(&self) -> &dyn PostStore {
        self.store.as_ref()
    }

    /// Returns `true` once the post table is known to exist.
    #[must_use]
    pub fn is_schema_ready(&self) -> bool {
        self.schema_ready.load(Ordering::Acquire)
    }

    /// Creates the post table on first use.
    ///
    /// The DDL is re-issued until it succeeds once; concurrent callers may
    /// both issue it, which the store tolerates.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        if self.is_schema_ready() {
            return Ok(());
        }
        self.store.ensure_schema().await?;
        self.schema_ready.store(true, Ordering::Release);
        tracing::debug!(backend = %self.name, "post table ensured");
        Ok(())
    }
}

/// The replica set.
///
/// # Invariants
///
/// - At least one backend (the primary).
/// - Backend names are unique and non-empty.
/// - Membership and order never change after construction.
#[derive(Debug)]
pub struct BackendRegistry {
    primary: Backend,
    fallbacks: Vec<Backend>,
}

impl BackendRegistry {
    /// Builds a registry from backends in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Config`] if `backends` is empty or contains
    /// an empty or duplicate name.
    pub fn new(backends: Vec<Backend>) -> Result<Self, ReplicaError> {
        let mut seen = HashSet::with_capacity(backends.len());
        for backend in &backends {
            if backend.name.trim().is_empty() {
                return Err(ReplicaError::Config("backend name is empty".to_string()));
            }
            if !seen.insert(backend.name.as_str()) {
                return Err(ReplicaError::Config(format!(
                    "duplicate backend name: {}",
                    backend.name
                )));
            }
        }

        let mut iter = backends.into_iter();
        let primary = iter
            .next()
            .ok_or_else(|| ReplicaError::Config("at least one backend is required".to_string()))?;
        Ok(Self {
            primary,
            fallbacks: iter.collect(),
        })
    }

    /// Opens a store for every configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicaError::Config`] if a store cannot be opened or the
    /// backend list is invalid.
    pub fn from_config(config: &ReplicaConfig) -> Result<Self, ReplicaError> {
        let backends = config
            .backends
            .iter()
            .map(|b| -> Result<Backend, ReplicaError> {
                let store = persistence::open_store(b, &config.pool)?;
                Ok(Backend::new(b.name.clone(), store))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(backends)
    }

    /// The backend consulted first on reads.
    #[must_use]
    pub fn primary(&self) -> &Backend {
        &self.primary
    }

    /// Non-primary backends in registration order.
    #[must_use]
    pub fn fallbacks(&self) -> &[Backend] {
        &self.fallbacks
    }

    /// All backends in registration order, primary first.
    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        std::iter::once(&self.primary).chain(self.fallbacks.iter())
    }

    /// Backend names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(Backend::name).collect()
    }

    /// Number of backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fallbacks.len() + 1
    }

    /// Always `false`: a registry holds at least the primary. Paired with
    /// [`BackendRegistry::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, PoolSettings};
    use crate::persistence::MemoryStore;

    fn memory_backend(name: &str) -> Backend {
        Backend::new(name, Arc::new(MemoryStore::new()))
    }

    #[test]
    fn first_backend_is_primary() {
        let Ok(registry) = BackendRegistry::new(vec![
            memory_backend("a"),
            memory_backend("b"),
            memory_backend("c"),
        ]) else {
            panic!("registry should build");
        };
        assert_eq!(registry.primary().name(), "a");
        assert_eq!(
            registry.fallbacks().iter().map(Backend::name).collect::<Vec<_>>(),
            vec!["b", "c"]
        );
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn empty_registry_is_rejected() {
        assert!(matches!(
            BackendRegistry::new(Vec::new()),
            Err(ReplicaError::Config(_))
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = BackendRegistry::new(vec![memory_backend("a"), memory_backend("a")]);
        assert!(matches!(result, Err(ReplicaError::Config(_))));
    }

    #[test]
    fn blank_names_are_rejected() {
        let result = BackendRegistry::new(vec![memory_backend(" ")]);
        assert!(matches!(result, Err(ReplicaError::Config(_))));
    }

    #[tokio::test]
    async fn schema_is_ensured_once_it_succeeds() {
        let store = Arc::new(MemoryStore::failing());
        let backend = Backend::new("a", Arc::clone(&store) as Arc<dyn PostStore>);

        assert!(backend.ensure_schema().await.is_err());
        assert!(!backend.is_schema_ready());

        store.set_failing(false);
        assert!(backend.ensure_schema().await.is_ok());
        assert!(backend.is_schema_ready());

        // Latched: no further DDL is issued even if the store goes down.
        store.set_failing(true);
        assert!(backend.ensure_schema().await.is_ok());
    }

    #[tokio::test]
    async fn from_config_opens_every_backend() {
        let config = ReplicaConfig {
            backends: vec![
                BackendConfig {
                    name: "primary".to_string(),
                    url: "memory://primary".to_string(),
                },
                BackendConfig {
                    name: "replica".to_string(),
                    url: "memory://replica".to_string(),
                },
            ],
            pool: PoolSettings::default(),
            ..ReplicaConfig::default()
        };
        let Ok(registry) = BackendRegistry::from_config(&config) else {
            panic!("registry should build");
        };
        assert_eq!(registry.names(), vec!["primary", "replica"]);
    }
}
