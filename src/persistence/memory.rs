//! In-process post store with the same dedup semantics as Postgres.
//!
//! Used to run the service without a database and as the backend test
//! double. Failures can be injected to simulate an unreachable replica.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{PostStore, StoreError, StoreStats};
use crate::domain::{PersistedPost, Post};

#[derive(Debug, Default)]
struct MemoryTable {
    created: bool,
    closed: bool,
    next_id: i64,
    rows: Vec<PersistedPost>,
}

/// In-memory [`PostStore`].
///
/// Behaves like a single Postgres table: writes before
/// [`PostStore::ensure_schema`] fail, `guid` is unique and conflicting
/// inserts are no-ops, and a closed store rejects all further work.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<MemoryTable>,
    failing: AtomicBool,
    exists_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store with no table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that fails every operation until
    /// [`MemoryStore::set_failing`] is called with `false`.
    #[must_use]
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    /// Makes every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    /// Returns `true` if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.rows.is_empty()
    }

    /// Returns the stored row for `guid`.
    pub async fn get(&self, guid: &str) -> Option<PersistedPost> {
        let table = self.table.lock().await;
        table.rows.iter().find(|row| row.post.guid == guid).cloned()
    }

    /// Number of existence queries received, including failed ones.
    #[must_use]
    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    /// Number of release attempts received, including failed ones.
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

impl MemoryTable {
    fn check_open(&self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn check_created(&self) -> Result<(), StoreError> {
        self.check_open()?;
        if !self.created {
            return Err(StoreError::Unavailable(
                "relation \"posts\" does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        let mut table = self.table.lock().await;
        table.check_open()?;
        table.created = true;
        Ok(())
    }

    async fn insert_post(&self, post: &Post) -> Result<bool, StoreError> {
        self.check_reachable()?;
        let mut table = self.table.lock().await;
        table.check_created()?;
        if table.rows.iter().any(|row| row.post.guid == post.guid) {
            return Ok(false);
        }
        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(PersistedPost {
            id,
            post: post.clone(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn exists(&self, guid: &str) -> Result<bool, StoreError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let table = self.table.lock().await;
        table.check_created()?;
        Ok(table.rows.iter().any(|row| row.post.guid == guid))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_reachable()?;
        self.table.lock().await.check_open()
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.check_reachable()?;
        let table = self.table.lock().await;
        table.check_created()?;
        Ok(StoreStats {
            total_posts: i64::try_from(table.rows.len()).unwrap_or(i64::MAX),
            latest_post: table.rows.iter().map(|row| row.created_at).max(),
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let mut table = self.table.lock().await;
        table.check_open()?;
        table.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_before_schema_fails() {
        let store = MemoryStore::new();
        assert!(store.insert_post(&Post::new("g-1", "t")).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_guid_is_noop() {
        let store = MemoryStore::new();
        assert!(store.ensure_schema().await.is_ok());

        let first = store.insert_post(&Post::new("g-1", "first")).await;
        let second = store.insert_post(&Post::new("g-1", "second")).await;
        assert!(matches!(first, Ok(true)));
        assert!(matches!(second, Ok(false)));

        let Some(row) = store.get("g-1").await else {
            panic!("row should be stored");
        };
        assert_eq!(row.post.title, "first");
        assert_eq!(row.id, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.ensure_schema().await.is_ok());
        let _ = store.insert_post(&Post::new("g-1", "t")).await;
        assert!(store.ensure_schema().await.is_ok());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn stats_report_count_and_latest() {
        let store = MemoryStore::new();
        assert!(store.ensure_schema().await.is_ok());

        let Ok(empty) = store.stats().await else {
            panic!("stats should succeed");
        };
        assert_eq!(empty.total_posts, 0);
        assert!(empty.latest_post.is_none());

        let _ = store.insert_post(&Post::new("g-1", "t")).await;
        let _ = store.insert_post(&Post::new("g-2", "t")).await;
        let Ok(stats) = store.stats().await else {
            panic!("stats should succeed");
        };
        assert_eq!(stats.total_posts, 2);
        assert_eq!(
            stats.latest_post,
            store.get("g-2").await.map(|row| row.created_at)
        );
    }

    #[tokio::test]
    async fn failing_store_rejects_everything() {
        let store = MemoryStore::failing();
        assert!(store.ensure_schema().await.is_err());
        assert!(store.ping().await.is_err());
        assert!(store.exists("g").await.is_err());
        assert_eq!(store.exists_calls(), 1);

        store.set_failing(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn closed_store_rejects_work() {
        let store = MemoryStore::new();
        assert!(store.ensure_schema().await.is_ok());
        assert!(store.close().await.is_ok());
        assert!(matches!(store.ping().await, Err(StoreError::Closed)));
        assert!(matches!(store.close().await, Err(StoreError::Closed)));
        assert_eq!(store.close_calls(), 2);
    }
}
