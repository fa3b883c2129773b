//! PostgreSQL implementation of the post store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{PostStore, StoreError, StoreStats};
use crate::config::PoolSettings;
use crate::domain::Post;

/// DDL for the post table. Every backend must end up with this exact shape.
pub const CREATE_POSTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS posts (\
     id BIGSERIAL PRIMARY KEY, \
     title TEXT, \
     creator TEXT, \
     description TEXT, \
     link TEXT, \
     pub_date TEXT, \
     guid TEXT NOT NULL UNIQUE, \
     guid_is_perma_link TEXT, \
     source TEXT, \
     source_url TEXT, \
     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())";

/// Insert that silently drops rows whose `guid` is already stored.
pub const INSERT_POST: &str = "INSERT INTO posts \
     (title, creator, description, link, pub_date, guid, guid_is_perma_link, source, source_url) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
     ON CONFLICT (guid) DO NOTHING";

const POST_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM posts WHERE guid = $1)";

const PING: &str = "SELECT 1";

const POST_STATS: &str = "SELECT COUNT(*), MAX(created_at) FROM posts";

/// SQLSTATEs raised when two sessions race on `CREATE TABLE IF NOT EXISTS`:
/// `unique_violation` on the catalog and `duplicate_table`.
const DDL_RACE_CODES: [&str; 2] = ["23505", "42P07"];

/// PostgreSQL-backed post store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `url` without opening any connection yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError::Database`] if `url` is not a valid
    /// Postgres connection string.
    pub fn connect_lazy(url: &str, settings: &PoolSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }
}

fn is_ddl_race(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| DDL_RACE_CODES.contains(&code.as_ref()))
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        match sqlx::query(CREATE_POSTS_TABLE).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(e) if is_ddl_race(&e) => {
                tracing::debug!(error = %e, "concurrent schema creation, table already present");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_post(&self, post: &Post) -> Result<bool, StoreError> {
        let result = sqlx::query(INSERT_POST)
            .bind(&post.title)
            .bind(&post.creator)
            .bind(&post.description)
            .bind(&post.link)
            .bind(&post.pub_date)
            .bind(&post.guid)
            .bind(&post.guid_is_perma_link)
            .bind(&post.source)
            .bind(&post.source_url)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, guid: &str) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(POST_EXISTS)
            .bind(guid)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query(PING).execute(&self.pool).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let (total_posts, latest_post) =
            sqlx::query_as::<_, (i64, Option<DateTime<Utc>>)>(POST_STATS)
                .fetch_one(&self.pool)
                .await?;
        Ok(StoreStats {
            total_posts,
            latest_post,
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        self.pool.close().await;
        Ok(())
    }
}
