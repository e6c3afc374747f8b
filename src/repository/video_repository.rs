//! VideoRepository — parameterized SQL against the `videos` table.
//!
//! The trait is the seam the service depends on; `PgVideoRepository` is the
//! Postgres implementation used by the binary.

use crate::models::video::{NewVideo, Video};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("video `{0}` not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Insert one row and return it with the database-populated timestamps.
    async fn create(&self, video: &NewVideo) -> RepoResult<Video>;

    /// Fetch one row. Returns `RepoError::NotFound` when no row matches.
    async fn get_by_id(&self, id: Uuid) -> RepoResult<Video>;

    /// Fetch every row; an empty table yields an empty vec.
    async fn get_all(&self) -> RepoResult<Vec<Video>>;

    /// Delete one row. Returns `RepoError::NotFound` when nothing was removed.
    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Cheap connectivity check used by `/readyz`.
    async fn ping(&self) -> RepoResult<()>;
}

const VIDEO_COLUMNS: &str = "id, name, size, url, created_at, updated_at";

#[derive(Clone)]
pub struct PgVideoRepository {
    /// Shared Postgres pool, created once in `main`.
    pub db: Arc<PgPool>,
}

impl PgVideoRepository {
    pub fn new(db: Arc<PgPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn create(&self, video: &NewVideo) -> RepoResult<Video> {
        let row = sqlx::query_as::<_, Video>(&format!(
            "INSERT INTO videos (id, name, size, url) VALUES ($1, $2, $3, $4) RETURNING {}",
            VIDEO_COLUMNS
        ))
        .bind(video.id)
        .bind(&video.name)
        .bind(video.size)
        .bind(&video.url)
        .fetch_one(&*self.db)
        .await?;

        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Video> {
        sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| not_found_or(err, id))
    }

    async fn get_all(&self) -> RepoResult<Vec<Video>> {
        let rows = sqlx::query_as::<_, Video>(&format!(
            "SELECT {} FROM videos ORDER BY created_at ASC, id ASC",
            VIDEO_COLUMNS
        ))
        .fetch_all(&*self.db)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&*self.db)
            .await?;
        Ok(())
    }
}

fn not_found_or(err: sqlx::Error, id: Uuid) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound(id),
        other => RepoError::Sqlx(other),
    }
}
