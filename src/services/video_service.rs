//! src/services/video_service.rs
//!
//! VideoService — sequences object-store and metadata operations for a video.
//! Upload writes the payload first and the row second; delete removes the
//! payload first and the row second. Neither sequence is transactional.

use crate::{
    models::video::{NewVideo, Video},
    repository::video_repository::{RepoError, VideoRepository},
    storage::minio::{ObjectStore, ObjectStoreError},
};
use std::{path::Path, sync::Arc};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("video `{0}` not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Store(#[from] ObjectStoreError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for VideoError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => VideoError::NotFound(id),
            other => VideoError::Repo(other),
        }
    }
}

pub type VideoResult<T> = Result<T, VideoError>;

/// Cheap to clone; both backends are shared handles built once in `main`.
#[derive(Clone)]
pub struct VideoService {
    repo: Arc<dyn VideoRepository>,
    store: Arc<dyn ObjectStore>,
}

impl VideoService {
    pub fn new(repo: Arc<dyn VideoRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// Push the file at `local_path` to the bucket under `object_key`, then
    /// record it.
    ///
    /// A failed object write aborts before the database is touched. A failed
    /// insert triggers a compensating object removal so no orphan is left
    /// behind; if that removal also fails the orphan is logged and the insert
    /// error is still what the caller sees. The local file is removed
    /// best-effort on success.
    pub async fn upload(
        &self,
        local_path: &Path,
        object_key: &str,
        size: i64,
        content_type: Option<&str>,
    ) -> VideoResult<Video> {
        self.store
            .put_file(object_key, local_path, content_type)
            .await?;

        let record = NewVideo {
            id: Uuid::new_v4(),
            name: object_key.to_string(),
            size,
            url: self.store.object_url(object_key),
        };

        let video = match self.repo.create(&record).await {
            Ok(video) => video,
            Err(err) => {
                if let Err(cleanup) = self.store.remove(object_key).await {
                    warn!(
                        object_key = %object_key,
                        bucket = %self.store.bucket(),
                        error = %cleanup,
                        "insert failed and orphaned object could not be removed"
                    );
                }
                return Err(err.into());
            }
        };

        if let Err(err) = fs::remove_file(local_path).await {
            debug!("leaving upload file {} in place: {}", local_path.display(), err);
        }

        info!(
            video_id = %video.id,
            object_key = %video.name,
            size_bytes = video.size,
            bucket = %self.store.bucket(),
            "video uploaded"
        );
        Ok(video)
    }

    pub async fn get(&self, id: Uuid) -> VideoResult<Video> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Remove the payload, then the row. If the payload cannot be removed the
    /// row is kept so the object stays reachable.
    pub async fn delete(&self, id: Uuid) -> VideoResult<()> {
        let video = self.repo.get_by_id(id).await?;

        self.store.remove(&video.name).await?;
        self.repo.delete(id).await?;

        info!(video_id = %id, object_key = %video.name, "video deleted");
        Ok(())
    }

    pub async fn get_all(&self) -> VideoResult<Vec<Video>> {
        Ok(self.repo.get_all().await?)
    }

    /// Check both backends; used by `/readyz`.
    pub async fn readiness(&self) -> (Result<(), String>, Result<(), String>) {
        let db = self.repo.ping().await.map_err(|e| e.to_string());
        let store = self.store.ping().await.map_err(|e| e.to_string());
        (db, store)
    }
}
