//! In-memory backends for service and handler tests.

use crate::{
    models::video::{NewVideo, Video},
    repository::video_repository::{RepoError, RepoResult, VideoRepository},
    storage::minio::{ObjectStore, ObjectStoreError, ObjectStoreResult, object_url},
};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryVideoRepository {
    rows: Mutex<Vec<Video>>,
    fail_create: AtomicBool,
    fail_ping: AtomicBool,
    create_calls: AtomicUsize,
}

impl MemoryVideoRepository {
    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn create(&self, video: &NewVideo) -> RepoResult<Video> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepoError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let now = Utc::now();
        let row = Video {
            id: video.id,
            name: video.name.clone(),
            size: video.size,
            url: video.url.clone(),
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: Uuid) -> RepoResult<Video> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or(RepoError::NotFound(id))
    }

    async fn get_all(&self) -> RepoResult<Vec<Video>> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|v| v.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    async fn ping(&self) -> RepoResult<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(RepoError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub struct MemoryObjectStore {
    endpoint: String,
    bucket: String,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_put: AtomicBool,
    fail_remove: AtomicBool,
    fail_ping: AtomicBool,
    put_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new(endpoint: &str, bucket: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            bucket: bucket.to_string(),
            objects: Mutex::new(HashMap::new()),
            fail_put: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            fail_ping: AtomicBool::new(false),
            put_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removes(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pings(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        object_url(&self.endpoint, &self.bucket, key)
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        _content_type: Option<&str>,
    ) -> ObjectStoreResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Put {
                key: key.to_string(),
                reason: "connection refused".into(),
            });
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, key: &str) -> ObjectStoreResult<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Remove {
                key: key.to_string(),
                reason: "connection refused".into(),
            });
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn ping(&self) -> ObjectStoreResult<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unreachable("bucket `videos` not reachable".into()));
        }
        Ok(())
    }
}

pub async fn write_temp_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, contents).await.unwrap();
    path
}
