//! S3-compatible object store access (MinIO in development).
//!
//! `S3ObjectStore::connect` bootstraps the bucket: it checks for it, creates
//! it when missing and attaches an anonymous read policy. Any failure there is
//! returned to `main`, which treats it as fatal.

use crate::config::AppConfig;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use serde_json::json;
use std::{path::Path, time::Instant};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("object store unreachable: {0}")]
    Unreachable(String),
    #[error("checking bucket `{bucket}` failed: {reason}")]
    BucketCheck { bucket: String, reason: String },
    #[error("creating bucket `{bucket}` failed: {reason}")]
    BucketCreate { bucket: String, reason: String },
    #[error("setting policy on bucket `{bucket}` failed: {reason}")]
    Policy { bucket: String, reason: String },
    #[error("failed to upload `{key}` to object store: {reason}")]
    Put { key: String, reason: String },
    #[error("failed to delete `{key}` from object store: {reason}")]
    Remove { key: String, reason: String },
    #[error("reading upload source failed: {0}")]
    Io(String),
}

pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket every object is written to.
    fn bucket(&self) -> &str;

    /// Public URL recorded for `key`.
    fn object_url(&self, key: &str) -> String;

    /// Upload the file at `path` under `key`.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> ObjectStoreResult<()>;

    /// Remove `key` from the bucket.
    async fn remove(&self, key: &str) -> ObjectStoreResult<()>;

    /// Verify the bucket is reachable.
    async fn ping(&self) -> ObjectStoreResult<()>;
}

/// `{endpoint}/{bucket}/{key}`, with the endpoint exactly as configured.
pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
}

/// Bucket policy granting anonymous `s3:GetObject` on every key.
pub fn public_read_policy(bucket: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": "*",
                "Action": ["s3:GetObject"],
                "Resource": [format!("arn:aws:s3:::{}/*", bucket)]
            }
        ]
    })
    .to_string()
}

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    /// Endpoint used when building record URLs (as configured, no scheme added).
    public_endpoint: String,
}

impl S3ObjectStore {
    /// Build the client and make sure the bucket exists with a public-read policy.
    pub async fn connect(cfg: &AppConfig) -> ObjectStoreResult<Self> {
        let credentials = Credentials::new(
            cfg.minio_access_key.clone(),
            cfg.minio_secret_key.clone(),
            None,
            None,
            "video-service-static",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.minio_region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(cfg.minio_endpoint_url())
            .load()
            .await;

        // MinIO only serves path-style requests.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        let store = Self {
            client: Client::from_conf(s3_config),
            bucket: cfg.minio_bucket.clone(),
            public_endpoint: cfg.minio_endpoint.clone(),
        };

        store.ensure_bucket().await?;
        Ok(store)
    }

    async fn ensure_bucket(&self) -> ObjectStoreResult<()> {
        let exists = match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => true,
            Err(err)
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false) =>
            {
                false
            }
            Err(err) => {
                error!(bucket = %self.bucket, error = %DisplayErrorContext(&err), "bucket check failed");
                return Err(ObjectStoreError::BucketCheck {
                    bucket: self.bucket.clone(),
                    reason: DisplayErrorContext(&err).to_string(),
                });
            }
        };

        if !exists {
            self.client
                .create_bucket()
                .bucket(&self.bucket)
                .send()
                .await
                .map_err(|err| ObjectStoreError::BucketCreate {
                    bucket: self.bucket.clone(),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;
            info!(bucket = %self.bucket, "bucket created");
        }

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(public_read_policy(&self.bucket))
            .send()
            .await
            .map_err(|err| ObjectStoreError::Policy {
                bucket: self.bucket.clone(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, key: &str) -> String {
        object_url(&self.public_endpoint, &self.bucket, key)
    }

    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> ObjectStoreResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let start = Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(body)
            .send()
            .await
            .map_err(|err| {
                error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "object upload failed"
                );
                ObjectStoreError::Put {
                    key: key.to_string(),
                    reason: DisplayErrorContext(&err).to_string(),
                }
            })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> ObjectStoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| ObjectStoreError::Remove {
                key: key.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }

    async fn ping(&self) -> ObjectStoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|err| ObjectStoreError::Unreachable(DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_endpoint_bucket_key() {
        assert_eq!(
            object_url("localhost:9000", "videos", "abc.mp4"),
            "localhost:9000/videos/abc.mp4"
        );
        assert_eq!(
            object_url("https://cdn.example.com/", "videos", "abc.mp4"),
            "https://cdn.example.com/videos/abc.mp4"
        );
    }

    #[test]
    fn policy_grants_anonymous_get_on_bucket_keys() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("videos")).unwrap();
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::videos/*");
    }
}
