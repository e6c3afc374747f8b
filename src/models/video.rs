//! Represents a stored video and the metadata kept about it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Metadata row for one uploaded video.
///
/// The payload itself lives in the object store under `name`; this struct
/// never holds content bytes.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, ToSchema)]
pub struct Video {
    /// Server-generated identifier, also the primary key.
    pub id: Uuid,

    /// Object key in the bucket (`{uuid}{ext}`), not the client's filename.
    pub name: String,

    /// Byte length of the uploaded content.
    pub size: i64,

    /// `{endpoint}/{bucket}/{name}` as it was at upload time.
    pub url: String,

    /// Set by the database on insert.
    pub created_at: DateTime<Utc>,

    /// Set by the database on insert.
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the application when inserting a row. Timestamps are
/// left to the column defaults.
#[derive(Clone, Debug)]
pub struct NewVideo {
    pub id: Uuid,
    pub name: String,
    pub size: i64,
    pub url: String,
}
