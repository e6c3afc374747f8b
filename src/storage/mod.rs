//! Object store client for video payloads.

pub mod minio;
