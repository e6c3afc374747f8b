//! Core data models for the video service.
//!
//! Entities map to database tables via `sqlx::FromRow` and serialize as
//! JSON via `serde`.

pub mod video;
