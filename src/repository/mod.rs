//! Persistence for video metadata.

pub mod video_repository;
