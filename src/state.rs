use crate::services::video_service::VideoService;
use std::path::PathBuf;

/// Shared router state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: VideoService,
    /// Directory where multipart uploads are spooled before reaching the store.
    pub upload_tmp_dir: PathBuf,
}
