//! HTTP handlers for the `/api/v1` video endpoints.
//! Uploads are streamed from the multipart body to a scoped temp file and
//! handed to `VideoService`; everything else is a direct service call.

use crate::{
    errors::{AppError, ErrorBody},
    models::video::Video,
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::path::{Path as FsPath, PathBuf};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

const FILE_FIELD: &str = "file";
const INVALID_UPLOAD: &str = "Invalid file upload";

/// Multipart form accepted by `POST /api/v1/video/upload` (documentation only).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Spooled upload on local disk. The file is removed when the guard drops,
/// whichever way the request ends.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    async fn create(dir: &FsPath, name: &str) -> std::io::Result<(Self, File)> {
        let path = dir.join(name);
        let file = File::create(&path).await?;
        Ok((Self { path }, file))
    }

    fn path(&self) -> &FsPath {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        // Drop cannot await; a single unlink is cheap enough to run inline.
        match std::fs::remove_file(&self.path) {
            Ok(_) => debug!("removed temp upload {}", self.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => debug!("could not remove temp upload {}: {}", self.path.display(), err),
        }
    }
}

/// `POST /api/v1/video/upload`
#[utoipa::path(
    post,
    path = "/api/v1/video/upload",
    tag = "videos",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video uploaded successfully", body = Video),
        (status = 400, description = "Invalid request payload", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    )
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart.map_err(|err| {
        debug!("rejecting upload: {}", err);
        AppError::bad_request(INVALID_UPLOAD)
    })?;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(AppError::bad_request(INVALID_UPLOAD)),
            Err(err) => {
                debug!("malformed multipart body: {}", err);
                return Err(AppError::bad_request(INVALID_UPLOAD));
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A part without `filename=` is a plain form value, not a file.
        let Some(file_name) = field.file_name() else {
            return Err(AppError::bad_request(INVALID_UPLOAD));
        };
        let ext = file_extension(file_name).to_string();
        let content_type = field.content_type().map(str::to_string);
        let object_key = format!("{}{}", Uuid::new_v4(), ext);

        let (temp, mut file) = TempUpload::create(&state.upload_tmp_dir, &object_key)
            .await
            .map_err(|err| {
                AppError::internal(format!("Failed to create temporary file: {}", err))
            })?;

        let mut size: i64 = 0;
        loop {
            let chunk = match field.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    debug!("upload body rejected mid-stream: {}", err);
                    return Err(AppError::bad_request(INVALID_UPLOAD));
                }
            };
            size += chunk.len() as i64;
            file.write_all(&chunk)
                .await
                .map_err(|err| AppError::internal(format!("Failed to save file: {}", err)))?;
        }
        file.flush()
            .await
            .map_err(|err| AppError::internal(format!("Failed to save file: {}", err)))?;
        drop(file);

        let video = state
            .service
            .upload(temp.path(), &object_key, size, content_type.as_deref())
            .await?;

        return Ok((StatusCode::CREATED, Json(video)));
    }
}

/// `GET /api/v1/video/{id}`
#[utoipa::path(
    get,
    path = "/api/v1/video/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video retrieved successfully", body = Video),
        (status = 404, description = "Video not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    )
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Video>, AppError> {
    let id = parse_video_id(&id)?;
    let video = state.service.get(id).await?;
    Ok(Json(video))
}

/// `DELETE /api/v1/video/{id}`
#[utoipa::path(
    delete,
    path = "/api/v1/video/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted successfully"),
        (status = 404, description = "Video not found", body = ErrorBody),
        (status = 500, description = "Server error", body = ErrorBody)
    )
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_video_id(&id)?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/videos`
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Videos retrieved successfully", body = [Video]),
        (status = 500, description = "Server error", body = ErrorBody)
    )
)]
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<Video>>, AppError> {
    Ok(Json(state.service.get_all().await?))
}

/// A malformed id can never match a row, so it is reported as not found.
fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found("Video not found"))
}

/// Extension of the client filename including the dot, or "" when the last
/// path component has none.
fn file_extension(filename: &str) -> &str {
    for (idx, c) in filename.char_indices().rev() {
        match c {
            '/' | '\\' => return "",
            '.' => return &filename[idx..],
            _ => {}
        }
    }
    ""
}
