//! OpenAPI documentation served under `/swagger`.

use crate::{errors::ErrorBody, handlers::video_handlers, models::video::Video};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Video Service API",
        version = "1.0",
        description = "Upload, fetch, list and delete videos stored in an S3-compatible bucket."
    ),
    paths(
        video_handlers::upload_video,
        video_handlers::get_video,
        video_handlers::delete_video,
        video_handlers::list_videos,
    ),
    components(schemas(Video, ErrorBody, video_handlers::UploadForm)),
    tags((name = "videos", description = "Video metadata and storage"))
)]
pub struct ApiDoc;
