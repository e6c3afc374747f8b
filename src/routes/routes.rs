//! Defines routes for the video API.
//!
//! ## Structure
//! - **Video endpoints** (under `/api/v1`)
//!   - `POST   /video/upload` — multipart upload (field `file`)
//!   - `GET    /video/{id}`   — fetch one record
//!   - `DELETE /video/{id}`   — delete payload and record
//!   - `GET    /videos`       — list every record
//!
//! - **Operational endpoints**
//!   - `GET /healthz`, `GET /readyz`
//!   - `GET /swagger` (RapiDoc UI, `/swagger/` redirects), `GET /swagger/openapi.json`

use crate::{
    api_doc::ApiDoc,
    handlers::{
        health_handlers::{healthz, readyz},
        video_handlers::{delete_video, get_video, list_videos, upload_video},
    },
    state::AppState,
};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    response::Redirect,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

/// Build and return the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers. Only the
/// upload route accepts bodies up to `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let api = Router::new()
        .route(
            "/video/upload",
            post(upload_video).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/video/{id}", get(get_video).delete(delete_video))
        .route("/videos", get(list_videos));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/swagger/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/swagger/", get(|| async { Redirect::permanent("/swagger") }))
        .merge(RapiDoc::new("/swagger/openapi.json").path("/swagger"))
        .nest("/api/v1", api)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Catch-all CORS policy; preflight requests are answered by the layer itself.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
