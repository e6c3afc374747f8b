use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod api_doc;
mod config;
mod errors;
mod handlers;
mod models;
mod repository;
mod routes;
mod services;
mod state;
mod storage;
#[cfg(test)]
mod test_support;

use repository::video_repository::PgVideoRepository;
use services::video_service::VideoService;
use state::AppState;
use storage::minio::S3ObjectStore;

const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

#[tokio::main]
async fn main() -> Result<()> {
    // --- .env is optional ---
    let dotenv = dotenvy::dotenv();

    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenv {
        tracing::debug!("No .env file loaded: {}", err);
    }

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting video-service with config: {:?}", cfg);

    // --- Initialize Postgres connection ---
    let db: Arc<sqlx::PgPool> = Arc::new(
        PgPoolOptions::new()
            .max_connections(10)
            .connect(&cfg.postgres_url())
            .await
            .with_context(|| {
                format!(
                    "connecting to postgres at {}:{}/{}",
                    cfg.postgres_host, cfg.postgres_port, cfg.postgres_db
                )
            })?,
    );

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Object store: bucket must exist with a public-read policy ---
    let store = S3ObjectStore::connect(&cfg)
        .await
        .with_context(|| format!("initializing object store at {}", cfg.minio_endpoint))?;
    tracing::info!(bucket = %cfg.minio_bucket, "Object store ready");

    // --- Ensure upload spool directory exists ---
    tokio::fs::create_dir_all(&cfg.upload_tmp_dir)
        .await
        .with_context(|| format!("creating {}", cfg.upload_tmp_dir.display()))?;

    // --- Initialize core service ---
    let repo = PgVideoRepository::new(db.clone());
    let service = VideoService::new(Arc::new(repo), Arc::new(store));
    let state = AppState {
        service,
        upload_tmp_dir: cfg.upload_tmp_dir.clone(),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes(cfg.max_upload_bytes).with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the `videos` table from the embedded schema file.
async fn run_migrations(db: &Arc<sqlx::PgPool>) -> Result<()> {
    let statements = schema_statements(INIT_SCHEMA);

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&**db).await?;
    }

    Ok(())
}

fn schema_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
