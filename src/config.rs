use anyhow::{Context, Result};
use clap::Parser;
use std::{env, fmt, path::PathBuf};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables (optionally seeded from `.env`) and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Declared for deployment parity; nothing in the service connects to it.
    pub redis_url: String,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_host: String,
    pub postgres_port: u16,
    pub postgres_db: String,
    pub minio_endpoint: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
    pub minio_bucket: String,
    pub minio_region: String,
    pub minio_use_ssl: bool,
    pub upload_tmp_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Video metadata and storage API")]
pub struct Args {
    /// Host to bind to (overrides the host part of GATEWAY_HTTP_PORT)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides the port part of GATEWAY_HTTP_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store endpoint (overrides MINIO_ENDPOINT)
    #[arg(long)]
    pub minio_endpoint: Option<String>,

    /// Bucket holding video blobs (overrides MINIO_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Directory for in-flight upload files (overrides UPLOAD_TMP_DIR)
    #[arg(long)]
    pub upload_tmp_dir: Option<PathBuf>,

    /// Create the `videos` table and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let mut cfg = Self::from_lookup(|key| env::var(key).ok())?;

        if let Some(host) = args.host {
            cfg.host = host;
        }
        if let Some(port) = args.port {
            cfg.port = port;
        }
        if let Some(endpoint) = args.minio_endpoint {
            cfg.minio_endpoint = endpoint;
        }
        if let Some(bucket) = args.bucket {
            cfg.minio_bucket = bucket;
        }
        if let Some(dir) = args.upload_tmp_dir {
            cfg.upload_tmp_dir = dir;
        }

        Ok((cfg, args.migrate))
    }

    /// Build a config from an arbitrary key lookup. Unset and empty values
    /// both fall back to the default; whitespace-only values are kept as given.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let (host, port) = parse_listen_addr(&var("GATEWAY_HTTP_PORT", ":8088"))?;

        let pg_port_raw = var("POSTGRES_PORT", "5432");
        let postgres_port = pg_port_raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("parsing POSTGRES_PORT value `{}`", pg_port_raw))?;

        let ssl_raw = var("MINIO_USE_SSL", "false");
        let minio_use_ssl = ssl_raw
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .with_context(|| format!("parsing MINIO_USE_SSL value `{}`", ssl_raw))?;

        let max_raw = var("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string());
        let max_upload_bytes = max_raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("parsing MAX_UPLOAD_BYTES value `{}`", max_raw))?;

        let upload_tmp_dir = lookup("UPLOAD_TMP_DIR")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Ok(Self {
            host,
            port,
            redis_url: var("REDIS_URL", "localhost:6379"),
            postgres_user: var("POSTGRES_USER", "postgres"),
            postgres_password: var("POSTGRES_PASSWORD", "postgres"),
            postgres_host: var("POSTGRES_HOST", "localhost"),
            postgres_port,
            postgres_db: var("POSTGRES_DB", "video_service"),
            minio_endpoint: var("MINIO_ENDPOINT", "localhost:9000"),
            minio_access_key: var("MINIO_ACCESS_KEY", "minioadmin"),
            minio_secret_key: var("MINIO_SECRET_KEY", "minioadmin"),
            minio_bucket: var("MINIO_BUCKET_NAME", "videos"),
            minio_region: var("MINIO_REGION", "us-east-1"),
            minio_use_ssl,
            upload_tmp_dir,
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection string for the Postgres pool.
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            self.postgres_user,
            self.postgres_password,
            self.postgres_host,
            self.postgres_port,
            self.postgres_db
        )
    }

    /// Endpoint handed to the S3 client. `MINIO_ENDPOINT` is usually a bare
    /// `host:port`, so the scheme is derived from `MINIO_USE_SSL`.
    pub fn minio_endpoint_url(&self) -> String {
        if self.minio_endpoint.contains("://") {
            return self.minio_endpoint.clone();
        }
        let scheme = if self.minio_use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.minio_endpoint)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("redis_url", &self.redis_url)
            .field("postgres_user", &self.postgres_user)
            .field("postgres_password", &"<redacted>")
            .field("postgres_host", &self.postgres_host)
            .field("postgres_port", &self.postgres_port)
            .field("postgres_db", &self.postgres_db)
            .field("minio_endpoint", &self.minio_endpoint)
            .field("minio_access_key", &self.minio_access_key)
            .field("minio_secret_key", &"<redacted>")
            .field("minio_bucket", &self.minio_bucket)
            .field("minio_region", &self.minio_region)
            .field("minio_use_ssl", &self.minio_use_ssl)
            .field("upload_tmp_dir", &self.upload_tmp_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

/// Accepts `:8088`, `8088` or `host:8088`.
fn parse_listen_addr(raw: &str) -> Result<(String, u16)> {
    let raw = raw.trim();
    let (host, port) = match raw.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => (host.to_string(), port),
        Some((_, port)) => ("0.0.0.0".to_string(), port),
        None => ("0.0.0.0".to_string(), raw),
    };
    let port = port
        .parse::<u16>()
        .with_context(|| format!("parsing GATEWAY_HTTP_PORT value `{}`", raw))?;
    Ok((host, port))
}
