use anyhow::{bail, Context, Result};

use crate::vectorize::chunker::ChunkConfig;
use crate::vectorize::pipeline::DEFAULT_BATCH_SIZE;

/// Which persistence backend the API runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Object storage settings. Present only when every S3 variable is set.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub openai_api_key: String,
    pub app_env: String,
    pub s3: Option<S3Config>,
    pub vector_backend_url: Option<String>,
    pub ocr_backend_url: Option<String>,
    pub vectorize_batch_delay_ms: u64,
    pub vectorize_batch_size: usize,
    /// Validated at load time.
    pub chunking: ChunkConfig,
    pub ocr_page_delay_ms: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage_backend = match optional_env("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let database_url = match storage_backend {
            StorageBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StorageBackend::Memory => optional_env("DATABASE_URL"),
        };

        Ok(Config {
            storage_backend,
            database_url,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            app_env: optional_env("APP_ENV").unwrap_or_else(|| "development".to_string()),
            s3: s3_from_env()?,
            vector_backend_url: optional_env("VECTOR_BACKEND_URL"),
            ocr_backend_url: optional_env("OCR_BACKEND_URL"),
            vectorize_batch_delay_ms: parse_env("VECTORIZE_BATCH_DELAY_MS", 3000)?,
            vectorize_batch_size: parse_env("VECTORIZE_BATCH_SIZE", DEFAULT_BATCH_SIZE)?.max(1),
            chunking: ChunkConfig::new(
                parse_env("VECTORIZE_CHUNK_SIZE", 1000)?,
                parse_env("VECTORIZE_CHUNK_OVERLAP", 200)?,
            )?,
            ocr_page_delay_ms: parse_env("OCR_PAGE_DELAY_MS", 1000)?,
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn s3_from_env() -> Result<Option<S3Config>> {
    let vars = [
        optional_env("S3_BUCKET"),
        optional_env("S3_ENDPOINT"),
        optional_env("AWS_ACCESS_KEY_ID"),
        optional_env("AWS_SECRET_ACCESS_KEY"),
    ];
    match vars {
        [Some(bucket), Some(endpoint), Some(access_key_id), Some(secret_access_key)] => {
            Ok(Some(S3Config {
                bucket,
                endpoint,
                access_key_id,
                secret_access_key,
            }))
        }
        [None, None, None, None] => Ok(None),
        _ => bail!(
            "S3_BUCKET, S3_ENDPOINT, AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
        ),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by in-process tests: memory store, no external services.
    pub fn for_tests() -> Self {
        Config {
            storage_backend: StorageBackend::Memory,
            database_url: None,
            openai_api_key: "test-key".to_string(),
            app_env: "test".to_string(),
            s3: None,
            vector_backend_url: None,
            ocr_backend_url: None,
            vectorize_batch_delay_ms: 0,
            vectorize_batch_size: DEFAULT_BATCH_SIZE,
            chunking: ChunkConfig::default(),
            ocr_page_delay_ms: 0,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
