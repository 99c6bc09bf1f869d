//! Runtime configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cors::CorsPolicy;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ASSETS_DIR: &str = "./static";
const DEFAULT_STATUS_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8080",
    "http://127.0.0.1:8080",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

/// Where templates and the font are fetched from.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSource {
    Http { base_url: String },
    Local { dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub assets: AssetSource,
    pub template_table_path: Option<PathBuf>,
    pub status_cache_ttl: Duration,
    pub cors: CorsPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match non_empty("PORT") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let assets = match non_empty("ASSETS_BASE_URL") {
            Some(base_url) => AssetSource::Http { base_url },
            None => AssetSource::Local {
                dir: PathBuf::from(
                    non_empty("ASSETS_DIR").unwrap_or_else(|| DEFAULT_ASSETS_DIR.to_string()),
                ),
            },
        };

        let ttl_secs = match non_empty("STATUS_CACHE_TTL_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "STATUS_CACHE_TTL_SECS",
                        value,
                    })
                }
            },
            None => DEFAULT_STATUS_CACHE_TTL_SECS,
        };

        let allowed_origins = match non_empty("CORS_ALLOWED_ORIGINS") {
            Some(value) => split_list(&value),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };
        let allowed_suffixes = non_empty("CORS_ALLOWED_SUFFIXES")
            .map(|value| split_list(&value))
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            assets,
            template_table_path: non_empty("TEMPLATE_TABLE_PATH").map(PathBuf::from),
            status_cache_ttl: Duration::from_secs(ttl_secs),
            cors: CorsPolicy {
                allowed_origins,
                allowed_suffixes,
            },
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
