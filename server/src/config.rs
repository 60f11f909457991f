//! Server configuration loaded from environment variables.
//!
//! `HOST`, `PORT`, `TODO_DATA_FILE` and `CORS_ORIGINS` are read once at
//! startup. An empty `CORS_ORIGINS` allows any origin.

use std::{env, path::PathBuf};

use axum::http::HeaderValue;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: expected a number between 0 and 65535")]
    InvalidPort { value: String },

    #[error("invalid CORS origin {value:?}")]
    InvalidOrigin { value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON file to persist todos in. `None` keeps them in memory.
    pub data_file: Option<PathBuf>,
    /// Allowed cross-origin callers. Empty means any origin.
    pub cors_origins: Vec<HeaderValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_file: None,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load from the process environment, after applying a `.env` file if
    /// one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = non_empty("HOST").unwrap_or(defaults.host);
        let port = match non_empty("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort { value })?,
            None => defaults.port,
        };
        let data_file = non_empty("TODO_DATA_FILE").map(PathBuf::from);
        let cors_origins = match non_empty("CORS_ORIGINS") {
            Some(list) => parse_origins(&list)?,
            None => Vec::new(),
        };

        Ok(Self {
            host,
            port,
            data_file,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_origins(list: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidOrigin {
                value: origin.to_string(),
            })
        })
        .collect()
}
