//! Configuration management for the recorder
//!
//! Loads settings from environment variables (.env file)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// Directory holding one clip per sentence
    pub audio_dir: PathBuf,
    /// Filename → sentence mapping table
    pub mapping_file: PathBuf,
    /// Most recently uploaded sentence list
    pub sentences_file: PathBuf,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "127.0.0.1:5000".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string(), bind_addr))?;

        let audio_dir = env::var("AUDIO_DIR")
            .unwrap_or_else(|_| "audio_files".to_string())
            .into();

        let mapping_file = env::var("MAPPING_FILE")
            .unwrap_or_else(|_| "audio_mapping.tsv".to_string())
            .into();

        let sentences_file = env::var("SENTENCES_FILE")
            .unwrap_or_else(|_| "last_uploaded_sentences.txt".to_string())
            .into();

        let max_upload_bytes = upload_limit(env::var("MAX_UPLOAD_MB").ok())?;

        Ok(Self {
            bind_addr,
            audio_dir,
            mapping_file,
            sentences_file,
            max_upload_bytes,
        })
    }
}

/// Body limit in bytes from a MiB count; unset or empty means 32 MiB
fn upload_limit(value: Option<String>) -> Result<usize, ConfigError> {
    let Some(value) = value.filter(|s| !s.is_empty()) else {
        return Ok(32 * 1024 * 1024);
    };
    value
        .parse::<usize>()
        .ok()
        .filter(|mb| *mb > 0)
        .and_then(|mb| mb.checked_mul(1024 * 1024))
        .ok_or(ConfigError::InvalidValue("MAX_UPLOAD_MB".to_string(), value))
}

#[cfg(test)]
impl Config {
    /// Defaults rooted at `data_dir`, for running against a scratch directory
    pub fn in_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        let data_dir = data_dir.into();
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            audio_dir: data_dir.join("audio_files"),
            mapping_file: data_dir.join("audio_mapping.tsv"),
            sentences_file: data_dir.join("last_uploaded_sentences.txt"),
            max_upload_bytes: 32 * 1024 * 1024,
        }
    }
}
