//! Error types for each failure domain of the pipeline.
//!
//! None of these ever reach the command surface: source failures degrade to an
//! empty list for that source, store failures skip persisting, translation
//! failures keep the original title. They exist so the cause can be logged.

use std::time::Duration;
use thiserror::Error;

/// Why a single source could not produce its headlines.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("renderer returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("source task aborted: {0}")]
    Aborted(String),
}

/// Failure reading or writing the persistent key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store file is not a JSON object: {0}")]
    Corrupt(String),
}

/// Failure translating a single piece of text.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("translation service returned status {0}")]
    Status(u16),

    #[error("unexpected response shape: {0}")]
    Malformed(String),

    #[error("translation service returned an empty string")]
    Empty,
}

/// Invalid or unreadable settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}
