//! Wiki-Outline: a topical wiki crawler and outline extractor
//!
//! This crate walks the link graph of an encyclopedia-style wiki, keeps only
//! documents that look relevant to a configured subject, and writes each
//! accepted document as tab-delimited `breadcrumb<TAB>body` outline records.

pub mod config;
pub mod crawler;
pub mod logging;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Wiki-Outline operations
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection reset while fetching {id}: {message}")]
    ConnectionReset { id: String, message: String },

    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OutlineError {
    /// Returns true if this error ends a crawl as aborted rather than failed
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::ConnectionReset { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty document reference")]
    Empty,
}

/// Result type alias for Wiki-Outline operations
pub type Result<T> = std::result::Result<T, OutlineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, DocumentSource, FetchError, FetchErrorKind, WikiSource};
pub use state::{FailureCounter, VisitedRegistry};
pub use url::{canonicalize, DocumentId, Link, LinkFilter};
