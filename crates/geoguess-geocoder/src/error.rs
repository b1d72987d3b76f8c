use std::path::PathBuf;

use geoguess_core::ErrorKind;
use geoguess_geo::GeoError;
use thiserror::Error;

/// Errors returned by geocoder lookups and sub-area discovery.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// Network or TLS failure, timeout, or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid geocoder base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no geocoder results for query: {query}")]
    NotFound { query: String },

    #[error("top geocoder result for '{query}' has no polygon geometry")]
    NoGeometry { query: String },

    #[error(
        "no sub-areas found for {place} ({keywords} keyword queries, {failed} failed)"
    )]
    NoCandidates {
        place: String,
        keywords: usize,
        failed: usize,
    },

    #[error("discovery task for keyword '{keyword}' panicked")]
    TaskPanicked { keyword: String },

    /// A blocking cache or geometry task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Geometry(#[from] GeoError),
}

impl GeocoderError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeocoderError::Http(_)
            | GeocoderError::Deserialize { .. }
            | GeocoderError::TaskPanicked { .. }
            | GeocoderError::Blocking(_) => ErrorKind::Transport,
            GeocoderError::InvalidBaseUrl { .. } => ErrorKind::Configuration,
            GeocoderError::InvalidInput(_) => ErrorKind::InvalidInput,
            GeocoderError::NotFound { .. } => ErrorKind::NotFound,
            GeocoderError::NoGeometry { .. } => ErrorKind::NoGeometry,
            GeocoderError::NoCandidates { .. } => ErrorKind::NoCandidates,
            GeocoderError::Geometry(e) => e.kind(),
        }
    }
}

/// Errors reading or writing persisted sub-area files.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed cache file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
