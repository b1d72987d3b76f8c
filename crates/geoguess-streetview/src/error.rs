use geoguess_core::ErrorKind;
use geoguess_geo::GeoError;
use thiserror::Error;

use crate::metadata::MetadataStatus;

#[derive(Debug, Error)]
pub enum StreetViewError {
    /// Network or TLS failure, timeout, or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid metadata endpoint '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("GOOGLE_MAPS_API_KEY not configured")]
    MissingApiKey,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Sampling(#[from] GeoError),

    /// The blocking sampling task panicked or was cancelled.
    #[error("sampling task failed: {0}")]
    SamplingTask(#[from] tokio::task::JoinError),

    #[error(
        "no Street View found after {attempts} attempts; last status={}",
        .last_status.map_or("none", MetadataStatus::as_str)
    )]
    CoverageExhausted {
        attempts: usize,
        last_status: Option<MetadataStatus>,
    },
}

impl StreetViewError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreetViewError::Http(_)
            | StreetViewError::Deserialize { .. }
            | StreetViewError::SamplingTask(_) => ErrorKind::Transport,
            StreetViewError::InvalidBaseUrl { .. } | StreetViewError::MissingApiKey => {
                ErrorKind::Configuration
            }
            StreetViewError::InvalidInput(_) => ErrorKind::InvalidInput,
            StreetViewError::Sampling(e) => e.kind(),
            StreetViewError::CoverageExhausted { .. } => ErrorKind::CoverageExhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_last_status() {
        let err = StreetViewError::CoverageExhausted {
            attempts: 10,
            last_status: Some(MetadataStatus::ZeroResults),
        };
        assert_eq!(
            err.to_string(),
            "no Street View found after 10 attempts; last status=ZERO_RESULTS"
        );
        assert_eq!(err.kind(), ErrorKind::CoverageExhausted);
    }

    #[test]
    fn missing_key_is_configuration() {
        assert_eq!(
            StreetViewError::MissingApiKey.kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn sampling_errors_keep_their_kind() {
        let err = StreetViewError::from(GeoError::SamplingExhausted { attempts: 3 });
        assert_eq!(err.kind(), ErrorKind::SamplingExhausted);
    }
}
