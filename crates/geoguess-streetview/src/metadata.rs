//! Street View metadata response types and the acceptance rule.

use serde::{Deserialize, Serialize};

/// Outcome reported by the metadata endpoint.
///
/// Any other status the API may send, such as `OVER_QUERY_LIMIT` or
/// `REQUEST_DENIED`, collapses into [`MetadataStatus::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetadataStatus {
    Ok,
    ZeroResults,
    NotFound,
    #[serde(other)]
    Error,
}

impl MetadataStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataStatus::Ok => "OK",
            MetadataStatus::ZeroResults => "ZERO_RESULTS",
            MetadataStatus::NotFound => "NOT_FOUND",
            MetadataStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for MetadataStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetadataLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetViewMetadata {
    pub status: MetadataStatus,
    /// Capture month, e.g. `"2019-07"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pano_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<MetadataLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StreetViewMetadata {
    /// First non-empty of `date` / `image_date`.
    #[must_use]
    pub fn capture_date(&self) -> Option<&str> {
        [self.date.as_deref(), self.image_date.as_deref()]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty())
    }
}

/// True when the metadata reports imagery and, if `optimise` is set, also
/// carries a capture date.
#[must_use]
pub fn is_metadata_acceptable(metadata: &StreetViewMetadata, optimise: bool) -> bool {
    if metadata.status != MetadataStatus::Ok {
        return false;
    }
    !optimise || metadata.capture_date().is_some()
}
