//! Street View imagery metadata client and the coverage search loop that
//! retries random points until imagery is found.

pub mod client;
pub mod coverage;
pub mod error;
pub mod metadata;

pub use client::{MetadataLookup, StreetViewClient};
pub use coverage::{
    estimate_radius, find_coverage, CoverageAttempt, CoverageOptions, CoverageResult,
    DEFAULT_MAX_ATTEMPTS, GLOBAL_RADIUS_METERS, MIN_RADIUS_METERS,
};
pub use error::StreetViewError;
pub use metadata::{is_metadata_acceptable, MetadataLocation, MetadataStatus, StreetViewMetadata};
