//! Area resolution engine: boundary lookup, keyword-driven sub-area
//! discovery and the persisted sub-area cache.

pub mod boundary;
pub mod cache;
pub mod client;
pub mod discovery;
pub mod error;
pub mod keywords;
pub mod resolver;
pub mod types;

pub use cache::{
    cache_file_path, read_cache_file, write_cache_file, AreaCache, AreaCacheEntry, CacheFile,
};
pub use client::{NominatimClient, SearchRequest};
pub use discovery::{discover_sub_areas, DiscoveryOptions, MAX_CANDIDATES};
pub use error::{CacheError, GeocoderError};
pub use keywords::CENTER_KEYWORDS;
pub use resolver::AreaResolver;
pub use types::{CandidateArea, Place, PlaceMetadata, Provenance, ResolvedBoundary};
