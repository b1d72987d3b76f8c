//! Coverage search: sample a point, ask for imagery nearby, retry until
//! something acceptable turns up or the attempt budget runs out.
//!
//! Without a domain the point is drawn uniformly over the globe with a wide
//! search radius. Transport failures end the search immediately; only
//! unacceptable metadata leads to another attempt.
//!
//! Rejection sampling inside a domain runs on the blocking pool; the point
//! source is moved into each blocking task and handed back afterwards.

use std::sync::Arc;

use geoguess_geo::{
    global_random_point, sample_point, BoundaryGeometry, GeoError, PointSource, SampleOptions,
    SampledPoint,
};
use serde::Serialize;

use crate::client::MetadataLookup;
use crate::error::StreetViewError;
use crate::metadata::{is_metadata_acceptable, MetadataStatus, StreetViewMetadata};

pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
pub const MIN_RADIUS_METERS: u32 = 50;
/// Radius used when searching the whole globe.
pub const GLOBAL_RADIUS_METERS: u32 = 100_000;

const KM_PER_DEGREE: f64 = 111.0;
const RADIUS_SPAN_FACTOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageOptions {
    pub max_attempts: usize,
    /// Fixed search radius in meters; derived from the domain when unset.
    pub radius: Option<u32>,
    /// Include user-contributed panoramas instead of official imagery only.
    pub all_panorama: bool,
    /// Also require a capture date on accepted metadata.
    pub optimise: bool,
    pub sample: SampleOptions,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            radius: None,
            all_panorama: false,
            optimise: true,
            sample: SampleOptions::default(),
        }
    }
}

/// One iteration of the search, kept only for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageAttempt {
    pub attempt: usize,
    pub point: SampledPoint,
    pub radius: u32,
    pub status: MetadataStatus,
    pub accepted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageResult {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u32,
    pub metadata: StreetViewMetadata,
    pub attempts: usize,
}

/// Search radius for a domain: ten times its larger bounding-box span in
/// kilometers, read as meters, never below [`MIN_RADIUS_METERS`].
#[must_use]
pub fn estimate_radius(domain: &BoundaryGeometry) -> u32 {
    let bbox = domain.bounding_box();
    let span_km = bbox.width().abs().max(bbox.height().abs()) * KM_PER_DEGREE;
    let scaled = (span_km * RADIUS_SPAN_FACTOR).trunc();
    // Saturating float-to-int cast; NaN maps to zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let radius = scaled as u32;
    radius.max(MIN_RADIUS_METERS)
}

/// Runs the coverage search loop.
///
/// # Errors
///
/// - [`StreetViewError::InvalidInput`] if `max_attempts` is zero.
/// - [`StreetViewError::Sampling`] if a point cannot be drawn from `domain`.
/// - [`StreetViewError::CoverageExhausted`] if no attempt is accepted.
/// - Any error from the metadata lookup, unchanged.
pub async fn find_coverage<L, S>(
    lookup: &L,
    domain: Option<Arc<BoundaryGeometry>>,
    options: &CoverageOptions,
    mut source: S,
) -> Result<CoverageResult, StreetViewError>
where
    L: MetadataLookup + Sync,
    S: PointSource + Send + 'static,
{
    if options.max_attempts == 0 {
        return Err(StreetViewError::InvalidInput(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    let radius = options.radius.unwrap_or_else(|| match &domain {
        Some(domain) => estimate_radius(domain),
        None => GLOBAL_RADIUS_METERS,
    });

    let mut last_status = None;
    for attempt in 1..=options.max_attempts {
        let (drawn, returned) = draw_point(domain.as_ref(), options.sample, source).await?;
        source = returned;
        let point = drawn?;

        let metadata = lookup.metadata(point, radius, options.all_panorama).await?;
        let accepted = is_metadata_acceptable(&metadata, options.optimise);
        let record = CoverageAttempt {
            attempt,
            point,
            radius,
            status: metadata.status,
            accepted,
        };
        tracing::debug!(?record, "coverage attempt");

        if accepted {
            tracing::info!(
                attempts = attempt,
                latitude = point.latitude,
                longitude = point.longitude,
                radius,
                "street view coverage found"
            );
            return Ok(CoverageResult {
                latitude: point.latitude,
                longitude: point.longitude,
                radius,
                metadata,
                attempts: attempt,
            });
        }
        last_status = Some(metadata.status);
    }

    tracing::warn!(
        attempts = options.max_attempts,
        last_status = ?last_status,
        "street view coverage exhausted"
    );
    Err(StreetViewError::CoverageExhausted {
        attempts: options.max_attempts,
        last_status,
    })
}

/// Draws one point, from `domain` on the blocking pool or from the whole
/// globe inline. The source is returned alongside the outcome.
async fn draw_point<S>(
    domain: Option<&Arc<BoundaryGeometry>>,
    sample: SampleOptions,
    mut source: S,
) -> Result<(Result<SampledPoint, GeoError>, S), StreetViewError>
where
    S: PointSource + Send + 'static,
{
    match domain {
        Some(domain) => {
            let domain = Arc::clone(domain);
            let drawn = tokio::task::spawn_blocking(move || {
                let point = sample_point(&domain, &sample, &mut source);
                (point, source)
            })
            .await?;
            Ok(drawn)
        }
        None => {
            let point = global_random_point(&mut source);
            Ok((Ok(point), source))
        }
    }
}
