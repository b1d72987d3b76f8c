//! Keyword-driven sub-area discovery.
//!
//! 1. Derive a viewbox from the boundary's bounding box.
//! 2. Search `"{keyword} {city}[, {country}]"` for every keyword, at most
//!    `concurrency` requests in flight, each preceded by a random jitter.
//! 3. Keep polygon results fully covered by the boundary.
//! 4. After every query has finished, deduplicate by geometry fingerprint,
//!    rank by area descending and truncate to [`MAX_CANDIDATES`].
//!
//! A failed keyword query counts as zero results; only a completely empty
//! merged set is an error.

use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use geo::Rect;
use geoguess_geo::BoundaryGeometry;
use rand::Rng;

use crate::client::{NominatimClient, SearchRequest};
use crate::error::GeocoderError;
use crate::keywords::CENTER_KEYWORDS;
use crate::types::{CandidateArea, Place, Provenance};

/// Upper bound on the number of sub-areas kept per place.
pub const MAX_CANDIDATES: usize = 500;

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub keywords: Vec<String>,
    /// Maximum keyword queries in flight at once.
    pub concurrency: usize,
    pub jitter_min_ms: u64,
    pub jitter_max_ms: u64,
    /// `limit` sent with each keyword query.
    pub result_limit: u32,
    pub request_timeout: Duration,
    pub max_candidates: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            keywords: CENTER_KEYWORDS.iter().map(|k| (*k).to_string()).collect(),
            concurrency: 10,
            jitter_min_ms: 50,
            jitter_max_ms: 200,
            result_limit: 50,
            request_timeout: Duration::from_secs(30),
            max_candidates: MAX_CANDIDATES,
        }
    }
}

impl DiscoveryOptions {
    #[must_use]
    pub fn from_app_config(config: &geoguess_core::AppConfig) -> Self {
        Self {
            concurrency: config.discovery_concurrency,
            jitter_min_ms: config.discovery_jitter_min_ms,
            jitter_max_ms: config.discovery_jitter_max_ms,
            result_limit: config.discovery_result_limit,
            request_timeout: Duration::from_secs(config.discovery_timeout_secs),
            ..Self::default()
        }
    }

    fn jitter(&self) -> Duration {
        let max = self.jitter_max_ms.max(self.jitter_min_ms);
        let ms = rand::rng().random_range(self.jitter_min_ms..=max);
        Duration::from_millis(ms)
    }
}

/// Result of one keyword task, tagged with the keyword's list position so
/// the reducer can process outcomes in a fixed order.
type KeywordOutcome = (usize, String, Result<Vec<CandidateArea>, GeocoderError>);

/// Discovers sub-areas of `boundary` via the keyword list.
///
/// # Errors
///
/// Returns [`GeocoderError::NoCandidates`] if no keyword query yields a
/// usable sub-area. Individual query failures are logged and never
/// surfaced.
pub async fn discover_sub_areas(
    client: &NominatimClient,
    boundary: &BoundaryGeometry,
    city: &str,
    country: Option<&str>,
    options: &DiscoveryOptions,
) -> Result<Vec<CandidateArea>, GeocoderError> {
    let viewbox = boundary.bounding_box();
    let place_suffix = place_suffix(city, country);

    let outcomes: Vec<KeywordOutcome> = stream::iter(options.keywords.iter().cloned().enumerate())
        .map(|(index, keyword)| {
            let query = format!("{keyword} {place_suffix}");
            async move {
                let task = search_keyword(client, boundary, viewbox, &keyword, &query, options);
                guarded(index, &keyword, task).await
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let keyword_count = outcomes.len();
    let (candidates, failed) = merge_outcomes(outcomes, options.max_candidates);

    if candidates.is_empty() {
        return Err(GeocoderError::NoCandidates {
            place: place_suffix,
            keywords: keyword_count,
            failed,
        });
    }

    tracing::info!(
        place = %place_suffix,
        candidates = candidates.len(),
        keywords = keyword_count,
        failed,
        "sub-area discovery complete"
    );
    Ok(candidates)
}

/// Runs one keyword task, turning a panic into a failed outcome so sibling
/// tasks and the merge are unaffected.
async fn guarded<F>(index: usize, keyword: &str, task: F) -> KeywordOutcome
where
    F: Future<Output = Result<Vec<CandidateArea>, GeocoderError>>,
{
    let result = match AssertUnwindSafe(task).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(GeocoderError::TaskPanicked {
            keyword: keyword.to_string(),
        }),
    };
    (index, keyword.to_string(), result)
}

fn place_suffix(city: &str, country: Option<&str>) -> String {
    let city = city.trim();
    match country.map(str::trim) {
        Some(country) if !country.is_empty() => format!("{city}, {country}"),
        _ => city.to_string(),
    }
}

async fn search_keyword(
    client: &NominatimClient,
    boundary: &BoundaryGeometry,
    viewbox: Rect<f64>,
    keyword: &str,
    query: &str,
    options: &DiscoveryOptions,
) -> Result<Vec<CandidateArea>, GeocoderError> {
    tokio::time::sleep(options.jitter()).await;

    let request = SearchRequest {
        query,
        limit: options.result_limit,
        viewbox: Some(viewbox),
        timeout: Some(options.request_timeout),
    };
    let places = client.search(&request).await?;
    Ok(contained_candidates(boundary, keyword, places))
}

/// Turns raw search results into candidates covered by `boundary`.
///
/// Non-polygon results, unparseable shapes and anything reaching outside
/// the boundary are dropped.
fn contained_candidates(
    boundary: &BoundaryGeometry,
    keyword: &str,
    places: Vec<Place>,
) -> Vec<CandidateArea> {
    let mut out = Vec::new();
    for place in places {
        if !place.has_polygon() {
            continue;
        }
        let metadata = place.metadata();
        let Some(raw) = place.geojson else {
            continue;
        };
        let geometry = match BoundaryGeometry::from_json_value(raw) {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::debug!(keyword, error = %e, "skipping unparseable sub-area");
                continue;
            }
        };
        if !boundary.covers(&geometry) {
            continue;
        }
        out.push(CandidateArea::new(
            geometry,
            Provenance {
                display_name: metadata.display_name,
                feature_type: metadata.place_type,
                osm_type: metadata.osm_type,
                osm_id: metadata.osm_id,
                class_tag: metadata.category,
                matched_keyword: keyword.to_string(),
            },
        ));
    }
    out
}

/// Single-threaded reducer run after every keyword task has joined.
///
/// Outcomes are visited in keyword order, so when two keywords return the
/// same geometry the earlier keyword's provenance is kept. Returns the ranked
/// candidates and the number of failed keyword queries.
fn merge_outcomes(
    mut outcomes: Vec<KeywordOutcome>,
    max_candidates: usize,
) -> (Vec<CandidateArea>, usize) {
    outcomes.sort_by_key(|(index, _, _)| *index);

    let mut seen: HashSet<String> = HashSet::new();
    let mut merged: Vec<CandidateArea> = Vec::new();
    let mut failed = 0usize;

    for (_, keyword, result) in outcomes {
        match result {
            Ok(candidates) => {
                for candidate in candidates {
                    if seen.insert(candidate.fingerprint()) {
                        merged.push(candidate);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(keyword, error = %e, "keyword query failed; treating as no results");
            }
        }
    }

    merged.sort_by(|a, b| b.area.total_cmp(&a.area));
    merged.truncate(max_candidates);
    (merged, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(min_x: f64, min_y: f64, size: f64) -> serde_json::Value {
        let (max_x, max_y) = (min_x + size, min_y + size);
        json!({
            "type": "Polygon",
            "coordinates": [[
                [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
            ]]
        })
    }

    fn place(name: &str, geojson: Option<serde_json::Value>) -> Place {
        Place {
            display_name: Some(name.to_string()),
            place_type: Some("suburb".to_string()),
            osm_type: Some("relation".to_string()),
            osm_id: Some(1),
            category: Some("boundary".to_string()),
            geojson,
        }
    }

    fn boundary() -> BoundaryGeometry {
        BoundaryGeometry::from_json_value(square(0.0, 0.0, 10.0)).unwrap()
    }

    fn candidate(keyword: &str, min_x: f64, size: f64) -> CandidateArea {
        let geometry = BoundaryGeometry::from_json_value(square(min_x, 0.0, size)).unwrap();
        CandidateArea::new(
            geometry,
            Provenance {
                display_name: None,
                feature_type: None,
                osm_type: None,
                osm_id: None,
                class_tag: None,
                matched_keyword: keyword.to_string(),
            },
        )
    }

    #[test]
    fn place_suffix_formats_country() {
        assert_eq!(place_suffix(" Lyon ", Some("France")), "Lyon, France");
        assert_eq!(place_suffix("Lyon", Some("")), "Lyon");
        assert_eq!(place_suffix("Lyon", None), "Lyon");
    }

    #[test]
    fn contained_candidates_filters_shapes() {
        let places = vec![
            place("inside", Some(square(1.0, 1.0, 2.0))),
            place("straddling", Some(square(9.0, 9.0, 2.0))),
            place("point", Some(json!({"type": "Point", "coordinates": [1.0, 1.0]}))),
            place("no geometry", None),
            place(
                "garbage polygon",
                Some(json!({"type": "Polygon", "coordinates": "nope"})),
            ),
        ];
        let kept = contained_candidates(&boundary(), "downtown", places);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].provenance.display_name.as_deref(), Some("inside"));
        assert_eq!(kept[0].provenance.matched_keyword, "downtown");
        assert!((kept[0].area - 4.0).abs() < 1e-9);
    }

    #[test]
    fn merge_deduplicates_across_keywords_and_ranks_by_area() {
        let outcomes: Vec<KeywordOutcome> = vec![
            (
                1,
                "cbd".to_string(),
                Ok(vec![candidate("cbd", 0.0, 1.0), candidate("cbd", 2.0, 3.0)]),
            ),
            (0, "downtown".to_string(), Ok(vec![candidate("downtown", 0.0, 1.0)])),
            (
                2,
                "centro".to_string(),
                Err(GeocoderError::InvalidInput("boom".to_string())),
            ),
        ];
        let (merged, failed) = merge_outcomes(outcomes, MAX_CANDIDATES);
        assert_eq!(failed, 1);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].area - 9.0).abs() < 1e-9);
        assert!((merged[1].area - 1.0).abs() < 1e-9);
        // Lower keyword index wins the duplicate.
        assert_eq!(merged[1].provenance.matched_keyword, "downtown");
    }

    #[tokio::test]
    async fn panicking_keyword_task_leaves_siblings_intact() {
        async fn exploding() -> Result<Vec<CandidateArea>, GeocoderError> {
            panic!("keyword task blew up")
        }

        let (first, second, third) = futures::join!(
            guarded(0, "downtown", exploding()),
            guarded(1, "cbd", async { Ok(vec![candidate("cbd", 0.0, 2.0)]) }),
            guarded(2, "centro", async { Ok(vec![candidate("centro", 3.0, 1.0)]) }),
        );
        assert!(matches!(
            &first.2,
            Err(GeocoderError::TaskPanicked { keyword }) if keyword == "downtown"
        ));

        let (merged, failed) = merge_outcomes(vec![third, first, second], MAX_CANDIDATES);
        assert_eq!(failed, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].provenance.matched_keyword, "cbd");
        assert_eq!(merged[1].provenance.matched_keyword, "centro");
    }

    #[test]
    fn merge_truncates_to_cap() {
        let many: Vec<CandidateArea> = (0..20u32)
            .map(|i| candidate("downtown", 0.0, 0.1 + f64::from(i) * 0.01))
            .collect();
        let (merged, _) = merge_outcomes(vec![(0, "downtown".to_string(), Ok(many))], 5);
        assert_eq!(merged.len(), 5);
        assert!(merged.windows(2).all(|w| w[0].area >= w[1].area));
    }

    #[test]
    fn jitter_stays_in_window() {
        let options = DiscoveryOptions {
            jitter_min_ms: 10,
            jitter_max_ms: 20,
            ..DiscoveryOptions::default()
        };
        for _ in 0..100 {
            let d = options.jitter();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }
}
