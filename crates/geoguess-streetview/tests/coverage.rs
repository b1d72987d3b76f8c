//! Coverage search loop against scripted metadata stubs and a wiremock
//! metadata endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use geo::{Coord, Rect};
use geoguess_geo::{
    BoundaryGeometry, GeoError, PointSource, RandomPointSource, SampleOptions, SampledPoint,
};
use geoguess_streetview::{
    find_coverage, CoverageOptions, MetadataLookup, MetadataStatus, StreetViewClient,
    StreetViewError, StreetViewMetadata, GLOBAL_RADIUS_METERS,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Returns `NOT_FOUND` until call number `accept_on`, then a dated `OK`.
struct ScriptedLookup {
    accept_on: Option<usize>,
    calls: AtomicUsize,
    radii: Mutex<Vec<u32>>,
}

impl ScriptedLookup {
    fn accepting_on(call: usize) -> Self {
        Self {
            accept_on: Some(call),
            calls: AtomicUsize::new(0),
            radii: Mutex::new(Vec::new()),
        }
    }

    fn never() -> Self {
        Self {
            accept_on: None,
            calls: AtomicUsize::new(0),
            radii: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MetadataLookup for ScriptedLookup {
    async fn metadata(
        &self,
        _point: SampledPoint,
        radius: u32,
        _all_panorama: bool,
    ) -> Result<StreetViewMetadata, StreetViewError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.radii.lock().unwrap().push(radius);
        let body = if Some(call) == self.accept_on {
            json!({ "status": "OK", "date": "2022-05", "pano_id": format!("pano-{call}") })
        } else {
            json!({ "status": "NOT_FOUND" })
        };
        Ok(serde_json::from_value(body).unwrap())
    }
}

fn square(size: f64) -> Arc<BoundaryGeometry> {
    Arc::new(
        BoundaryGeometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[[2.0, 48.0], [2.0 + size, 48.0], [2.0 + size, 48.0 + size], [2.0, 48.0 + size], [2.0, 48.0]]]
        }))
        .unwrap(),
    )
}

/// Always proposes the bounding box's top-right corner.
struct CornerSource;

impl PointSource for CornerSource {
    fn point_in(&mut self, bounds: &Rect<f64>) -> Coord<f64> {
        bounds.max()
    }

    fn unit(&mut self) -> f64 {
        0.0
    }
}

#[tokio::test]
async fn always_not_found_exhausts_exactly_max_attempts() {
    let lookup = ScriptedLookup::never();
    let options = CoverageOptions {
        max_attempts: 7,
        ..CoverageOptions::default()
    };
    let source = RandomPointSource::seeded(1);

    let err = find_coverage(&lookup, Some(square(0.1)), &options, source)
        .await
        .unwrap_err();

    assert_eq!(lookup.calls(), 7);
    assert!(matches!(
        err,
        StreetViewError::CoverageExhausted {
            attempts: 7,
            last_status: Some(MetadataStatus::NotFound)
        }
    ));
}

#[tokio::test]
async fn accepting_on_third_call_reports_three_attempts() {
    let lookup = ScriptedLookup::accepting_on(3);
    let domain = square(0.1);
    let source = RandomPointSource::seeded(2);

    let result = find_coverage(&lookup, Some(Arc::clone(&domain)), &CoverageOptions::default(), source)
        .await
        .expect("third attempt should be accepted");

    assert_eq!(result.attempts, 3);
    assert_eq!(lookup.calls(), 3);
    assert_eq!(result.metadata.pano_id.as_deref(), Some("pano-3"));
    assert_eq!(result.radius, 111);
    let point = SampledPoint {
        latitude: result.latitude,
        longitude: result.longitude,
    };
    assert!(domain.contains(&point.to_point()));
}

#[tokio::test]
async fn explicit_radius_overrides_heuristic() {
    let lookup = ScriptedLookup::accepting_on(2);
    let options = CoverageOptions {
        radius: Some(750),
        ..CoverageOptions::default()
    };
    let source = RandomPointSource::seeded(3);

    find_coverage(&lookup, Some(square(1.0)), &options, source)
        .await
        .unwrap();
    assert_eq!(*lookup.radii.lock().unwrap(), vec![750, 750]);
}

#[tokio::test]
async fn global_search_uses_wide_radius() {
    let lookup = ScriptedLookup::accepting_on(1);
    let source = RandomPointSource::seeded(4);

    let result = find_coverage(&lookup, None, &CoverageOptions::default(), source)
        .await
        .unwrap();
    assert_eq!(result.radius, GLOBAL_RADIUS_METERS);
    assert!((-90.0..=90.0).contains(&result.latitude));
    assert!((-180.0..=180.0).contains(&result.longitude));
}

#[tokio::test]
async fn zero_attempts_is_invalid_input() {
    let lookup = ScriptedLookup::accepting_on(1);
    let options = CoverageOptions {
        max_attempts: 0,
        ..CoverageOptions::default()
    };
    let source = RandomPointSource::seeded(5);

    let err = find_coverage(&lookup, None, &options, source)
        .await
        .unwrap_err();
    assert!(matches!(err, StreetViewError::InvalidInput(_)));
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn exhausted_sampling_stops_before_any_lookup() {
    let lookup = ScriptedLookup::accepting_on(1);
    let triangle = Arc::new(
        BoundaryGeometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap(),
    );
    let options = CoverageOptions {
        sample: SampleOptions {
            max_attempts: 3,
            center_bias: None,
        },
        ..CoverageOptions::default()
    };

    let err = find_coverage(&lookup, Some(triangle), &options, CornerSource)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StreetViewError::Sampling(GeoError::SamplingExhausted { attempts: 3 })
    ));
    assert_eq!(lookup.calls(), 0);
}

#[tokio::test]
async fn client_sends_expected_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/streetview/metadata"))
        .and(query_param("location", "48.5,2.25"))
        .and(query_param("radius", "50"))
        .and(query_param("key", "test-key"))
        .and(query_param("source", "default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "date": "2019-07",
            "pano_id": "abc",
            "location": { "lat": 48.5001, "lng": 2.2502 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StreetViewClient::with_endpoint(
        &format!("{}/maps/api/streetview/metadata", server.uri()),
        Some("test-key".to_string()),
        "geoguess-test/0.1",
        5,
    )
    .unwrap();
    let meta = client
        .fetch_metadata(
            SampledPoint {
                latitude: 48.5,
                longitude: 2.25,
            },
            50,
            false,
        )
        .await
        .unwrap();

    assert_eq!(meta.status, MetadataStatus::Ok);
    assert_eq!(meta.capture_date(), Some("2019-07"));
}

#[tokio::test]
async fn transport_failure_stops_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        StreetViewClient::with_endpoint(&server.uri(), Some("k".to_string()), "ua", 5).unwrap();
    let source = RandomPointSource::seeded(6);

    let err = find_coverage(&client, None, &CoverageOptions::default(), source)
        .await
        .unwrap_err();
    assert!(matches!(err, StreetViewError::Http(_)));
}

#[tokio::test]
async fn missing_key_fails_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = StreetViewClient::with_endpoint(&server.uri(), None, "ua", 5).unwrap();
    let err = client
        .fetch_metadata(
            SampledPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            50,
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StreetViewError::MissingApiKey));
}
