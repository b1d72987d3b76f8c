use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    Extension, Json,
};
use geoguess_geo::{RandomPointSource, SampleOptions, SampledPoint};
use geoguess_streetview::{
    find_coverage, CoverageOptions, CoverageResult, StreetViewMetadata, DEFAULT_MAX_ATTEMPTS,
    MIN_RADIUS_METERS,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_error, request_domain, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_RADIUS_METERS: u32 = 500_000;
const MAX_COVERAGE_ATTEMPTS: usize = 1_000;

#[derive(Debug, Deserialize)]
pub(super) struct MetadataQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<u32>,
    #[serde(default)]
    pub all_panorama: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct RandomStreetViewRequest {
    pub geojson: Option<serde_json::Value>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub all_panorama: bool,
    #[serde(default = "default_optimise")]
    pub optimise: bool,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    pub radius: Option<u32>,
    pub center_bias: Option<f64>,
}

fn default_optimise() -> bool {
    true
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn validate_radius(req_id: &str, radius: u32) -> Result<u32, ApiError> {
    if (1..=MAX_RADIUS_METERS).contains(&radius) {
        Ok(radius)
    } else {
        Err(ApiError::bad_request(
            req_id,
            format!("radius must be between 1 and {MAX_RADIUS_METERS}"),
        ))
    }
}

pub(super) async fn get_metadata(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<MetadataQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<StreetViewMetadata>>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(ApiError::bad_request(
            req_id.0,
            "lat must be within ±90 and lng within ±180",
        ));
    }
    let radius = validate_radius(&req_id.0, query.radius.unwrap_or(MIN_RADIUS_METERS))?;

    let point = SampledPoint {
        latitude: query.lat,
        longitude: query.lng,
    };
    let metadata = state
        .streetview
        .fetch_metadata(point, radius, query.all_panorama)
        .await
        .map_err(|e| map_error(req_id.0.clone(), e.kind(), &e))?;

    Ok(Json(ApiResponse {
        data: metadata,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn random_streetview(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RandomStreetViewRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CoverageResult>>, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;
    if !(1..=MAX_COVERAGE_ATTEMPTS).contains(&body.max_attempts) {
        return Err(ApiError::bad_request(
            req_id.0,
            format!("max_attempts must be between 1 and {MAX_COVERAGE_ATTEMPTS}"),
        ));
    }
    let radius = body
        .radius
        .map(|r| validate_radius(&req_id.0, r))
        .transpose()?;

    let domain = request_domain(
        &state,
        &req_id.0,
        body.geojson,
        body.city.as_deref(),
        body.country.as_deref(),
    )
    .await?;

    let options = CoverageOptions {
        max_attempts: body.max_attempts,
        radius,
        all_panorama: body.all_panorama,
        optimise: body.optimise,
        sample: SampleOptions {
            center_bias: body.center_bias,
            ..SampleOptions::default()
        },
    };
    let source = RandomPointSource::from_os_rng();
    let result = find_coverage(&state.streetview, domain, &options, source)
        .await
        .map_err(|e| map_error(req_id.0.clone(), e.kind(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
