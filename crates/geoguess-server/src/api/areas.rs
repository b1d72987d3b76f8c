use axum::{
    extract::rejection::QueryRejection,
    extract::{Query, State},
    Extension, Json,
};
use geoguess_geocoder::CandidateArea;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CityQuery {
    pub city: String,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AreasData {
    place_key: String,
    count: usize,
    source_file: Option<String>,
    areas: geojson::FeatureCollection,
}

pub(super) async fn city_geojson(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<geojson::Feature>>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;
    let boundary = state
        .resolver
        .resolve_boundary(&query.city, query.country.as_deref())
        .await
        .map_err(|e| map_error(req_id.0.clone(), e.kind(), &e))?;

    Ok(Json(ApiResponse {
        data: boundary.to_feature(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_areas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<AreasData>>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;
    let entry = state
        .resolver
        .sub_areas(&query.city, query.country.as_deref())
        .await
        .map_err(|e| map_error(req_id.0.clone(), e.kind(), &e))?;

    let data = AreasData {
        place_key: entry.place_key.to_string(),
        count: entry.areas.len(),
        source_file: entry
            .source_file
            .as_ref()
            .map(|p| p.display().to_string()),
        areas: geojson::FeatureCollection {
            bbox: None,
            features: entry.areas.iter().map(CandidateArea::to_feature).collect(),
            foreign_members: None,
        },
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
