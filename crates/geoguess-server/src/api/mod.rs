mod areas;
mod sampling;
mod streetview;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geoguess_core::ErrorKind;
use geoguess_geo::BoundaryGeometry;
use geoguess_geocoder::AreaResolver;
use geoguess_streetview::StreetViewClient;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub resolver: AreaResolver,
    pub streetview: StreetViewClient,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    google_api_key_configured: bool,
    cached_places: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn bad_request(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, ErrorKind::InvalidInput.code(), message)
    }

    /// A failed background task; rendered as 500.
    pub fn internal(request_id: impl Into<String>, error: &impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "background task failed");
        Self::new(request_id, "internal_error", "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" | "no_geometry" | "no_candidates" | "coverage_exhausted" => {
                StatusCode::NOT_FOUND
            }
            "bad_request" => StatusCode::BAD_REQUEST,
            "invalid_geometry" | "sampling_exhausted" => StatusCode::UNPROCESSABLE_ENTITY,
            "transport_error" => StatusCode::BAD_GATEWAY,
            "configuration_error" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Renders a library error as an API error, logging it by severity.
pub(super) fn map_error(
    request_id: String,
    kind: ErrorKind,
    error: &impl std::fmt::Display,
) -> ApiError {
    match kind {
        ErrorKind::Transport | ErrorKind::Configuration => {
            tracing::error!(error = %error, code = kind.code(), "request failed");
        }
        _ => tracing::warn!(error = %error, code = kind.code(), "request rejected"),
    }
    ApiError::new(request_id, kind.code(), error.to_string())
}

/// Resolves the area a request should sample from: an inline GeoJSON area
/// wins over a city, and neither means the whole globe.
pub(super) async fn request_domain(
    state: &AppState,
    request_id: &str,
    geojson: Option<serde_json::Value>,
    city: Option<&str>,
    country: Option<&str>,
) -> Result<Option<Arc<BoundaryGeometry>>, ApiError> {
    if let Some(value) = geojson {
        return BoundaryGeometry::from_json_value(value)
            .map(|domain| Some(Arc::new(domain)))
            .map_err(|e| map_error(request_id.to_owned(), e.kind(), &e));
    }
    match city {
        Some(city) if !city.trim().is_empty() => state
            .resolver
            .sampling_domain(city, country)
            .await
            .map(Some)
            .map_err(|e| map_error(request_id.to_owned(), e.kind(), &e)),
        _ => Ok(None),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/streetview/metadata", get(streetview::get_metadata))
        .route("/streetview/random", post(streetview::random_streetview))
        .route("/random-point", post(sampling::random_points))
        .route("/city-geojson", get(areas::city_geojson))
        .route("/areas", get(areas::list_areas))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            google_api_key_configured: state.streetview.has_api_key(),
            cached_places: state.resolver.cache().len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
