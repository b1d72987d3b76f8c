use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use geoguess_geo::{
    global_random_point, sample_points, RandomPointSource, SampleOptions, SampledPoint,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_error, request_domain, ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_POINTS: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct RandomPointRequest {
    /// Feature, feature collection or bare geometry.
    pub geojson: Option<serde_json::Value>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(default = "default_count")]
    pub count: usize,
    pub center_bias: Option<f64>,
}

fn default_count() -> usize {
    1
}

#[derive(Debug, Serialize)]
pub(super) struct PointItem {
    lat: f64,
    lng: f64,
}

impl From<SampledPoint> for PointItem {
    fn from(p: SampledPoint) -> Self {
        Self {
            lat: p.latitude,
            lng: p.longitude,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct PointsData {
    points: Vec<PointItem>,
}

pub(super) async fn random_points(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RandomPointRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PointsData>>, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;
    if !(1..=MAX_POINTS).contains(&body.count) {
        return Err(ApiError::bad_request(
            req_id.0,
            format!("count must be between 1 and {MAX_POINTS}"),
        ));
    }

    let domain = request_domain(
        &state,
        &req_id.0,
        body.geojson,
        body.city.as_deref(),
        body.country.as_deref(),
    )
    .await?;

    let count = body.count;
    let points = match domain {
        Some(domain) => {
            let options = SampleOptions {
                center_bias: body.center_bias,
                ..SampleOptions::default()
            };
            tokio::task::spawn_blocking(move || {
                let mut source = RandomPointSource::from_os_rng();
                sample_points(&domain, count, &options, &mut source)
            })
            .await
            .map_err(|e| ApiError::internal(req_id.0.clone(), &e))?
            .map_err(|e| map_error(req_id.0.clone(), e.kind(), &e))?
        }
        None => {
            let mut source = RandomPointSource::from_os_rng();
            (0..count).map(|_| global_random_point(&mut source)).collect()
        }
    };

    Ok(Json(ApiResponse {
        data: PointsData {
            points: points.into_iter().map(PointItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
