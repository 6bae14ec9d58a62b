//! Map view endpoints: drawn markers, viewport, device position

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use loyal_common::geo::{GeoFix, GeoPoint, RegionBounds, ReportedPosition};
use loyal_common::map::MarkerLayer;
use loyal_common::GeolocationError;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub layer: MarkerLayer,
    pub region: RegionBounds,
}

/// GET /api/map
pub async fn get_map(State(state): State<AppState>) -> Json<MapResponse> {
    let session = state.session.lock().await;
    Json(MapResponse {
        layer: session.map().clone(),
        region: session.region().clone(),
    })
}

/// Outcome of the browser's "get current position" call
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LocateRequest {
    Fix {
        lat: f64,
        lng: f64,
        #[serde(default)]
        accuracy: f64,
    },
    Failure {
        error: LocateFailure,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocateFailure {
    PermissionDenied,
    Timeout,
    Unavailable,
}

impl From<LocateRequest> for ReportedPosition {
    fn from(request: LocateRequest) -> Self {
        let outcome = match request {
            LocateRequest::Fix { lat, lng, accuracy } => Ok(GeoFix {
                point: GeoPoint::new(lat, lng),
                accuracy_m: accuracy,
            }),
            LocateRequest::Failure { error, message } => Err(match error {
                LocateFailure::PermissionDenied => GeolocationError::PermissionDenied,
                LocateFailure::Timeout => GeolocationError::Timeout,
                LocateFailure::Unavailable => GeolocationError::Unavailable(
                    message.unwrap_or_else(|| "no position".to_string()),
                ),
            }),
        };
        ReportedPosition(outcome)
    }
}

/// POST /api/map/locate
///
/// Shows the reported position and centers the map on it. A reported
/// failure comes back as an error without touching the map.
pub async fn locate(
    State(state): State<AppState>,
    Json(request): Json<LocateRequest>,
) -> ApiResult<Json<GeoFix>> {
    let position = ReportedPosition::from(request);
    let fix = state.session.lock().await.locate(&position).await?;
    Ok(Json(fix))
}
