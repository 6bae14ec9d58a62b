//! Placement flow endpoints: add-person toggle, map pick, form, submit

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use loyal_common::geo::GeoPoint;
use loyal_common::placement::{PersonDraft, PlacementState};

use crate::error::ApiResult;
use crate::{AppState, Session};

use super::people::reload;

/// Placement state plus the form as typed so far
#[derive(Debug, Serialize)]
pub struct PlacementResponse {
    #[serde(flatten)]
    pub state: PlacementState,
    pub draft: PersonDraft,
}

fn placement_response(session: &Session) -> Json<PlacementResponse> {
    Json(PlacementResponse {
        state: session.placement().clone(),
        draft: session.draft().clone(),
    })
}

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct PickResponse {
    /// False when the flow was not picking and the tap was ignored
    pub accepted: bool,
    #[serde(flatten)]
    pub placement: PlacementResponse,
}

/// GET /api/placement
pub async fn get_placement(State(state): State<AppState>) -> Json<PlacementResponse> {
    placement_response(&*state.session.lock().await)
}

/// POST /api/placement/toggle
pub async fn toggle_placement(State(state): State<AppState>) -> ApiResult<Json<PlacementResponse>> {
    let mut session = state.session.lock().await;
    session.toggle_add_person()?;
    Ok(placement_response(&session))
}

/// POST /api/placement/cancel
pub async fn cancel_placement(State(state): State<AppState>) -> ApiResult<Json<PlacementResponse>> {
    let mut session = state.session.lock().await;
    session.cancel_placement()?;
    Ok(placement_response(&session))
}

/// POST /api/placement/pick
pub async fn pick_location(
    State(state): State<AppState>,
    Json(request): Json<PickRequest>,
) -> ApiResult<Json<PickResponse>> {
    let mut session = state.session.lock().await;
    let accepted = session.map_clicked(GeoPoint::new(request.lat, request.lng))?;
    let Json(placement) = placement_response(&session);
    Ok(Json(PickResponse {
        accepted,
        placement,
    }))
}

/// PUT /api/placement/draft
pub async fn update_draft(
    State(state): State<AppState>,
    Json(draft): Json<PersonDraft>,
) -> ApiResult<Json<PlacementResponse>> {
    let mut session = state.session.lock().await;
    session.update_draft(draft)?;
    Ok(placement_response(&session))
}

/// POST /api/placement/submit
///
/// Inserts the person, then reloads the people. A failed reload after a
/// successful insert is logged only; the person is already stored.
pub async fn submit_placement(State(state): State<AppState>) -> ApiResult<Json<PlacementResponse>> {
    let person = state.session.lock().await.begin_submit()?;
    let result = state.store.insert(&person).await;
    state.session.lock().await.finish_submit(result)?;

    if let Err(e) = reload(&state).await {
        warn!(error = %e, "Reload after adding person failed");
    }

    Ok(placement_response(&*state.session.lock().await))
}
