//! People, selection and leaderboard endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use loyal_common::leaderboard::LeaderboardEntry;
use loyal_common::model::{GenderCounts, ProfileCard};
use loyal_common::registry::LoadStatus;
use loyal_common::vote::VoteState;
use loyal_common::Error;

use crate::error::ApiResult;
use crate::{AppState, Session};

#[derive(Debug, Deserialize)]
pub struct PeopleQuery {
    /// Search text; omitted keeps the current query
    pub q: Option<String>,
}

/// Visible people plus the header figures
#[derive(Debug, Serialize)]
pub struct PeopleResponse {
    pub query: String,
    pub status: LoadStatus,
    pub counts: GenderCounts,
    pub total: usize,
    pub selected_id: Option<String>,
    /// Outcome of the most recent vote
    pub last_vote: VoteState,
    pub people: Vec<ProfileCard>,
}

pub(crate) fn people_response(session: &Session) -> PeopleResponse {
    let registry = session.registry();
    PeopleResponse {
        query: registry.query().to_string(),
        status: registry.status().clone(),
        counts: session.gender_counts(),
        total: registry.all().len(),
        selected_id: registry.selected_id().map(str::to_string),
        last_vote: session.vote_state().clone(),
        people: registry.visible().map(ProfileCard::from).collect(),
    }
}

/// Reload the people without holding the session during the store call
///
/// Returns `Ok(false)` if a newer reload finished first.
pub(crate) async fn reload(state: &AppState) -> loyal_common::Result<bool> {
    let ticket = state.session.lock().await.begin_load();
    let result = state.store.list_all().await;
    state.session.lock().await.finish_load(ticket, result)
}

/// GET /api/people?q=
pub async fn list_people(
    State(state): State<AppState>,
    Query(query): Query<PeopleQuery>,
) -> Json<PeopleResponse> {
    let mut session = state.session.lock().await;
    if let Some(q) = query.q {
        session.set_query(&q);
    }
    Json(people_response(&session))
}

/// POST /api/people/refresh
///
/// Clears the selection and reloads. On failure the previous people stay.
pub async fn refresh_people(State(state): State<AppState>) -> ApiResult<Json<PeopleResponse>> {
    state.session.lock().await.deselect();
    reload(&state).await?;
    let session = state.session.lock().await;
    Ok(Json(people_response(&session)))
}

/// POST /api/people/:id/select
pub async fn select_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfileCard>> {
    let mut session = state.session.lock().await;
    if !session.select(&id) {
        return Err(Error::NotFound(id).into());
    }
    profile_card(&session)
}

/// POST /api/people/:id/toggle
///
/// Pin click: selects, or closes the card when the pin is already selected.
pub async fn toggle_pin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Option<ProfileCard>>> {
    let mut session = state.session.lock().await;
    if session.registry().get(&id).is_none() {
        return Err(Error::NotFound(id).into());
    }
    session.toggle_pin(&id);
    Ok(Json(session.profile_card()))
}

/// GET /api/selection
pub async fn get_selection(State(state): State<AppState>) -> Json<Option<ProfileCard>> {
    Json(state.session.lock().await.profile_card())
}

/// DELETE /api/selection
pub async fn clear_selection(State(state): State<AppState>) -> Json<Option<ProfileCard>> {
    state.session.lock().await.deselect();
    Json(None)
}

/// GET /api/leaderboard
pub async fn get_leaderboard(State(state): State<AppState>) -> Json<Vec<LeaderboardEntry>> {
    Json(state.session.lock().await.leaderboard())
}

/// POST /api/leaderboard/:id/select
///
/// Selects the person and moves the map to them.
pub async fn select_from_leaderboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProfileCard>> {
    let mut session = state.session.lock().await;
    session.select_from_leaderboard(&id)?;
    profile_card(&session)
}

fn profile_card(session: &Session) -> ApiResult<Json<ProfileCard>> {
    session
        .profile_card()
        .map(Json)
        .ok_or_else(|| Error::NotFound("selection".to_string()).into())
}
