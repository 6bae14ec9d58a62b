//! Vote endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use loyal_common::model::{ProfileCard, VoteKind};
use loyal_common::vote::VoteState;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub kind: VoteKind,
}

/// Result of a stored vote; the card on the page is closed
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub kind: VoteKind,
    pub state: VoteState,
    /// Person after the vote, or `None` if a reload removed them meanwhile
    pub person: Option<ProfileCard>,
}

/// POST /api/people/:id/vote
///
/// The store write happens first; the local counter moves only when it
/// succeeded. Votes are serialized by the vote gate while the session
/// itself stays available to other requests during the write.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let _gate = state.vote_gate.lock().await;

    let ticket = state.session.lock().await.begin_vote(&id, request.kind)?;
    let outcome = ticket.submit(state.store.as_ref()).await;

    let mut session = state.session.lock().await;
    session.finish_vote(&ticket, outcome)?;

    Ok(Json(VoteResponse {
        kind: request.kind,
        state: session.vote_state().clone(),
        person: session.registry().get(&id).map(ProfileCard::from),
    }))
}
