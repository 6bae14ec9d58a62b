//! loyal-map library - map web service
//!
//! Hosts one map session (registry, placement flow, marker layer) and
//! exposes it as a JSON API next to the browser page that renders it.

use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use loyal_common::geo::RegionBounds;
use loyal_common::map::MarkerLayer;
use loyal_common::{MapSession, PersonStore};

pub mod api;
pub mod error;

/// Session type served by this module
pub type Session = MapSession<MarkerLayer>;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The map session; never held across a store call
    pub session: Arc<Mutex<Session>>,
    /// Store the session reads from and writes to
    pub store: Arc<dyn PersonStore>,
    /// Held from vote lookup until the vote is applied, so each vote is
    /// computed from the previous one's result
    pub vote_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn PersonStore>, region: RegionBounds) -> Self {
        let layer = MarkerLayer::new(&region);
        Self {
            session: Arc::new(Mutex::new(MapSession::new(region, layer))),
            store,
            vote_gate: Arc::new(Mutex::new(())),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    let api = Router::new()
        .route("/api/people", get(api::list_people))
        .route("/api/people/refresh", post(api::refresh_people))
        .route("/api/people/:id/select", post(api::select_person))
        .route("/api/people/:id/toggle", post(api::toggle_pin))
        .route("/api/people/:id/vote", post(api::cast_vote))
        .route(
            "/api/selection",
            get(api::get_selection).delete(api::clear_selection),
        )
        .route("/api/leaderboard", get(api::get_leaderboard))
        .route("/api/leaderboard/:id/select", post(api::select_from_leaderboard))
        .route("/api/placement", get(api::get_placement))
        .route("/api/placement/toggle", post(api::toggle_placement))
        .route("/api/placement/cancel", post(api::cancel_placement))
        .route("/api/placement/pick", post(api::pick_location))
        .route("/api/placement/draft", put(api::update_draft))
        .route("/api/placement/submit", post(api::submit_placement))
        .route("/api/map", get(api::get_map))
        .route("/api/map/locate", post(api::locate));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(api)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
