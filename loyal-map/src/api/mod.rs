//! HTTP API handlers for loyal-map

pub mod health;
pub mod map;
pub mod people;
pub mod placement;
pub mod ui;
pub mod votes;

pub use health::health_routes;
pub use map::{get_map, locate};
pub use people::{
    clear_selection, get_leaderboard, get_selection, list_people, refresh_people,
    select_from_leaderboard, select_person, toggle_pin,
};
pub use placement::{
    cancel_placement, get_placement, pick_location, submit_placement, toggle_placement,
    update_draft,
};
pub use ui::{serve_app_js, serve_index};
pub use votes::cast_vote;
