//! # Loyal Finder Common Library
//!
//! Client-side core of the Loyal Finder map:
//! - Person records and derived vote figures
//! - Store adapters for the `people` table
//! - Pin registry, vote engine and placement flow
//! - Leaderboard and search views
//! - Map session tying the registry to a map surface
//! - Configuration loading

pub mod config;
pub mod error;
pub mod geo;
pub mod leaderboard;
pub mod map;
pub mod model;
pub mod placement;
pub mod registry;
pub mod search;
pub mod seed;
pub mod session;
pub mod store;
pub mod vote;

pub use error::{Error, GeolocationError, Result, StoreError, ValidationError};
pub use model::{Gender, NewPerson, Person, VoteKind};
pub use session::MapSession;
pub use store::PersonStore;
