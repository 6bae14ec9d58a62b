//! Common error types for Loyal Finder

use thiserror::Error;

/// Common result type for Loyal Finder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure talking to the persistent `people` table
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport failure (connection refused, timeout, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// Store answered with a non-success status
    #[error("Store API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded into people rows
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local sqlite backend error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Simulated failure from the in-memory backend
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Network(e.to_string())
        }
    }
}

/// Placement form rejected before any store call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Pick a location on the map first")]
    MissingLocation,

    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Location {lat:.4}, {lng:.4} is outside the map region")]
    OutOfRegion { lat: f64, lng: f64 },
}

/// One-shot device position request failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location request timed out")]
    Timeout,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by registry, vote engine, placement flow and session
#[derive(Error, Debug)]
pub enum Error {
    /// Store operation failed (list or insert)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Person id not present in the loaded set (stale UI reference)
    #[error("Person not found: {0}")]
    NotFound(String),

    /// Vote write failed; local counters were not touched
    #[error("Vote for {id} failed: {source}")]
    VoteFailed {
        id: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operation not allowed in the current placement state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
