//! Coordinates, the operating region and the device geolocation seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GeolocationError;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Bounding box the map is restricted to, plus its initial viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    /// Initial map center
    pub center: GeoPoint,
    /// Initial zoom level
    pub zoom: u8,
}

impl Default for RegionBounds {
    /// Bangladesh, centered on Dhaka
    fn default() -> Self {
        Self {
            min_lat: 20.5,
            max_lat: 26.7,
            min_lng: 88.0,
            max_lng: 92.7,
            center: GeoPoint::new(23.8103, 90.4125),
            zoom: 12,
        }
    }
}

impl RegionBounds {
    /// Inclusive containment check; non-finite points are never inside
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.is_finite()
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    /// Reject inverted or degenerate boxes
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_lat < self.max_lat && self.min_lng < self.max_lng) {
            return Err(format!(
                "region bounds are empty: lat {}..{}, lng {}..{}",
                self.min_lat, self.max_lat, self.min_lng, self.max_lng
            ));
        }
        if !self.contains(self.center) {
            return Err("region center lies outside the region bounds".to_string());
        }
        Ok(())
    }
}

/// One-shot device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub point: GeoPoint,
    /// Accuracy radius in meters
    pub accuracy_m: f64,
}

/// Device geolocation capability ("get current position", no tracking)
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<GeoFix, GeolocationError>;
}

/// Position already obtained elsewhere (e.g. reported by the browser)
#[derive(Debug, Clone)]
pub struct ReportedPosition(pub Result<GeoFix, GeolocationError>);

#[async_trait]
impl Geolocator for ReportedPosition {
    async fn current_position(&self) -> Result<GeoFix, GeolocationError> {
        self.0.clone()
    }
}
