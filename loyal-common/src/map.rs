//! Map collaborator seam
//!
//! Tile rendering, panning and zooming belong to whatever draws the map.
//! The core only needs to place and remove markers, move the viewport and
//! show the device position.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::geo::{GeoFix, GeoPoint, RegionBounds};
use crate::model::{Gender, Person};

/// Zoom used when flying to a single person
pub const PERSON_ZOOM: u8 = 16;

/// Zoom used when centering on the device position
pub const LOCATE_ZOOM: u8 = 15;

/// A person's pin as the map draws it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub person_id: String,
    pub location: GeoPoint,
    /// Selects the boy/girl icon
    pub gender: Gender,
    /// First name shown under the pin
    pub label: String,
    pub selected: bool,
}

impl Marker {
    pub fn for_person(person: &Person, selected: bool) -> Self {
        Self {
            person_id: person.id.clone(),
            location: person.location,
            gender: person.gender,
            label: person.first_name().to_string(),
            selected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
}

/// Capabilities the core uses from the map library
pub trait MapSurface: Send {
    /// Add the marker, or replace the one with the same person id
    fn put_marker(&mut self, marker: Marker);

    fn remove_marker(&mut self, person_id: &str);

    fn fly_to(&mut self, center: GeoPoint, zoom: u8);

    fn show_user_location(&mut self, fix: GeoFix);
}

/// Map surface that records what should be drawn
///
/// Used by the web service: the browser renders the recorded markers and
/// viewport with its map library.
#[derive(Debug, Clone, Serialize)]
pub struct MarkerLayer {
    markers: BTreeMap<String, Marker>,
    viewport: Viewport,
    user_location: Option<GeoFix>,
    /// Bumped on every change so the browser can skip redundant redraws
    revision: u64,
}

impl MarkerLayer {
    pub fn new(region: &RegionBounds) -> Self {
        Self {
            markers: BTreeMap::new(),
            viewport: Viewport {
                center: region.center,
                zoom: region.zoom,
            },
            user_location: None,
            revision: 0,
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.values()
    }

    pub fn marker(&self, person_id: &str) -> Option<&Marker> {
        self.markers.get(person_id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn user_location(&self) -> Option<GeoFix> {
        self.user_location
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl MapSurface for MarkerLayer {
    fn put_marker(&mut self, marker: Marker) {
        if self.markers.get(&marker.person_id) != Some(&marker) {
            self.markers.insert(marker.person_id.clone(), marker);
            self.revision += 1;
        }
    }

    fn remove_marker(&mut self, person_id: &str) {
        if self.markers.remove(person_id).is_some() {
            self.revision += 1;
        }
    }

    fn fly_to(&mut self, center: GeoPoint, zoom: u8) {
        self.viewport = Viewport { center, zoom };
        self.revision += 1;
    }

    fn show_user_location(&mut self, fix: GeoFix) {
        self.user_location = Some(fix);
        self.revision += 1;
    }
}
