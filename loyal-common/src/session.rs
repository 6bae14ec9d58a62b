//! Map session: the owned context composing the registry with the map
//!
//! One session per map view. It owns the pin registry, the placement flow,
//! the vote engine and the map surface, and keeps the surface's markers
//! equal to the registry's visible set after every change.
//!
//! Store handles are passed per call. Async operations also come in
//! `begin_*`/`finish_*` halves so a session behind a lock need not be held
//! while a store request is in flight.

use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::geo::{GeoFix, GeoPoint, Geolocator, RegionBounds};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::map::{MapSurface, Marker, LOCATE_ZOOM, PERSON_ZOOM};
use crate::model::{GenderCounts, NewPerson, Person, ProfileCard, VoteKind};
use crate::placement::{PersonDraft, PlacementFlow, PlacementState};
use crate::registry::{LoadTicket, PinRegistry};
use crate::store::PersonStore;
use crate::vote::{VoteEngine, VoteReceipt, VoteState, VoteTicket};
use crate::{Error, Result};

pub struct MapSession<M: MapSurface> {
    registry: PinRegistry,
    placement: PlacementFlow,
    votes: VoteEngine,
    map: M,
    region: RegionBounds,
    /// Person ids currently drawn on `map`
    placed: HashSet<String>,
}

impl<M: MapSurface> MapSession<M> {
    pub fn new(region: RegionBounds, map: M) -> Self {
        Self {
            registry: PinRegistry::new(),
            placement: PlacementFlow::new(region.clone()),
            votes: VoteEngine::new(),
            map,
            region,
            placed: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    pub fn placement(&self) -> &PlacementState {
        self.placement.state()
    }

    pub fn draft(&self) -> &PersonDraft {
        self.placement.draft()
    }

    pub fn vote_state(&self) -> &VoteState {
        self.votes.state()
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn region(&self) -> &RegionBounds {
        &self.region
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// User-triggered reload: clears the selection, then loads
    pub async fn refresh(&mut self, store: &dyn PersonStore) -> Result<()> {
        self.registry.deselect();
        let ticket = self.begin_load();
        let result = store.list_all().await;
        self.finish_load(ticket, result).map(|_| ())
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.registry.begin_load()
    }

    /// Apply a load result and redraw; `Ok(false)` if it was stale
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<Vec<Person>, StoreError>,
    ) -> Result<bool> {
        let outcome = self.registry.finish_load(ticket, result);
        self.sync_markers();
        outcome
    }

    // ---------------------------------------------------------------------
    // Search and selection
    // ---------------------------------------------------------------------

    pub fn set_query(&mut self, query: &str) {
        self.registry.set_query(query);
        self.sync_markers();
    }

    pub fn select(&mut self, id: &str) -> bool {
        let selected = self.registry.select(id);
        self.sync_markers();
        selected
    }

    pub fn deselect(&mut self) {
        self.registry.deselect();
        self.sync_markers();
    }

    /// Pin click: selects, or deselects when the pin is already selected
    pub fn toggle_pin(&mut self, id: &str) -> bool {
        if self.registry.selected_id() == Some(id) {
            self.deselect();
            false
        } else {
            self.select(id)
        }
    }

    /// Leaderboard click: select and move the map to the person
    pub fn select_from_leaderboard(&mut self, id: &str) -> Result<()> {
        let location = self
            .registry
            .get(id)
            .map(|p| p.location)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.registry.select(id);
        self.map.fly_to(location, PERSON_ZOOM);
        self.sync_markers();
        Ok(())
    }

    pub fn profile_card(&self) -> Option<ProfileCard> {
        self.registry.selected().map(ProfileCard::from)
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::entries(self.registry.all())
    }

    pub fn gender_counts(&self) -> GenderCounts {
        self.registry.gender_counts()
    }

    // ---------------------------------------------------------------------
    // Voting
    // ---------------------------------------------------------------------

    pub async fn cast_vote(
        &mut self,
        store: &dyn PersonStore,
        id: &str,
        kind: VoteKind,
    ) -> Result<()> {
        let result = self
            .votes
            .cast_vote(&mut self.registry, store, id, kind)
            .await;
        self.sync_markers();
        result
    }

    /// First half of [`Self::cast_vote`]; the engine enters `Submitting`
    ///
    /// Callers that release the session during the store write must not
    /// have two votes between `begin_vote` and `finish_vote` at once.
    pub fn begin_vote(&mut self, id: &str, kind: VoteKind) -> Result<VoteTicket> {
        self.votes.begin(&self.registry, id, kind)
    }

    /// Second half of [`Self::cast_vote`]
    pub fn finish_vote(&mut self, ticket: &VoteTicket, outcome: Result<VoteReceipt>) -> Result<()> {
        let result = self.votes.finish(&mut self.registry, ticket, outcome);
        self.sync_markers();
        result
    }

    // ---------------------------------------------------------------------
    // Placement
    // ---------------------------------------------------------------------

    pub fn toggle_add_person(&mut self) -> Result<()> {
        self.placement.toggle_add_person()
    }

    pub fn cancel_placement(&mut self) -> Result<()> {
        self.placement.cancel()
    }

    /// Map tap; `Ok(false)` when not picking
    pub fn map_clicked(&mut self, point: GeoPoint) -> Result<bool> {
        self.placement.pick_location(point)
    }

    pub fn update_draft(&mut self, draft: PersonDraft) -> Result<()> {
        self.placement.update_draft(draft)
    }

    /// Submit the form; on success the people are reloaded
    ///
    /// The reload is best effort: its failure is logged and surfaced through
    /// the registry's load status, not returned.
    pub async fn submit_placement(&mut self, store: &dyn PersonStore) -> Result<()> {
        let person = self.begin_submit()?;
        let result = store.insert(&person).await;
        self.finish_submit(result)?;

        if let Err(e) = self.refresh_after_insert(store).await {
            warn!(error = %e, "Reload after adding person failed");
        }
        Ok(())
    }

    pub fn begin_submit(&mut self) -> Result<NewPerson> {
        self.placement.begin_submit()
    }

    /// Record the insert outcome; the caller reloads after `Ok`
    pub fn finish_submit(&mut self, result: std::result::Result<(), StoreError>) -> Result<()> {
        self.placement.finish_submit(result)
    }

    async fn refresh_after_insert(&mut self, store: &dyn PersonStore) -> Result<()> {
        let ticket = self.begin_load();
        let result = store.list_all().await;
        self.finish_load(ticket, result).map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Geolocation
    // ---------------------------------------------------------------------

    /// One-shot "show me" on the map
    pub async fn locate(&mut self, geolocator: &dyn Geolocator) -> Result<GeoFix> {
        match geolocator.current_position().await {
            Ok(fix) => {
                debug!(lat = fix.point.lat, lng = fix.point.lng, accuracy = fix.accuracy_m, "Located device");
                self.map.show_user_location(fix);
                self.map.fly_to(fix.point, LOCATE_ZOOM);
                Ok(fix)
            }
            Err(e) => {
                warn!(error = %e, "Geolocation failed");
                Err(e.into())
            }
        }
    }

    // ---------------------------------------------------------------------
    // Markers
    // ---------------------------------------------------------------------

    /// Make the drawn markers equal to the visible set
    fn sync_markers(&mut self) {
        let selected = self.registry.selected_id().map(str::to_string);
        let visible: HashSet<String> = self.registry.visible().map(|p| p.id.clone()).collect();

        let hidden: Vec<String> = self.placed.difference(&visible).cloned().collect();
        for id in &hidden {
            self.map.remove_marker(id);
        }

        for person in self.registry.visible() {
            let is_selected = selected.as_deref() == Some(person.id.as_str());
            self.map.put_marker(Marker::for_person(person, is_selected));
        }

        debug!(removed = hidden.len(), shown = visible.len(), "Synced markers");
        self.placed = visible;
    }
}
