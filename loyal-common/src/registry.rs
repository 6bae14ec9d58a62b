//! Pin registry: the loaded people, the filtered view and the selection
//!
//! The registry is a cache of the store. It is replaced wholesale by
//! [`PinRegistry::load`] and otherwise only patched by
//! [`PinRegistry::apply_vote_locally`]. Nothing else writes to it.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{Gender, GenderCounts, Person, VoteKind};
use crate::search;
use crate::store::PersonStore;
use crate::{Error, Result};

/// Loading indicator state for the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum LoadStatus {
    NotLoaded,
    Loading,
    Loaded,
    /// Last load failed; previously loaded data is still shown
    Failed(String),
}

/// Handle for one in-flight load
///
/// Loads are numbered; a result older than the last applied one is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Debug)]
pub struct PinRegistry {
    all: Vec<Person>,
    /// Indices into `all` matching `query`, in `all` order
    visible: Vec<usize>,
    query: String,
    selected_id: Option<String>,
    status: LoadStatus,
    issued_generation: u64,
    applied_generation: u64,
}

impl Default for PinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PinRegistry {
    pub fn new() -> Self {
        Self {
            all: Vec::new(),
            visible: Vec::new(),
            query: String::new(),
            selected_id: None,
            status: LoadStatus::NotLoaded,
            issued_generation: 0,
            applied_generation: 0,
        }
    }

    /// Fetch every row and replace the loaded set
    ///
    /// On failure the previous state is kept and the status becomes `Failed`.
    pub async fn load(&mut self, store: &dyn PersonStore) -> Result<()> {
        let ticket = self.begin_load();
        let result = store.list_all().await;
        self.finish_load(ticket, result).map(|_| ())
    }

    /// First half of [`Self::load`] for callers that must not hold the
    /// registry across the store call
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_generation += 1;
        self.status = LoadStatus::Loading;
        LoadTicket {
            generation: self.issued_generation,
        }
    }

    /// Second half of [`Self::load`]
    ///
    /// Returns `Ok(false)` when the result was discarded because a newer
    /// load has already been applied.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: std::result::Result<Vec<Person>, StoreError>,
    ) -> Result<bool> {
        if ticket.generation <= self.applied_generation {
            debug!(
                generation = ticket.generation,
                applied = self.applied_generation,
                "Discarding stale load result"
            );
            return Ok(false);
        }

        match result {
            Ok(people) => {
                self.applied_generation = ticket.generation;
                self.replace_all(people);
                self.status = LoadStatus::Loaded;
                info!(count = self.all.len(), visible = self.visible.len(), "Loaded people");
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load people; keeping previous data");
                self.status = LoadStatus::Failed(e.to_string());
                Err(Error::Store(e))
            }
        }
    }

    fn replace_all(&mut self, people: Vec<Person>) {
        let mut seen = HashSet::with_capacity(people.len());
        let mut unique = Vec::with_capacity(people.len());
        for person in people {
            if seen.insert(person.id.clone()) {
                unique.push(person);
            } else {
                warn!(id = %person.id, "Dropping duplicate person id from store");
            }
        }
        self.all = unique;
        self.recompute_visible();

        if let Some(id) = &self.selected_id {
            if self.get(id).is_none() {
                debug!(id = %id, "Selected person no longer loaded; clearing selection");
                self.selected_id = None;
            }
        }
    }

    fn recompute_visible(&mut self) {
        self.visible = search::filter_indices(&self.all, &self.query);
    }

    /// Change the search query and recompute the visible subset
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.recompute_visible();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    /// Full loaded set, in store order
    pub fn all(&self) -> &[Person] {
        &self.all
    }

    /// People matching the current query, in store order
    pub fn visible(&self) -> impl Iterator<Item = &Person> + '_ {
        self.visible.iter().map(move |&i| &self.all[i])
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.iter().any(|&i| self.all[i].id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.all.iter().find(|p| p.id == id)
    }

    /// Select a loaded person; unknown ids are ignored (returns false)
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            debug!(id = %id, "Ignoring selection of unknown person");
            return false;
        }
        self.selected_id = Some(id.to_string());
        true
    }

    pub fn deselect(&mut self) {
        self.selected_id = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Person> {
        self.selected_id.as_deref().and_then(|id| self.get(id))
    }

    /// Increment the local counter after a successful store write
    pub fn apply_vote_locally(&mut self, id: &str, kind: VoteKind) -> Result<&Person> {
        let person = self
            .all
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        person.add_vote(kind);
        Ok(person)
    }

    /// Boys/girls over the full loaded set
    pub fn gender_counts(&self) -> GenderCounts {
        self.all.iter().fold(GenderCounts::default(), |mut c, p| {
            match p.gender {
                Gender::Boy => c.boys += 1,
                Gender::Girl => c.girls += 1,
            }
            c
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::person;
    use crate::store::{MemoryStore, StoreOp};

    fn store_ab() -> MemoryStore {
        let mut b = person("b", 2, 5);
        b.area = "Gulshan".to_string();
        b.gender = Gender::Girl;
        MemoryStore::with_rows(vec![person("a", 10, 3), b])
    }

    #[tokio::test]
    async fn test_load_replaces_and_filters() {
        let store = store_ab();
        let mut registry = PinRegistry::new();
        registry.set_query("gul");
        registry.load(&store).await.unwrap();

        assert_eq!(registry.all().len(), 2);
        let visible: Vec<&str> = registry.visible().map(|p| p.id.as_str()).collect();
        assert_eq!(visible, vec!["b"]);
        assert_eq!(registry.status(), &LoadStatus::Loaded);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_state() {
        let store = store_ab();
        let mut registry = PinRegistry::new();
        registry.load(&store).await.unwrap();
        registry.select("a");

        store.fail(StoreOp::List);
        let err = registry.load(&store).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert_eq!(registry.all().len(), 2);
        assert_eq!(registry.selected_id(), Some("a"));
        assert!(matches!(registry.status(), LoadStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_select_unknown_is_noop() {
        let mut registry = PinRegistry::new();
        registry.load(&store_ab()).await.unwrap();
        assert!(registry.select("a"));
        assert!(!registry.select("nobody"));
        assert_eq!(registry.selected_id(), Some("a"));
        registry.deselect();
        assert!(registry.selected().is_none());
    }

    #[tokio::test]
    async fn test_reload_drops_selection_of_vanished_person() {
        let mut registry = PinRegistry::new();
        registry.load(&store_ab()).await.unwrap();
        registry.select("b");

        registry.load(&MemoryStore::with_rows(vec![person("a", 0, 0)])).await.unwrap();
        assert_eq!(registry.selected_id(), None);
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let mut registry = PinRegistry::new();
        let ticket = registry.begin_load();
        registry
            .finish_load(ticket, Ok(vec![person("a", 1, 0), person("a", 9, 9)]))
            .unwrap();
        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.all()[0].real_votes, 1);
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let mut registry = PinRegistry::new();
        let older = registry.begin_load();
        let newer = registry.begin_load();

        assert!(registry.finish_load(newer, Ok(vec![person("new", 0, 0)])).unwrap());
        assert!(!registry.finish_load(older, Ok(vec![person("old", 0, 0)])).unwrap());
        assert_eq!(registry.all()[0].id, "new");
    }

    #[test]
    fn test_apply_vote_updates_visible_view() {
        let mut registry = PinRegistry::new();
        let ticket = registry.begin_load();
        registry.finish_load(ticket, Ok(vec![person("a", 1, 1)])).unwrap();

        registry.apply_vote_locally("a", VoteKind::Real).unwrap();
        let visible = registry.visible().next().unwrap();
        assert_eq!((visible.real_votes, visible.fake_votes), (2, 1));
        assert!(matches!(
            registry.apply_vote_locally("zz", VoteKind::Real),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_gender_counts() {
        let mut registry = PinRegistry::new();
        registry.load(&store_ab()).await.unwrap();
        assert_eq!(registry.gender_counts(), GenderCounts { boys: 1, girls: 1 });
    }
}
