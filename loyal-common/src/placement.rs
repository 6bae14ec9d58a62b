//! Placement flow: pick a spot on the map, fill the form, create the person
//!
//! ```text
//! Inactive --add--> Picking --tap--> FormOpen --submit--> Submitting
//!    ^                 |                 ^                     |
//!    +------add--------+                 +------failure--------+
//!    +------------------------success--------------------------+
//! ```
//!
//! The form draft lives on the flow, not in a state, so closing and
//! reopening the form keeps what was typed. It is cleared only after a
//! successful insert.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::geo::{GeoPoint, RegionBounds};
use crate::model::{Gender, NewPerson};
use crate::store::PersonStore;
use crate::{Error, Result};

/// Creation form fields as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonDraft {
    pub name: String,
    pub gender: Gender,
    pub area: String,
    pub quote: String,
    pub social_media_link: String,
}

impl PersonDraft {
    /// Required-field and region check; never touches the store
    pub fn validate(
        &self,
        location: Option<GeoPoint>,
        region: &RegionBounds,
    ) -> std::result::Result<NewPerson, ValidationError> {
        let location = location.ok_or(ValidationError::MissingLocation)?;

        let name = required(&self.name, "name")?;
        let area = required(&self.area, "area")?;
        let quote = required(&self.quote, "quote")?;

        if !region.contains(location) {
            return Err(ValidationError::OutOfRegion {
                lat: location.lat,
                lng: location.lng,
            });
        }

        let link = self.social_media_link.trim();
        Ok(NewPerson {
            name,
            gender: self.gender,
            area,
            quote,
            social_media_link: (!link.is_empty()).then(|| link.to_string()),
            location,
        })
    }
}

fn required(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlacementState {
    Inactive,
    /// Next map tap supplies the location
    Picking,
    /// Location chosen, creation form shown
    FormOpen {
        location: GeoPoint,
        /// Message from the last rejected or failed submission
        last_error: Option<String>,
    },
    Submitting { location: GeoPoint },
}

#[derive(Debug)]
pub struct PlacementFlow {
    state: PlacementState,
    draft: PersonDraft,
    region: RegionBounds,
}

impl PlacementFlow {
    pub fn new(region: RegionBounds) -> Self {
        Self {
            state: PlacementState::Inactive,
            draft: PersonDraft::default(),
            region,
        }
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn draft(&self) -> &PersonDraft {
        &self.draft
    }

    pub fn is_picking(&self) -> bool {
        self.state == PlacementState::Picking
    }

    /// Candidate location, once chosen
    pub fn location(&self) -> Option<GeoPoint> {
        match &self.state {
            PlacementState::FormOpen { location, .. } | PlacementState::Submitting { location } => {
                Some(*location)
            }
            _ => None,
        }
    }

    /// "Add person" button
    ///
    /// Starts picking from `Inactive`; cancels from `Picking` or an open form.
    pub fn toggle_add_person(&mut self) -> Result<()> {
        let next = match &self.state {
            PlacementState::Inactive => PlacementState::Picking,
            PlacementState::Picking | PlacementState::FormOpen { .. } => PlacementState::Inactive,
            PlacementState::Submitting { .. } => {
                return Err(Error::InvalidState("submission in progress".to_string()));
            }
        };
        self.transition(next);
        Ok(())
    }

    /// Close the picker or the form without submitting
    pub fn cancel(&mut self) -> Result<()> {
        match self.state {
            PlacementState::Submitting { .. } => {
                Err(Error::InvalidState("submission in progress".to_string()))
            }
            _ => {
                self.transition(PlacementState::Inactive);
                Ok(())
            }
        }
    }

    /// Map tap. Returns `false` when the flow is not picking and the tap is
    /// not meant for it.
    ///
    /// A tap outside the region is rejected and picking continues.
    pub fn pick_location(&mut self, point: GeoPoint) -> Result<bool> {
        if !self.is_picking() {
            return Ok(false);
        }
        if !self.region.contains(point) {
            debug!(lat = point.lat, lng = point.lng, "Picked location outside region");
            return Err(ValidationError::OutOfRegion {
                lat: point.lat,
                lng: point.lng,
            }
            .into());
        }
        self.transition(PlacementState::FormOpen {
            location: point,
            last_error: None,
        });
        Ok(true)
    }

    /// Replace the form fields
    pub fn update_draft(&mut self, draft: PersonDraft) -> Result<()> {
        if matches!(self.state, PlacementState::Submitting { .. }) {
            return Err(Error::InvalidState("submission in progress".to_string()));
        }
        self.draft = draft;
        Ok(())
    }

    /// Validate the form and enter `Submitting`
    ///
    /// A rejected form stays open with the error recorded; the returned
    /// record is what must be inserted.
    pub fn begin_submit(&mut self) -> Result<NewPerson> {
        if matches!(self.state, PlacementState::Submitting { .. }) {
            return Err(Error::InvalidState("submission in progress".to_string()));
        }

        match self.draft.validate(self.location(), &self.region) {
            Ok(person) => {
                // validate() succeeded, so a location exists
                let location = person.location;
                self.transition(PlacementState::Submitting { location });
                Ok(person)
            }
            Err(e) => {
                if let PlacementState::FormOpen { last_error, .. } = &mut self.state {
                    *last_error = Some(e.to_string());
                }
                Err(e.into())
            }
        }
    }

    /// Record the insert outcome
    ///
    /// Success clears the draft and closes the form; failure reopens the
    /// form with the draft intact.
    pub fn finish_submit(&mut self, result: std::result::Result<(), StoreError>) -> Result<()> {
        let location = match &self.state {
            PlacementState::Submitting { location } => *location,
            other => {
                return Err(Error::InvalidState(format!(
                    "no submission in progress ({:?})",
                    other
                )));
            }
        };

        match result {
            Ok(()) => {
                info!(name = %self.draft.name.trim(), "Person added");
                self.draft = PersonDraft::default();
                self.transition(PlacementState::Inactive);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to add person; form kept open");
                self.transition(PlacementState::FormOpen {
                    location,
                    last_error: Some(e.to_string()),
                });
                Err(Error::Store(e))
            }
        }
    }

    /// Validate, insert and record the outcome
    pub async fn submit(&mut self, store: &dyn PersonStore) -> Result<()> {
        let person = self.begin_submit()?;
        let result = store.insert(&person).await;
        self.finish_submit(result)
    }

    fn transition(&mut self, next: PlacementState) {
        debug!(from = ?self.state, to = ?next, "Placement transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreOp};

    const DHANMONDI: GeoPoint = GeoPoint { lat: 23.7461, lng: 90.3742 };

    fn filled() -> PersonDraft {
        PersonDraft {
            name: "Mehedi Hasan".to_string(),
            gender: Gender::Boy,
            area: "Dhanmondi".to_string(),
            quote: "Goes offline at 10pm for bae".to_string(),
            social_media_link: String::new(),
        }
    }

    fn open_form() -> PlacementFlow {
        let mut flow = PlacementFlow::new(RegionBounds::default());
        flow.toggle_add_person().unwrap();
        assert!(flow.pick_location(DHANMONDI).unwrap());
        flow
    }

    #[test]
    fn test_toggle_twice_cancels_picking() {
        let mut flow = PlacementFlow::new(RegionBounds::default());
        flow.toggle_add_person().unwrap();
        assert_eq!(flow.state(), &PlacementState::Picking);
        flow.toggle_add_person().unwrap();
        assert_eq!(flow.state(), &PlacementState::Inactive);
    }

    #[test]
    fn test_tap_when_not_picking_is_ignored() {
        let mut flow = PlacementFlow::new(RegionBounds::default());
        assert!(!flow.pick_location(DHANMONDI).unwrap());
        assert_eq!(flow.state(), &PlacementState::Inactive);
    }

    #[test]
    fn test_tap_outside_region_keeps_picking() {
        let mut flow = PlacementFlow::new(RegionBounds::default());
        flow.toggle_add_person().unwrap();
        let err = flow.pick_location(GeoPoint::new(48.85, 2.35)).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::OutOfRegion { .. })));
        assert!(flow.is_picking());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_and_closes() {
        let store = MemoryStore::new();
        let mut flow = open_form();
        flow.update_draft(filled()).unwrap();

        flow.submit(&store).await.unwrap();
        assert_eq!(flow.state(), &PlacementState::Inactive);
        assert_eq!(flow.draft(), &PersonDraft::default());

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location, DHANMONDI);
        assert_eq!(rows[0].social_media_link, None);
    }

    #[tokio::test]
    async fn test_failed_submit_reopens_form_with_fields() {
        let store = MemoryStore::new();
        store.fail(StoreOp::Insert);
        let mut flow = open_form();
        flow.update_draft(filled()).unwrap();

        let err = flow.submit(&store).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(matches!(
            flow.state(),
            PlacementState::FormOpen { last_error: Some(_), .. }
        ));
        assert_eq!(flow.draft(), &filled());

        store.recover(StoreOp::Insert);
        flow.submit(&store).await.unwrap();
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_location_never_inserts() {
        let store = MemoryStore::new();
        let mut flow = PlacementFlow::new(RegionBounds::default());
        flow.update_draft(filled()).unwrap();

        let err = flow.submit(&store).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingLocation)));
        assert_eq!(store.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_required_fields_never_insert() {
        let store = MemoryStore::new();
        for field in ["name", "area", "quote"] {
            let mut draft = filled();
            match field {
                "name" => draft.name = "   ".to_string(),
                "area" => draft.area.clear(),
                _ => draft.quote.clear(),
            }
            let mut flow = open_form();
            flow.update_draft(draft).unwrap();

            let err = flow.submit(&store).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Validation(ValidationError::EmptyField(f)) if f == field
            ));
            assert!(matches!(flow.state(), PlacementState::FormOpen { .. }));
        }
        assert_eq!(store.insert_calls(), 0);
    }

    #[test]
    fn test_closing_form_keeps_draft() {
        let mut flow = open_form();
        flow.update_draft(filled()).unwrap();
        flow.toggle_add_person().unwrap();
        assert_eq!(flow.state(), &PlacementState::Inactive);
        assert_eq!(flow.draft(), &filled());
    }

    #[test]
    fn test_no_changes_while_submitting() {
        let mut flow = open_form();
        flow.update_draft(filled()).unwrap();
        flow.begin_submit().unwrap();

        assert!(matches!(flow.toggle_add_person(), Err(Error::InvalidState(_))));
        assert!(matches!(flow.update_draft(PersonDraft::default()), Err(Error::InvalidState(_))));
        assert!(matches!(flow.begin_submit(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_validate_trims_and_keeps_link() {
        let mut draft = filled();
        draft.name = "  Mehedi Hasan ".to_string();
        draft.social_media_link = " https://facebook.com/mehedi ".to_string();
        let person = draft.validate(Some(DHANMONDI), &RegionBounds::default()).unwrap();
        assert_eq!(person.name, "Mehedi Hasan");
        assert_eq!(person.social_media_link.as_deref(), Some("https://facebook.com/mehedi"));
    }
}
