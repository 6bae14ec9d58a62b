//! Vote engine
//!
//! A vote is written to the store first and only then applied to the
//! registry, so a failed write never leaves a partial local change and
//! there is nothing to roll back.
//!
//! [`VoteEngine::begin`] and [`VoteEngine::finish`] bracket the store call
//! ([`VoteTicket::submit`]) so a caller sharing the registry can release it
//! while the write is in flight. Such a caller must still run votes one at
//! a time: the ticket carries an absolute counter value computed from the
//! registry, so two tickets prepared before either is applied write the
//! same value. [`VoteEngine::cast_vote`] runs the steps in sequence.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{VoteKind, VotePatch};
use crate::registry::PinRegistry;
use crate::store::PersonStore;
use crate::{Error, Result};

/// Vote engine state for the most recent call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VoteState {
    Idle,
    Submitting { id: String, kind: VoteKind },
    Success { id: String, kind: VoteKind },
    Failed { id: String, kind: VoteKind, error: String },
}

/// A vote computed against the registry, not yet written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTicket {
    id: String,
    kind: VoteKind,
    new_value: u32,
}

impl VoteTicket {
    /// Look up the person and compute the new counter value
    ///
    /// Fails with `NotFound` when the id is no longer loaded; the caller
    /// should reload instead of voting.
    pub fn prepare(registry: &PinRegistry, id: &str, kind: VoteKind) -> Result<Self> {
        let person = registry
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            kind,
            new_value: person.votes(kind).saturating_add(1),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> VoteKind {
        self.kind
    }

    /// Exactly the one changed counter
    pub fn patch(&self) -> VotePatch {
        VotePatch::single(self.kind, self.new_value)
    }

    /// Write the new counter value to the store
    pub async fn submit(&self, store: &dyn PersonStore) -> Result<VoteReceipt> {
        debug!(id = %self.id, kind = ?self.kind, value = self.new_value, "Submitting vote");
        match store.update_votes(&self.id, self.patch()).await {
            Ok(()) => {
                info!(id = %self.id, kind = ?self.kind, value = self.new_value, "Vote recorded");
                Ok(VoteReceipt {
                    id: self.id.clone(),
                    kind: self.kind,
                })
            }
            Err(source) => {
                warn!(id = %self.id, kind = ?self.kind, error = %source, "Vote failed");
                Err(Error::VoteFailed {
                    id: self.id.clone(),
                    source,
                })
            }
        }
    }
}

/// Proof that the store accepted a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    id: String,
    kind: VoteKind,
}

impl VoteReceipt {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> VoteKind {
        self.kind
    }

    /// Apply the same increment locally and close the profile card
    ///
    /// If a reload removed the person meanwhile, the local patch is skipped;
    /// the vote is already durable and shows up on the next load.
    pub fn apply(&self, registry: &mut PinRegistry) {
        if let Err(e) = registry.apply_vote_locally(&self.id, self.kind) {
            debug!(id = %self.id, error = %e, "Voted person no longer loaded; skipping local patch");
        }
        registry.deselect();
    }
}

/// Single-owner vote engine: Idle -> Submitting -> {Success, Failed}
#[derive(Debug)]
pub struct VoteEngine {
    state: VoteState,
}

impl Default for VoteEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteEngine {
    pub fn new() -> Self {
        Self {
            state: VoteState::Idle,
        }
    }

    pub fn state(&self) -> &VoteState {
        &self.state
    }

    /// Look up the person and enter `Submitting`
    ///
    /// An unknown id fails with `NotFound` and leaves the state unchanged.
    pub fn begin(&mut self, registry: &PinRegistry, id: &str, kind: VoteKind) -> Result<VoteTicket> {
        let ticket = VoteTicket::prepare(registry, id, kind)?;
        self.state = VoteState::Submitting {
            id: ticket.id.clone(),
            kind,
        };
        Ok(ticket)
    }

    /// Record the store outcome for `ticket`; on success patch the registry
    pub fn finish(
        &mut self,
        registry: &mut PinRegistry,
        ticket: &VoteTicket,
        outcome: Result<VoteReceipt>,
    ) -> Result<()> {
        let id = ticket.id.clone();
        let kind = ticket.kind;
        match outcome {
            Ok(receipt) => {
                receipt.apply(registry);
                self.state = VoteState::Success { id, kind };
                Ok(())
            }
            Err(e) => {
                self.state = VoteState::Failed {
                    id,
                    kind,
                    error: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Cast one vote. Not idempotent: every call is a separate vote.
    pub async fn cast_vote(
        &mut self,
        registry: &mut PinRegistry,
        store: &dyn PersonStore,
        id: &str,
        kind: VoteKind,
    ) -> Result<()> {
        let ticket = self.begin(registry, id, kind)?;
        let outcome = ticket.submit(store).await;
        self.finish(registry, &ticket, outcome)
    }
}
