//! In-process `people` table

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::PersonStore;
use crate::error::StoreError;
use crate::model::{NewPerson, Person, VotePatch};

/// Store operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Insert,
    UpdateVotes,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Person>,
    failing: HashSet<StoreOp>,
}

/// Store backed by a vector; rows keep insertion order
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `rows`
    pub fn with_rows(rows: Vec<Person>) -> Self {
        let store = Self::new();
        store.lock().rows = rows;
        store
    }

    /// Make every subsequent call of `op` fail until [`Self::recover`]
    pub fn fail(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Number of insert calls that reached the store (including failed ones)
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of update calls that reached the store (including failed ones)
    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Snapshot of the durable rows
    pub fn rows(&self) -> Vec<Person> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the rows are still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(inner: &Inner, op: StoreOp) -> Result<(), StoreError> {
        if inner.failing.contains(&op) {
            return Err(StoreError::Injected(format!("{:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list_all(&self) -> Result<Vec<Person>, StoreError> {
        let inner = self.lock();
        Self::check(&inner, StoreOp::List)?;
        Ok(inner.rows.clone())
    }

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        Self::check(&inner, StoreOp::Insert)?;
        inner.rows.push(Person {
            id: Uuid::new_v4().to_string(),
            name: person.name.clone(),
            gender: person.gender,
            area: person.area.clone(),
            quote: person.quote.clone(),
            social_media_link: person.social_media_link.clone(),
            location: person.location,
            real_votes: 0,
            fake_votes: 0,
            created_at: Some(Utc::now()),
        });
        Ok(())
    }

    async fn update_votes(&self, id: &str, patch: VotePatch) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.lock();
        Self::check(&inner, StoreOp::UpdateVotes)?;
        let row = inner
            .rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::Api {
                status: 404,
                message: format!("no row with id {}", id),
            })?;
        if let Some(real) = patch.real_votes {
            row.real_votes = real;
        }
        if let Some(fake) = patch.fake_votes {
            row.fake_votes = fake;
        }
        Ok(())
    }
}
