//! Entity storage abstraction.
//!
//! Advances, claims, and approval items live behind the [`Store`] trait
//! so the concurrency discipline is enforceable regardless of backing
//! storage: a transition reads current state, validates, and writes the
//! result while holding the entity's lock, so two concurrent updates to
//! the same entity serialize and at most one state-dependent transition
//! succeeds. The in-process implementation is [`MemoryStore`], a
//! `DashMap` keyed by entity id.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{EngineError, EngineResult};
use crate::models::{Advance, ApprovalItem, Claim};

/// A storable domain entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The entity's unique id.
    fn id(&self) -> &str;

    /// The NotFound error for this entity kind.
    fn not_found(id: &str) -> EngineError;
}

/// Keyed entity storage with serializable per-entity updates.
pub trait Store<T: Entity>: Send + Sync {
    /// Inserts a new entity. Fails if the id already exists.
    fn insert(&self, entity: T) -> EngineResult<()>;

    /// Returns a copy of the entity, if present.
    fn get(&self, id: &str) -> Option<T>;

    /// Applies `apply` to the current entity and stores the result.
    ///
    /// The closure runs while the entity's lock is held: it observes the
    /// latest state, and no other update to the same entity can
    /// interleave. When the closure returns an error nothing is written,
    /// so a failed validation leaves the entity unchanged.
    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&T) -> EngineResult<T>,
    ) -> EngineResult<T>;

    /// Returns a point-in-time copy of all entities. Never blocks
    /// writers beyond the per-shard read locks.
    fn snapshot(&self) -> Vec<T>;
}

/// In-memory [`Store`] backed by a concurrent hash map.
#[derive(Debug)]
pub struct MemoryStore<T> {
    entries: DashMap<String, T>,
}

impl<T: Entity> MemoryStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Store<T> for MemoryStore<T> {
    fn insert(&self, entity: T) -> EngineResult<()> {
        match self.entries.entry(entity.id().to_string()) {
            Entry::Occupied(occupied) => Err(EngineError::Validation {
                entity: "store".to_string(),
                message: format!("id already exists: {}", occupied.key()),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(entity);
                Ok(())
            }
        }
    }

    fn get(&self, id: &str) -> Option<T> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    fn update(
        &self,
        id: &str,
        apply: &mut dyn FnMut(&T) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut entry = self.entries.get_mut(id).ok_or_else(|| T::not_found(id))?;
        let updated = apply(entry.value())?;
        *entry.value_mut() = updated.clone();
        Ok(updated)
    }

    fn snapshot(&self) -> Vec<T> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Entity for Advance {
    fn id(&self) -> &str {
        &self.id
    }

    fn not_found(id: &str) -> EngineError {
        EngineError::AdvanceNotFound { id: id.to_string() }
    }
}

impl Entity for Claim {
    fn id(&self) -> &str {
        &self.id
    }

    fn not_found(id: &str) -> EngineError {
        EngineError::ClaimNotFound { id: id.to_string() }
    }
}

impl Entity for ApprovalItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn not_found(id: &str) -> EngineError {
        EngineError::ApprovalNotFound { id: id.to_string() }
    }
}
