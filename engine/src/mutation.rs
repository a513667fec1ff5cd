//! Optimistic mutations over the favorites set.
//!
//! A toggle is applied to the in-memory set immediately (the UI updates
//! before persistence settles) and recorded as a pending mutation. When
//! persistence succeeds the mutation is committed; when it fails the
//! mutation is rolled back by undoing exactly the diff it made, never by
//! restoring a whole-set snapshot. This keeps two in-flight toggles on
//! different ids from clobbering each other's state.

use crate::{error::Result, Error, FavoriteId, FavoriteSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single favorites mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Mutation {
    Add(FavoriteId),
    Remove(FavoriteId),
}

impl Mutation {
    /// The id this mutation targets.
    pub fn favorite_id(&self) -> &FavoriteId {
        match self {
            Mutation::Add(id) => id,
            Mutation::Remove(id) => id,
        }
    }
}

/// Lifecycle state of an optimistic mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationState {
    /// Applied to the in-memory set, persistence not yet settled.
    Pending,
    /// Persistence succeeded; the optimistic change stands.
    Committed,
    /// Persistence failed; the optimistic change was undone.
    RolledBack,
}

/// The exact change a mutation made to the set, kept so rollback can
/// undo it precisely.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Effect {
    /// The add actually inserted the id.
    Inserted,
    /// The remove actually removed the id, from this position.
    Removed(usize),
    /// The mutation found the set already in the desired state.
    None,
}

/// An in-flight optimistic mutation.
///
/// Created by [`OptimisticMutation::begin`], which applies the change to
/// the set, and settled exactly once via [`commit`](Self::commit) or
/// [`roll_back`](Self::roll_back).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticMutation {
    mutation: Mutation,
    effect: Effect,
    state: MutationState,
}

impl OptimisticMutation {
    /// Apply `mutation` to `set` and return the pending handle.
    pub fn begin(set: &mut FavoriteSet, mutation: Mutation) -> Self {
        let effect = match &mutation {
            Mutation::Add(id) => {
                if set.insert(id.clone()) {
                    Effect::Inserted
                } else {
                    Effect::None
                }
            }
            Mutation::Remove(id) => match set.remove(id) {
                Some(position) => Effect::Removed(position),
                None => Effect::None,
            },
        };

        Self {
            mutation,
            effect,
            state: MutationState::Pending,
        }
    }

    /// The mutation being applied.
    pub fn mutation(&self) -> &Mutation {
        &self.mutation
    }

    /// The id this mutation targets.
    pub fn favorite_id(&self) -> &FavoriteId {
        self.mutation.favorite_id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Whether the mutation actually changed the set when it began.
    pub fn had_effect(&self) -> bool {
        self.effect != Effect::None
    }

    /// Mark persistence as succeeded. The optimistic change stands.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != MutationState::Pending {
            return Err(Error::MutationSettled);
        }
        self.state = MutationState::Committed;
        Ok(())
    }

    /// Mark persistence as failed and undo the recorded diff on `set`.
    ///
    /// After rollback, membership of the target id equals its value
    /// before `begin` was called.
    pub fn roll_back(&mut self, set: &mut FavoriteSet) -> Result<()> {
        if self.state != MutationState::Pending {
            return Err(Error::MutationSettled);
        }

        match &self.effect {
            Effect::Inserted => {
                set.remove(self.mutation.favorite_id());
            }
            Effect::Removed(position) => {
                set.insert_at(*position, self.mutation.favorite_id().clone());
            }
            Effect::None => {}
        }

        self.state = MutationState::RolledBack;
        Ok(())
    }
}

/// Tracks which ids have a mutation in flight.
///
/// A second toggle on an id whose persistence has not settled is
/// rejected instead of silently racing the first one. Toggles on
/// different ids proceed independently.
#[derive(Debug, Clone, Default)]
pub struct MutationLedger {
    in_flight: HashSet<FavoriteId>,
}

impl MutationLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a mutation, applying it to `set`.
    ///
    /// Fails with [`Error::MutationInFlight`] if the target id already
    /// has an unsettled mutation.
    pub fn begin(&mut self, set: &mut FavoriteSet, mutation: Mutation) -> Result<OptimisticMutation> {
        let id = mutation.favorite_id();
        if self.in_flight.contains(id) {
            return Err(Error::MutationInFlight(id.clone()));
        }
        self.in_flight.insert(id.clone());
        Ok(OptimisticMutation::begin(set, mutation))
    }

    /// Commit a mutation begun through this ledger.
    pub fn commit(&mut self, op: &mut OptimisticMutation) -> Result<()> {
        op.commit()?;
        self.in_flight.remove(op.favorite_id());
        Ok(())
    }

    /// Roll back a mutation begun through this ledger.
    pub fn roll_back(&mut self, set: &mut FavoriteSet, op: &mut OptimisticMutation) -> Result<()> {
        op.roll_back(set)?;
        self.in_flight.remove(op.favorite_id());
        Ok(())
    }

    /// Whether the id has an unsettled mutation.
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    /// Count of unsettled mutations.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}
