//! The favorites set - an ordered, duplicate-free sequence of coupon ids.
//!
//! Insertion order is preserved because the locally persisted favorites
//! list is an ordered sequence, and reconciliation pushes ids to the
//! server in exactly that order.

use crate::FavoriteId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered set of favorite coupon ids.
///
/// Backed by a `Vec` for ordering plus a `HashSet` for O(1) membership.
/// Duplicates are never stored; re-inserting an existing id is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FavoriteId>", into = "Vec<FavoriteId>")]
pub struct FavoriteSet {
    ids: Vec<FavoriteId>,
    index: HashSet<FavoriteId>,
}

impl FavoriteSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from ids, deduplicating while keeping first occurrence.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FavoriteId>,
    {
        let mut set = Self::new();
        for id in ids {
            set.insert(id.into());
        }
        set
    }

    /// Append an id if absent. Returns true if the set changed.
    pub fn insert(&mut self, id: impl Into<FavoriteId>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.ids.push(id);
        true
    }

    /// Insert an id at a specific position if absent. Returns true if the
    /// set changed. Positions past the end append.
    ///
    /// Used when rolling back a remove, so the id returns to where it was.
    pub fn insert_at(&mut self, position: usize, id: impl Into<FavoriteId>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        let position = position.min(self.ids.len());
        self.ids.insert(position, id);
        true
    }

    /// Remove an id. Returns its former position, or `None` if it was
    /// absent (removing a non-favorite is a silent no-op).
    pub fn remove(&mut self, id: &str) -> Option<usize> {
        if !self.index.remove(id) {
            return None;
        }
        let position = self.ids.iter().position(|existing| existing == id);
        if let Some(position) = position {
            self.ids.remove(position);
        }
        position
    }

    /// Pure membership check. Never fails, no side effects.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// The ids in insertion order.
    pub fn ids(&self) -> &[FavoriteId] {
        &self.ids
    }

    /// Count of ids in the set.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Drop all ids.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.index.clear();
    }

    /// Replace the whole set, deduplicating the input.
    ///
    /// Used by refresh when the authoritative store is re-read.
    pub fn replace<I>(&mut self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<FavoriteId>,
    {
        *self = Self::from_ids(ids);
    }

    /// Iterate over ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FavoriteId> {
        self.ids.iter()
    }
}

impl From<Vec<FavoriteId>> for FavoriteSet {
    fn from(ids: Vec<FavoriteId>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<FavoriteSet> for Vec<FavoriteId> {
    fn from(set: FavoriteSet) -> Self {
        set.ids
    }
}

impl PartialEq for FavoriteSet {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for FavoriteSet {}
