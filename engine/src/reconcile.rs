//! Reconciliation plan for merging guest favorites into an account.
//!
//! When the session transitions from anonymous to authenticated, every
//! locally stored favorite is pushed to the server, one request at a
//! time and strictly in local insertion order. The plan is the pure
//! half of that flow: it decides which id goes next and keeps the
//! outcome bookkeeping, while the caller performs the actual IO.
//!
//! The plan is an observable state machine:
//!
//! ```text
//! NotStarted -> InProgress -> Completed
//!                          -> PartiallyFailed
//! ```
//!
//! A failed push does not abort the plan; the remaining ids are still
//! attempted and the failures are reported at the end so the caller can
//! surface or retry them.

use crate::{error::Result, Error, FavoriteId, FavoriteSet};
use serde::{Deserialize, Serialize};

/// Observable state of a reconciliation plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanState {
    /// No id has been handed out yet.
    NotStarted,
    /// At least one id handed out, not all settled.
    InProgress,
    /// Every id settled, all successfully.
    Completed,
    /// Every id settled, at least one failed.
    PartiallyFailed,
}

/// A sequential plan for pushing local favorites to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    /// Ids to push, in local insertion order.
    remaining: Vec<FavoriteId>,
    /// Position of the next id to hand out.
    cursor: usize,
    /// Whether the cursor entry has been handed out but not settled.
    in_flight: bool,
    /// Ids pushed successfully, in push order.
    pushed: Vec<FavoriteId>,
    /// Ids whose push failed, in push order.
    failed: Vec<FavoriteId>,
}

impl ReconcilePlan {
    /// Build a plan from the local favorites set.
    ///
    /// An empty set produces a no-op plan that is already complete.
    pub fn new(local: &FavoriteSet) -> Self {
        Self::from_ids(local.ids().iter().cloned())
    }

    /// Build a plan from raw ids, deduplicating while keeping order.
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<FavoriteId>,
    {
        let deduplicated = FavoriteSet::from_ids(ids);
        Self {
            remaining: deduplicated.ids().to_vec(),
            cursor: 0,
            in_flight: false,
            pushed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Whether there was nothing to reconcile in the first place.
    pub fn is_noop(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Current plan state. An untouched empty plan is already complete.
    pub fn state(&self) -> PlanState {
        if self.cursor >= self.remaining.len() && !self.in_flight {
            if self.failed.is_empty() {
                PlanState::Completed
            } else {
                PlanState::PartiallyFailed
            }
        } else if self.cursor == 0 && !self.in_flight {
            PlanState::NotStarted
        } else {
            PlanState::InProgress
        }
    }

    /// Whether every id has settled.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.state(),
            PlanState::Completed | PlanState::PartiallyFailed
        )
    }

    /// Hand out the next id to push.
    ///
    /// Returns `None` once every id has been handed out, or while the
    /// previous id has not settled (the loop is strictly sequential: a
    /// new push may only start after the previous one resolves).
    pub fn next(&mut self) -> Option<&FavoriteId> {
        if self.in_flight || self.cursor >= self.remaining.len() {
            return None;
        }
        self.in_flight = true;
        Some(&self.remaining[self.cursor])
    }

    /// Settle the in-flight id as pushed successfully.
    pub fn record_success(&mut self, id: &str) -> Result<()> {
        let settled = self.settle(id)?;
        self.pushed.push(settled);
        Ok(())
    }

    /// Settle the in-flight id as failed. The plan continues past it.
    pub fn record_failure(&mut self, id: &str) -> Result<()> {
        let settled = self.settle(id)?;
        self.failed.push(settled);
        Ok(())
    }

    fn settle(&mut self, id: &str) -> Result<FavoriteId> {
        if !self.in_flight || self.remaining[self.cursor] != id {
            return Err(Error::NotInFlight(id.to_string()));
        }
        let settled = self.remaining[self.cursor].clone();
        self.in_flight = false;
        self.cursor += 1;
        Ok(settled)
    }

    /// Ids pushed successfully so far, in push order.
    pub fn pushed_ids(&self) -> &[FavoriteId] {
        &self.pushed
    }

    /// Ids whose push failed so far, in push order.
    pub fn failed_ids(&self) -> &[FavoriteId] {
        &self.failed
    }

    /// Total number of ids the plan covers.
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    /// Whether the plan covers no ids.
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}
