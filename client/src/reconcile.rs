//! Reconciliation runner: merges guest favorites into the account.
//!
//! On login, every locally stored favorite is pushed to the remote
//! store one request at a time, in local insertion order, awaiting each
//! push before issuing the next. A failed push does not abort the
//! sweep. Afterwards the local list is cleared regardless of partial
//! failures; the remote set becomes authoritative once the caller
//! refreshes from it.

use crate::error::Result;
use crate::store::{LocalFavorites, RemoteFavorites};
use clip_engine::{FavoriteId, ReconcilePlan};

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Ids pushed to the remote store, in push order.
    pub pushed: Vec<FavoriteId>,
    /// Ids whose push failed; candidates for a caller-driven retry.
    pub failed: Vec<FavoriteId>,
    /// Whether the local favorites key was cleared.
    pub local_cleared: bool,
}

impl ReconcileReport {
    /// Whether there was nothing to reconcile.
    pub fn is_noop(&self) -> bool {
        self.pushed.is_empty() && self.failed.is_empty() && !self.local_cleared
    }
}

/// Push the locally stored favorites to the remote store and clear the
/// local list.
///
/// An empty local list terminates immediately without touching either
/// store. Individual push failures are logged and recorded, not
/// propagated; only storage errors reading or clearing the local list
/// abort the run.
pub async fn run_reconciliation(
    local: &LocalFavorites,
    remote: &dyn RemoteFavorites,
) -> Result<ReconcileReport> {
    let guest_favorites = local.load().await?;
    let mut plan = ReconcilePlan::new(&guest_favorites);

    if plan.is_noop() {
        tracing::debug!("no guest favorites to reconcile");
        return Ok(ReconcileReport::default());
    }

    tracing::info!(count = plan.len(), "reconciling guest favorites");

    while let Some(id) = plan.next().map(Clone::clone) {
        match remote.add(&id).await {
            Ok(()) => plan.record_success(&id)?,
            Err(e) => {
                tracing::warn!(coupon_id = %id, error = %e, "failed to push guest favorite");
                plan.record_failure(&id)?;
            }
        }
    }

    // The sweep is best effort: the local list is cleared even when
    // some pushes failed, and the failures are surfaced in the report.
    local.clear().await?;

    let report = ReconcileReport {
        pushed: plan.pushed_ids().to_vec(),
        failed: plan.failed_ids().to_vec(),
        local_cleared: true,
    };

    tracing::info!(
        pushed = report.pushed.len(),
        failed = report.failed.len(),
        "guest favorites reconciled"
    );

    Ok(report)
}
