//! The favorites controller.
//!
//! Owns the caller-visible favorites set and mediates between the
//! device-local store (anonymous sessions) and the remote REST store
//! (authenticated sessions). Toggles are optimistic: the in-memory set
//! changes immediately and the change is undone if persistence fails.
//! Persistence failures never cross this boundary - they are logged,
//! rolled back, and reported through [`ToggleOutcome`] so the calling
//! screen can settle its heart icon without error plumbing.

use crate::auth::{AuthSubscription, SessionIdentity};
use crate::error::Result;
use crate::reconcile::{run_reconciliation, ReconcileReport};
use crate::store::{LocalFavorites, RemoteFavorites};
use clip_engine::{FavoriteId, FavoriteSet, Mutation, MutationLedger};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// How a toggle settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The optimistic change persisted and stands.
    Persisted,
    /// Persistence failed; the optimistic change was undone.
    RolledBack,
    /// A toggle for the same id was still settling; nothing changed.
    Rejected,
}

/// State guarded by the controller's lock.
///
/// The lock is never held across an await: toggles begin under the
/// lock, persist without it, and settle under it again.
#[derive(Debug)]
struct Inner {
    favorites: FavoriteSet,
    ledger: MutationLedger,
    identity: SessionIdentity,
}

/// The favorites controller. Cheap to share behind an `Arc`.
pub struct FavoritesController {
    inner: Mutex<Inner>,
    local: LocalFavorites,
    remote: Arc<dyn RemoteFavorites>,
}

impl FavoritesController {
    /// Create a controller starting from an empty in-memory set.
    ///
    /// Call [`refresh_favorites`](Self::refresh_favorites) to populate
    /// it from the authoritative store for `identity`.
    pub fn new(
        local: LocalFavorites,
        remote: Arc<dyn RemoteFavorites>,
        identity: SessionIdentity,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                favorites: FavoriteSet::new(),
                ledger: MutationLedger::new(),
                identity,
            }),
            local,
            remote,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pure membership check against the active set. Never fails.
    pub fn is_favorite(&self, id: &str) -> bool {
        self.inner().favorites.contains(id)
    }

    /// Snapshot of the active set, in order.
    pub fn favorites(&self) -> Vec<FavoriteId> {
        self.inner().favorites.ids().to_vec()
    }

    /// The identity the controller currently persists under.
    pub fn identity(&self) -> SessionIdentity {
        self.inner().identity.clone()
    }

    /// Optimistically add a favorite, then persist it.
    pub async fn add_favorite(&self, id: impl Into<FavoriteId>) -> ToggleOutcome {
        self.toggle(Mutation::Add(id.into())).await
    }

    /// Optimistically remove a favorite, then persist the removal.
    ///
    /// Removing an id that is not favorited is a silent no-op.
    pub async fn remove_favorite(&self, id: impl Into<FavoriteId>) -> ToggleOutcome {
        self.toggle(Mutation::Remove(id.into())).await
    }

    async fn toggle(&self, mutation: Mutation) -> ToggleOutcome {
        // Phase 1: apply optimistically under the lock.
        let (mut op, identity, snapshot) = {
            let mut guard = self.inner();
            let inner = &mut *guard;
            let op = match inner.ledger.begin(&mut inner.favorites, mutation) {
                Ok(op) => op,
                Err(e) => {
                    tracing::debug!(error = %e, "toggle rejected");
                    return ToggleOutcome::Rejected;
                }
            };
            (op, inner.identity.clone(), inner.favorites.clone())
        };

        // The set was already in the requested state: nothing to
        // persist, the toggle settles immediately.
        if !op.had_effect() {
            let mut guard = self.inner();
            let inner = &mut *guard;
            if let Err(e) = inner.ledger.commit(&mut op) {
                tracing::error!(error = %e, "no-effect toggle failed to settle");
            }
            return ToggleOutcome::Persisted;
        }

        // Phase 2: persist without holding the lock.
        let persisted = self.persist(op.mutation(), &identity, &snapshot).await;

        // Phase 3: settle under the lock.
        let mut guard = self.inner();
        let inner = &mut *guard;
        match persisted {
            Ok(()) => {
                if let Err(e) = inner.ledger.commit(&mut op) {
                    tracing::error!(error = %e, "toggle failed to commit");
                }
                ToggleOutcome::Persisted
            }
            Err(e) => {
                tracing::warn!(
                    coupon_id = %op.favorite_id(),
                    error = %e,
                    "favorite persistence failed, rolling back"
                );
                if let Err(e) = inner.ledger.roll_back(&mut inner.favorites, &mut op) {
                    tracing::error!(error = %e, "toggle failed to roll back");
                }
                ToggleOutcome::RolledBack
            }
        }
    }

    /// Persist one settled mutation: to the local list while anonymous,
    /// via the remote endpoint while authenticated. One attempt, no
    /// retry.
    async fn persist(
        &self,
        mutation: &Mutation,
        identity: &SessionIdentity,
        snapshot: &FavoriteSet,
    ) -> Result<()> {
        if identity.is_authenticated() {
            match mutation {
                Mutation::Add(id) => self.remote.add(id).await,
                Mutation::Remove(id) => self.remote.remove(id).await,
            }
        } else {
            // Anonymous sessions persist the whole updated list under
            // the fixed key; no remote request is ever issued.
            self.local.save(snapshot).await
        }
    }

    /// Discard the in-memory set and reload it from the authoritative
    /// store for the current identity.
    pub async fn refresh_favorites(&self) -> Result<()> {
        let identity = self.identity();

        let ids = if identity.is_authenticated() {
            self.remote.fetch().await?
        } else {
            self.local.load().await?.ids().to_vec()
        };

        let mut guard = self.inner();
        guard.favorites.replace(ids);
        tracing::debug!(count = guard.favorites.len(), "favorites refreshed");
        Ok(())
    }

    /// React to a session identity change.
    ///
    /// An anonymous-to-authenticated transition triggers reconciliation
    /// of the guest favorites followed by a refresh from the remote
    /// store, which is authoritative from then on. Any other change
    /// just switches authority and refreshes. Repeated events carrying
    /// the current identity are ignored.
    pub async fn handle_transition(&self, identity: SessionIdentity) -> Option<ReconcileReport> {
        let previous = {
            let mut guard = self.inner();
            if guard.identity == identity {
                return None;
            }
            std::mem::replace(&mut guard.identity, identity.clone())
        };

        let report = if !previous.is_authenticated() && identity.is_authenticated() {
            match run_reconciliation(&self.local, self.remote.as_ref()).await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::warn!(error = %e, "guest favorites reconciliation failed");
                    None
                }
            }
        } else {
            None
        };

        if let Err(e) = self.refresh_favorites().await {
            tracing::warn!(error = %e, "favorites refresh failed after identity change");
        }

        report
    }

    /// Drive [`handle_transition`](Self::handle_transition) from an
    /// auth subscription until the publisher goes away.
    pub async fn run(&self, mut subscription: AuthSubscription) {
        while let Some(identity) = subscription.changed().await {
            self.handle_transition(identity).await;
        }
        tracing::debug!("auth state publisher dropped, stopping favorites watcher");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use crate::error::ClientError;
    use crate::store::{KeyValueStore, MemoryStore, FAVORITES_KEY};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Recording fake remote with togglable failures.
    #[derive(Default)]
    struct FakeRemote {
        favorites: StdMutex<Vec<FavoriteId>>,
        adds: StdMutex<Vec<FavoriteId>>,
        removes: StdMutex<Vec<FavoriteId>>,
        fetch_count: AtomicUsize,
        fail_all: AtomicBool,
        failing_ids: StdMutex<HashSet<FavoriteId>>,
    }

    impl FakeRemote {
        fn lock<'a, T>(m: &'a StdMutex<T>) -> std::sync::MutexGuard<'a, T> {
            m.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn with_favorites(ids: &[&str]) -> Self {
            let remote = Self::default();
            *Self::lock(&remote.favorites) = ids.iter().map(|s| s.to_string()).collect();
            remote
        }

        fn set_fail_all(&self, fail: bool) {
            self.fail_all.store(fail, Ordering::SeqCst);
        }

        fn should_fail(&self, id: &str) -> bool {
            self.fail_all.load(Ordering::SeqCst) || Self::lock(&self.failing_ids).contains(id)
        }

        fn request_count(&self) -> usize {
            Self::lock(&self.adds).len()
                + Self::lock(&self.removes).len()
                + self.fetch_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteFavorites for FakeRemote {
        async fn fetch(&self) -> Result<Vec<FavoriteId>> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            Ok(Self::lock(&self.favorites).clone())
        }

        async fn add(&self, id: &str) -> Result<()> {
            Self::lock(&self.adds).push(id.to_string());
            if self.should_fail(id) {
                return Err(ClientError::Api {
                    status: 500,
                    message: "simulated failure".into(),
                });
            }
            let mut favorites = Self::lock(&self.favorites);
            if !favorites.iter().any(|existing| existing == id) {
                favorites.push(id.to_string());
            }
            Ok(())
        }

        async fn remove(&self, id: &str) -> Result<()> {
            Self::lock(&self.removes).push(id.to_string());
            if self.should_fail(id) {
                return Err(ClientError::Api {
                    status: 500,
                    message: "simulated failure".into(),
                });
            }
            Self::lock(&self.favorites).retain(|existing| existing != id);
            Ok(())
        }
    }

    fn anonymous_controller(
        store: Arc<MemoryStore>,
        remote: Arc<FakeRemote>,
    ) -> FavoritesController {
        FavoritesController::new(
            LocalFavorites::new(store),
            remote,
            SessionIdentity::Anonymous,
        )
    }

    fn authenticated_controller(
        store: Arc<MemoryStore>,
        remote: Arc<FakeRemote>,
    ) -> FavoritesController {
        FavoritesController::new(
            LocalFavorites::new(store),
            remote,
            SessionIdentity::Authenticated {
                user_id: "u-1".into(),
            },
        )
    }

    #[tokio::test]
    async fn membership_follows_settled_toggles() {
        let controller =
            anonymous_controller(Arc::new(MemoryStore::new()), Arc::new(FakeRemote::default()));

        assert!(!controller.is_favorite("12"));

        assert_eq!(controller.add_favorite("12").await, ToggleOutcome::Persisted);
        assert!(controller.is_favorite("12"));

        // Other ids do not disturb the membership answer.
        controller.add_favorite("45").await;
        controller.add_favorite("7").await;
        assert!(controller.is_favorite("12"));

        assert_eq!(
            controller.remove_favorite("12").await,
            ToggleOutcome::Persisted
        );
        assert!(!controller.is_favorite("12"));
        assert!(controller.is_favorite("45"));
    }

    #[tokio::test]
    async fn anonymous_toggles_never_touch_remote() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let controller = anonymous_controller(store.clone(), remote.clone());

        controller.add_favorite("12").await;
        controller.add_favorite("45").await;
        controller.remove_favorite("12").await;
        controller.refresh_favorites().await.unwrap();

        assert_eq!(remote.request_count(), 0);
        assert_eq!(
            store.get(FAVORITES_KEY).await.unwrap().as_deref(),
            Some(r#"["45"]"#)
        );
    }

    #[tokio::test]
    async fn authenticated_add_goes_remote() {
        let remote = Arc::new(FakeRemote::default());
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());

        assert_eq!(controller.add_favorite("12").await, ToggleOutcome::Persisted);

        assert_eq!(*FakeRemote::lock(&remote.adds), vec!["12"]);
        assert!(controller.is_favorite("12"));
    }

    #[tokio::test]
    async fn double_add_keeps_id_once() {
        let remote = Arc::new(FakeRemote::default());
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());

        controller.add_favorite("12").await;
        controller.add_favorite("12").await;

        assert_eq!(controller.favorites(), vec!["12"]);
        assert_eq!(*FakeRemote::lock(&remote.favorites), vec!["12"]);
    }

    #[tokio::test]
    async fn failed_remote_add_rolls_back_membership() {
        let remote = Arc::new(FakeRemote::default());
        remote.set_fail_all(true);
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());

        assert!(!controller.is_favorite("12"));
        assert_eq!(
            controller.add_favorite("12").await,
            ToggleOutcome::RolledBack
        );

        // Membership returns to its pre-call value after settling.
        assert!(!controller.is_favorite("12"));
    }

    #[tokio::test]
    async fn failed_remote_remove_rolls_back_membership() {
        let remote = Arc::new(FakeRemote::with_favorites(&["12"]));
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());
        controller.refresh_favorites().await.unwrap();
        assert!(controller.is_favorite("12"));

        remote.set_fail_all(true);
        assert_eq!(
            controller.remove_favorite("12").await,
            ToggleOutcome::RolledBack
        );
        assert!(controller.is_favorite("12"));
    }

    #[tokio::test]
    async fn removing_a_non_favorite_is_a_silent_noop() {
        let remote = Arc::new(FakeRemote::default());
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());

        assert_eq!(
            controller.remove_favorite("999").await,
            ToggleOutcome::Persisted
        );
        // No remote request was issued for the no-op.
        assert!(FakeRemote::lock(&remote.removes).is_empty());
    }

    #[tokio::test]
    async fn refresh_discards_in_memory_state() {
        let remote = Arc::new(FakeRemote::with_favorites(&["1", "2"]));
        let controller = authenticated_controller(Arc::new(MemoryStore::new()), remote.clone());

        controller.refresh_favorites().await.unwrap();
        assert_eq!(controller.favorites(), vec!["1", "2"]);

        // The server set changes behind our back; refresh adopts it.
        *FakeRemote::lock(&remote.favorites) = vec!["9".to_string()];
        controller.refresh_favorites().await.unwrap();
        assert_eq!(controller.favorites(), vec!["9"]);
    }

    #[tokio::test]
    async fn login_reconciles_clears_local_and_refreshes_once() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let controller = anonymous_controller(store.clone(), remote.clone());

        controller.add_favorite("12").await;
        controller.add_favorite("45").await;

        let report = controller
            .handle_transition(SessionIdentity::Authenticated {
                user_id: "u-1".into(),
            })
            .await
            .unwrap();

        // Two sequential adds, in local insertion order.
        assert_eq!(*FakeRemote::lock(&remote.adds), vec!["12", "45"]);
        assert_eq!(report.pushed, vec!["12", "45"]);
        assert!(report.failed.is_empty());

        // Local storage is cleared and the remote set is authoritative.
        assert_eq!(store.get(FAVORITES_KEY).await.unwrap(), None);
        assert_eq!(controller.favorites(), vec!["12", "45"]);

        // Exactly one refresh happened.
        assert_eq!(remote.fetch_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn login_with_empty_local_skips_reconciliation() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::with_favorites(&["8"]));
        let controller = anonymous_controller(store, remote.clone());

        let report = controller
            .handle_transition(SessionIdentity::Authenticated {
                user_id: "u-1".into(),
            })
            .await
            .unwrap();

        assert!(report.is_noop());
        assert!(FakeRemote::lock(&remote.adds).is_empty());
        // The session still starts from the remote set.
        assert_eq!(controller.favorites(), vec!["8"]);
    }

    #[tokio::test]
    async fn duplicate_transition_event_is_ignored() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let controller = anonymous_controller(store, remote.clone());
        controller.add_favorite("12").await;

        let identity = SessionIdentity::Authenticated {
            user_id: "u-1".into(),
        };
        assert!(controller.handle_transition(identity.clone()).await.is_some());
        assert!(controller.handle_transition(identity).await.is_none());

        // The guest favorite was pushed once, not twice.
        assert_eq!(*FakeRemote::lock(&remote.adds), vec!["12"]);
    }

    #[tokio::test]
    async fn logout_switches_back_to_local_authority() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let controller = anonymous_controller(store.clone(), remote.clone());

        controller.add_favorite("12").await;
        let _ = controller
            .handle_transition(SessionIdentity::Authenticated {
                user_id: "u-1".into(),
            })
            .await;
        assert_eq!(controller.favorites(), vec!["12"]);

        let _ = controller.handle_transition(SessionIdentity::Anonymous).await;

        // Local storage was cleared during reconciliation, so the guest
        // session starts over empty; the remote copy is untouched.
        assert!(controller.favorites().is_empty());
        assert_eq!(*FakeRemote::lock(&remote.favorites), vec!["12"]);
    }

    #[tokio::test]
    async fn run_reacts_to_published_transitions() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        let controller = Arc::new(anonymous_controller(store.clone(), remote.clone()));
        controller.add_favorite("12").await;

        let auth = AuthState::default();
        let subscription = auth.subscribe();
        let watcher = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run(subscription).await })
        };

        auth.set(SessionIdentity::Authenticated {
            user_id: "u-1".into(),
        });
        drop(auth); // ends the watcher after the pending event drains
        watcher.await.unwrap();

        assert_eq!(*FakeRemote::lock(&remote.adds), vec!["12"]);
        assert_eq!(store.get(FAVORITES_KEY).await.unwrap(), None);
        assert_eq!(controller.favorites(), vec!["12"]);
    }

    #[tokio::test]
    async fn partial_reconciliation_failure_is_surfaced() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(FakeRemote::default());
        FakeRemote::lock(&remote.failing_ids).insert("45".to_string());
        let controller = anonymous_controller(store.clone(), remote.clone());

        controller.add_favorite("12").await;
        controller.add_favorite("45").await;
        controller.add_favorite("7").await;

        let report = controller
            .handle_transition(SessionIdentity::Authenticated {
                user_id: "u-1".into(),
            })
            .await
            .unwrap();

        assert_eq!(report.pushed, vec!["12", "7"]);
        assert_eq!(report.failed, vec!["45"]);
        // Best effort: local cleared, session continues on the remote set.
        assert_eq!(store.get(FAVORITES_KEY).await.unwrap(), None);
        assert_eq!(controller.favorites(), vec!["12", "7"]);
    }
}
