//! # Clip Engine
//!
//! Deterministic favorites logic for the Clip coupon client.
//!
//! This crate holds the pure half of the favorites feature: the ordered
//! favorites set, the optimistic-mutation state machine, the
//! reconciliation plan that merges guest favorites into an account on
//! login, and the storage codec for the device-local list. It performs
//! no IO - the `clip-client` crate drives it against real storage and
//! the REST backend.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine knows nothing about files, HTTP, or storage
//! - **Deterministic**: the same inputs always produce the same outputs
//! - **Explicit state**: optimistic updates and reconciliation are
//!   modelled as observable state machines, not ad-hoc snapshots
//!
//! ## Core Concepts
//!
//! ### Favorites set
//!
//! [`FavoriteSet`] is an ordered, duplicate-free sequence of coupon
//! ids. Insertion order is preserved because the on-device list is an
//! ordered sequence and reconciliation pushes in that order.
//!
//! ### Optimistic mutations
//!
//! A toggle becomes an [`OptimisticMutation`]: applied to the set
//! immediately, then committed or rolled back once persistence
//! settles. Rollback undoes exactly the diff the mutation made, so
//! in-flight toggles on different ids cannot clobber each other.
//!
//! ### Reconciliation
//!
//! [`ReconcilePlan`] hands out locally favorited ids one at a time, in
//! order, and tracks which pushes succeeded or failed. A failed push
//! does not abort the plan; the outcome is [`PlanState::Completed`] or
//! [`PlanState::PartiallyFailed`] with the failed ids exposed.
//!
//! ## Quick Start
//!
//! ```rust
//! use clip_engine::{FavoriteSet, Mutation, OptimisticMutation, ReconcilePlan, PlanState};
//!
//! // Optimistic toggle that fails to persist:
//! let mut favorites = FavoriteSet::new();
//! let mut op = OptimisticMutation::begin(&mut favorites, Mutation::Add("12".into()));
//! assert!(favorites.contains("12"));
//! op.roll_back(&mut favorites).unwrap();
//! assert!(!favorites.contains("12"));
//!
//! // Reconciling two guest favorites after login:
//! let local = FavoriteSet::from_ids(["12", "45"]);
//! let mut plan = ReconcilePlan::new(&local);
//! while let Some(id) = plan.next().map(Clone::clone) {
//!     // (the client awaits the remote add here)
//!     plan.record_success(&id).unwrap();
//! }
//! assert_eq!(plan.state(), PlanState::Completed);
//! ```

pub mod codec;
pub mod error;
pub mod mutation;
pub mod reconcile;
pub mod set;

// Re-export main types at crate root
pub use codec::{decode_ids, encode_ids};
pub use error::Error;
pub use mutation::{Mutation, MutationLedger, MutationState, OptimisticMutation};
pub use reconcile::{PlanState, ReconcilePlan};
pub use set::FavoriteSet;

/// A coupon identifier - the string form of an integer primary key.
pub type FavoriteId = String;
