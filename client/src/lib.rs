//! # Clip Client
//!
//! The favorites layer of the Clip coupon client: device-local guest
//! favorites, REST persistence for signed-in accounts, and the
//! reconciliation that merges the former into the latter on login.
//!
//! ## Pieces
//!
//! - [`FavoritesController`] - the caller-facing component: optimistic
//!   `add`/`remove`, pure `is_favorite`, `refresh`, and reaction to
//!   session identity changes.
//! - [`store::local`] - the device-local key-value store and the
//!   fixed-key favorites list used while anonymous.
//! - [`store::remote`] - the REST favorites endpoint
//!   (`GET`/`POST`/`DELETE /favorites`) with the
//!   `{ success, data, message }` envelope.
//! - [`auth`] - session identity and the transition subscription the
//!   controller watches.
//! - [`reconcile`] - the login-time sweep that pushes guest favorites
//!   to the server, one request at a time, then clears local storage.
//!
//! The pure logic (favorites set, optimistic mutation lifecycle,
//! reconciliation plan) lives in `clip-engine`; this crate supplies IO
//! and wiring.
//!
//! ## Wiring it up
//!
//! ```rust,no_run
//! use clip_client::auth::{AuthState, SessionIdentity};
//! use clip_client::config::Config;
//! use clip_client::controller::FavoritesController;
//! use clip_client::store::{FileStore, HttpFavorites, LocalFavorites};
//! use std::sync::Arc;
//!
//! # async fn wire() -> clip_client::error::Result<()> {
//! dotenvy::dotenv().ok();
//! let config = Config::from_env().expect("configuration");
//!
//! let local = LocalFavorites::new(Arc::new(FileStore::new(&config.storage_dir)));
//! let remote = Arc::new(HttpFavorites::new(&config)?);
//! let controller = Arc::new(FavoritesController::new(
//!     local,
//!     remote,
//!     SessionIdentity::Anonymous,
//! ));
//! controller.refresh_favorites().await?;
//!
//! let auth = AuthState::default();
//! tokio::spawn({
//!     let controller = controller.clone();
//!     let subscription = auth.subscribe();
//!     async move { controller.run(subscription).await }
//! });
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod reconcile;
pub mod store;

// Re-export main types at crate root
pub use auth::{AuthState, AuthSubscription, SessionIdentity};
pub use config::{Config, ConfigError};
pub use controller::{FavoritesController, ToggleOutcome};
pub use error::{ClientError, Result};
pub use reconcile::{run_reconciliation, ReconcileReport};
pub use store::{
    FileStore, HttpFavorites, KeyValueStore, LocalFavorites, MemoryStore, RemoteFavorites,
    FAVORITES_KEY,
};
