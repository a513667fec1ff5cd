//! Persistence ports: the device-local key-value store and the remote
//! REST favorites endpoint.

pub mod local;
pub mod remote;

pub use local::{FileStore, KeyValueStore, LocalFavorites, MemoryStore, FAVORITES_KEY};
pub use remote::{HttpFavorites, RemoteFavorites};
