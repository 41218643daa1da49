//! Persistence layer: a synchronous, string-keyed key-value store.
//!
//! The local record cache, the pending sync queue, the last-sync stamp and the
//! auth session all live in named slots of one [`KeyValueStore`].

mod memory;
mod migrations;
mod sqlite;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// Slot holding the serialized local record cache
pub const RECORDS_KEY: &str = "ggg_records";
/// Slot holding the pending sync queue
pub const SYNC_PENDING_KEY: &str = "ggg_sync_pending";
/// Slot holding the ISO-8601 time of the last successful sync
pub const LAST_SYNC_KEY: &str = "ggg_last_sync";
/// Slot holding the API bearer token
pub const AUTH_TOKEN_KEY: &str = "ggg_auth_token";
/// Slot holding the signed-in user
pub const USER_KEY: &str = "ggg_user";

/// Synchronous string key-value persistence
pub trait KeyValueStore: Send + Sync {
    /// Read a slot; `None` when it was never written or has been removed
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite a slot
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot; removing a missing slot is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Shared handle to the device's key-value store.
pub type SharedStore = Arc<dyn KeyValueStore>;
