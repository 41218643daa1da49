//! The offline-first record store.
//!
//! [`Store`] owns one session's local cache, pending sync queue, and sync
//! guard. Every mutation lands in the local cache before the remote API is
//! tried; remote failures never roll local state back.

mod cache;
mod inflight;
mod records;
pub mod remote;
mod sync;
mod views;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use cache::{PendingQueue, RecordCache};
use inflight::InFlightCreates;
pub use remote::with_remote_fallback;
pub use sync::SyncOutcome;

use crate::api::RemoteApi;
use crate::clock::{Clock, SystemClock};
use crate::config::StorePolicy;
use crate::error::Result;
use crate::models::Record;
use crate::storage::{SharedStore, LAST_SYNC_KEY};

pub struct Store<A> {
    kv: SharedStore,
    cache: RecordCache,
    pending: PendingQueue,
    api: A,
    clock: Arc<dyn Clock>,
    policy: StorePolicy,
    syncing: AtomicBool,
    creating: InFlightCreates,
}

impl<A: RemoteApi> Store<A> {
    pub fn new(kv: SharedStore, api: A, policy: StorePolicy) -> Self {
        Self {
            cache: RecordCache::new(kv.clone()),
            pending: PendingQueue::new(kv.clone()),
            kv,
            api,
            clock: Arc::new(SystemClock),
            policy,
            syncing: AtomicBool::new(false),
            creating: InFlightCreates::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    pub const fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.is_authenticated()
    }

    /// Snapshots waiting for the next sync.
    pub fn pending_records(&self) -> Result<Vec<Record>> {
        self.pending.drain()
    }

    /// ISO-8601 time of the last successful sync.
    pub fn last_sync(&self) -> Result<Option<String>> {
        self.kv.get(LAST_SYNC_KEY)
    }

    /// Sign out. The local cache and pending queue are kept.
    pub fn logout(&self) -> Result<()> {
        self.api.logout()?;
        tracing::info!("Signed out; local records kept");
        Ok(())
    }

    /// Wipe the local cache, pending queue and last-sync stamp.
    pub fn clear_local(&self) -> Result<()> {
        self.cache.clear()?;
        self.pending.clear()?;
        self.kv.remove(LAST_SYNC_KEY)?;
        tracing::info!("Cleared local records");
        Ok(())
    }
}
