//! Sync orchestrator.
//!
//! Two states, idle and syncing, held in an [`AtomicBool`]. A sync started
//! while another is in flight returns [`SyncOutcome::AlreadySyncing`]
//! immediately. There is no automatic retry.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

use crate::api::RemoteApi;
use crate::auth::AuthEvent;
use crate::error::Result;
use crate::models::iso_timestamp;
use crate::storage::LAST_SYNC_KEY;

use super::Store;

/// How a sync attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server accepted `pushed` records. `server_records` is the size of
    /// the authoritative set now cached, when the server returned one.
    Synced {
        pushed: usize,
        server_records: Option<usize>,
    },
    /// Cache and pending queue were both empty.
    NothingToSync,
    AlreadySyncing,
    NotAuthenticated,
    /// The remote call failed; local state is untouched.
    Failed(String),
}

impl SyncOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Synced { .. } | Self::NothingToSync)
    }
}

/// Resets the syncing flag when the attempt ends, however it ends.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: RemoteApi> Store<A> {
    /// Push the cache plus pending queue to the server. On success the
    /// server's returned set replaces the cache and the sent snapshots leave
    /// the queue.
    pub async fn sync_to_server(&self) -> Result<SyncOutcome> {
        if !self.api.is_authenticated() {
            return Ok(SyncOutcome::NotAuthenticated);
        }
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            tracing::info!("Sync already in progress");
            return Ok(SyncOutcome::AlreadySyncing);
        };

        let cached = self.cache.load_all()?;
        let pending = self.pending.drain()?;
        if cached.is_empty() && pending.is_empty() {
            tracing::debug!("Nothing to sync");
            return Ok(SyncOutcome::NothingToSync);
        }

        let mut batch = cached;
        batch.extend(pending.iter().cloned());

        let response = match self.api.sync_records(&batch).await {
            Ok(response) => response,
            Err(error) => {
                tracing::error!("Sync failed: {}", error);
                return Ok(SyncOutcome::Failed(error.to_string()));
            }
        };

        self.pending.discard(&pending)?;
        let server_records = match response.server_records {
            Some(server) => {
                let count = server.len();
                // Keep records added locally while the request was in flight.
                let sent: HashSet<&str> = batch.iter().map(|record| record.id.as_str()).collect();
                let mut replacement = server;
                let known: HashSet<String> =
                    replacement.iter().map(|record| record.id.clone()).collect();
                replacement.extend(self.cache.load_all()?.into_iter().filter(|record| {
                    !sent.contains(record.id.as_str()) && !known.contains(&record.id)
                }));
                self.cache.replace_all(&replacement)?;
                Some(count)
            }
            None => None,
        };
        self.kv
            .set(LAST_SYNC_KEY, &iso_timestamp(&self.clock.now()))?;

        tracing::info!(
            "Synced {} records (server returned {:?})",
            batch.len(),
            server_records
        );
        Ok(SyncOutcome::Synced {
            pushed: batch.len(),
            server_records,
        })
    }

    /// Startup reconciliation: when signed in, sync then refresh from the
    /// server. Returns `None` when there is no session.
    pub async fn init(&self) -> Result<Option<SyncOutcome>> {
        if !self.api.is_authenticated() {
            return Ok(None);
        }
        let outcome = self.sync_to_server().await?;
        self.get_all_records().await?;
        Ok(Some(outcome))
    }

    pub async fn handle_auth_event(&self, event: AuthEvent) -> Result<Option<SyncOutcome>> {
        match event {
            AuthEvent::LoggedIn(user) => {
                tracing::info!("User {} signed in; reconciling records", user.id);
                self.init().await
            }
            AuthEvent::LoggedOut => {
                tracing::debug!("Signed out");
                Ok(None)
            }
        }
    }

    /// Run [`init`](Self::init) on every sign-in until the channel closes.
    pub async fn run_auth_listener(&self, mut events: broadcast::Receiver<AuthEvent>) {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} auth events", skipped);
                    match self.api.current_user() {
                        Some(user) if self.api.is_authenticated() => AuthEvent::LoggedIn(user),
                        _ => continue,
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            if let Err(error) = self.handle_auth_event(event).await {
                tracing::error!("Failed to reconcile after auth change: {}", error);
            }
        }
    }
}
