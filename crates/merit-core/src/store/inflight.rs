//! Local ids whose remote create has not answered yet.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(super) struct InFlightCreates {
    inner: Mutex<Tracked>,
}

#[derive(Debug, Default)]
struct Tracked {
    pending: HashSet<String>,
    deleted: HashSet<String>,
}

impl InFlightCreates {
    pub(super) fn begin(&self, local_id: &str) {
        self.lock().pending.insert(local_id.to_string());
    }

    /// Note that the user deleted `local_id`. Only ids with a create in
    /// flight are remembered.
    pub(super) fn mark_deleted(&self, local_id: &str) {
        let mut tracked = self.lock();
        if tracked.pending.contains(local_id) {
            tracked.deleted.insert(local_id.to_string());
        }
    }

    /// Stop tracking `local_id`. Returns whether it was deleted meanwhile.
    pub(super) fn finish(&self, local_id: &str) -> bool {
        let mut tracked = self.lock();
        tracked.pending.remove(local_id);
        tracked.deleted.remove(local_id)
    }

    fn lock(&self) -> MutexGuard<'_, Tracked> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
