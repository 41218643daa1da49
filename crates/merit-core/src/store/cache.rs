//! Local record cache and pending sync queue.
//!
//! Both are a JSON array in one key-value slot. There is no partial write:
//! every mutation rewrites the whole collection.

use serde_json::Value;

use crate::error::Result;
use crate::models::{decode_records, Record};
use crate::storage::{SharedStore, RECORDS_KEY, SYNC_PENDING_KEY};

/// A JSON array of records stored under one key.
#[derive(Clone)]
struct RecordSlot {
    kv: SharedStore,
    key: &'static str,
}

impl RecordSlot {
    fn load(&self) -> Result<Vec<Record>> {
        let Some(raw) = self.kv.get(self.key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => Ok(decode_records(values)),
            Err(error) => {
                tracing::warn!("Ignoring corrupt '{}' slot: {}", self.key, error);
                Ok(Vec::new())
            }
        }
    }

    fn store(&self, records: &[Record]) -> Result<()> {
        self.kv.set(self.key, &serde_json::to_string(records)?)?;
        tracing::debug!("Wrote {} records to '{}'", records.len(), self.key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.kv.remove(self.key)
    }
}

/// The persisted local mirror of the user's records.
#[derive(Clone)]
pub struct RecordCache {
    slot: RecordSlot,
}

impl RecordCache {
    pub fn new(kv: SharedStore) -> Self {
        Self {
            slot: RecordSlot {
                kv,
                key: RECORDS_KEY,
            },
        }
    }

    /// Every cached record, in stored order. Missing or corrupt data reads as empty.
    pub fn load_all(&self) -> Result<Vec<Record>> {
        self.slot.load()
    }

    pub fn replace_all(&self, records: &[Record]) -> Result<()> {
        self.slot.store(records)
    }

    pub fn clear(&self) -> Result<()> {
        self.slot.clear()
    }
}

/// Record snapshots not yet confirmed by the server, oldest first.
///
/// Not de-duplicated: a record mutated twice while offline appears twice.
#[derive(Clone)]
pub struct PendingQueue {
    slot: RecordSlot,
}

impl PendingQueue {
    pub fn new(kv: SharedStore) -> Self {
        Self {
            slot: RecordSlot {
                kv,
                key: SYNC_PENDING_KEY,
            },
        }
    }

    pub fn enqueue(&self, record: &Record) -> Result<()> {
        let mut pending = self.slot.load()?;
        pending.push(record.clone());
        self.slot.store(&pending)
    }

    /// Read the queue without clearing it.
    pub fn drain(&self) -> Result<Vec<Record>> {
        self.slot.load()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.slot.load()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        self.slot.clear()
    }

    /// Drop every snapshot of `id`.
    pub fn remove_id(&self, id: &str) -> Result<()> {
        let mut pending = self.slot.load()?;
        let before = pending.len();
        pending.retain(|record| record.id != id);
        if pending.len() != before {
            self.slot.store(&pending)?;
        }
        Ok(())
    }

    /// Remove one occurrence of each snapshot in `sent`, keeping anything
    /// enqueued after `sent` was read.
    pub fn discard(&self, sent: &[Record]) -> Result<()> {
        let mut remaining = self.slot.load()?;
        for record in sent {
            if let Some(position) = remaining.iter().position(|entry| entry == record) {
                remaining.remove(position);
            }
        }
        if remaining.is_empty() {
            self.slot.clear()
        } else {
            self.slot.store(&remaining)
        }
    }
}
