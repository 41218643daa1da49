//! Record service: local-first create, update, delete and reads.

use crate::api::{CreateRecordRequest, RecordFilter, RemoteApi};
use crate::clock::format_date;
use crate::error::Result;
use crate::models::{local_id, NewRecord, Record, RecordUpdate};
use crate::stats::{dedupe_by_id, records_for_date};
use crate::util::normalize_text_option;

use super::{with_remote_fallback, Store};

impl<A: RemoteApi> Store<A> {
    /// Create a record. It is durable in the local cache before this tries
    /// the server; if the server confirms, the cached entry is replaced by the
    /// server's copy, otherwise the local record is queued for sync.
    pub async fn add_record(&self, input: NewRecord) -> Result<Record> {
        input.validate()?;
        let input = NewRecord {
            note: normalize_text_option(input.note),
            ..input
        };

        let now = self.clock.now();
        let mut records = self.cache.load_all()?;
        let mut record = Record::new_local(&input, &now);
        let mut millis = now.timestamp_millis();
        while records.iter().any(|existing| existing.id == record.id) {
            millis += 1;
            record.id = local_id(&record.date, millis);
        }
        records.push(record.clone());
        self.cache.replace_all(&records)?;
        tracing::debug!("Added local record {}", record.id);

        if !self.api.is_authenticated() {
            self.pending.enqueue(&record)?;
            return Ok(record);
        }

        self.creating.begin(&record.id);
        let created = self
            .api
            .create_record(&CreateRecordRequest::from(&record))
            .await;
        let deleted = self.creating.finish(&record.id);

        match created {
            Ok(server) if !server.id.trim().is_empty() => {
                self.adopt_server_copy(&record, server, deleted).await
            }
            Ok(_) => {
                tracing::warn!("Server created record without an id; queued for sync");
                if !deleted {
                    self.pending.enqueue(&record)?;
                }
                Ok(record)
            }
            Err(error) => {
                tracing::warn!("Remote create failed, queued for sync: {}", error);
                if !deleted {
                    self.pending.enqueue(&record)?;
                }
                Ok(record)
            }
        }
    }

    /// Swap the local entry for the server's copy, re-reading the cache since
    /// it may have changed while the create was in flight. A sync or refresh
    /// may already have replaced the local id; the server copy is then added
    /// unless the cache already holds it.
    async fn adopt_server_copy(
        &self,
        local: &Record,
        server: Record,
        deleted: bool,
    ) -> Result<Record> {
        let server = fill_blank_fields(server, local);
        if deleted {
            tracing::info!(
                "Record {} was deleted before the server confirmed it",
                local.id
            );
            if let Err(error) = self.api.delete_record(&server.id).await {
                tracing::warn!("Remote delete of {} failed: {}", server.id, error);
            }
            return Ok(server);
        }

        let mut records = self.cache.load_all()?;
        if let Some(position) = records.iter().position(|record| record.id == local.id) {
            records[position] = server.clone();
            collapse_id(&mut records, position);
        } else if records.iter().any(|record| record.id == server.id) {
            tracing::debug!("Record {} already refreshed as {}", local.id, server.id);
            return Ok(server);
        } else {
            records.push(server.clone());
        }
        self.cache.replace_all(&records)?;
        tracing::debug!("Record {} confirmed as {}", local.id, server.id);
        Ok(server)
    }

    /// Merge `update` into the record `id`. Returns `Ok(None)` when no such
    /// record is cached.
    pub async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<Option<Record>> {
        update.validate()?;
        let update = RecordUpdate {
            note: update.note.map(normalize_text_option),
            ..update
        };

        let mut records = self.cache.load_all()?;
        let Some(position) = latest_position(&records, id) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(records[position].clone()));
        }

        update.apply_to(&mut records[position], &self.clock.now());
        let updated = records[position].clone();
        collapse_id(&mut records, position);
        self.cache.replace_all(&records)?;
        tracing::debug!("Updated local record {}", id);

        if !self.api.is_authenticated() {
            self.pending.enqueue(&updated)?;
            return Ok(Some(updated));
        }
        if let Err(error) = self.api.update_record(id, &update).await {
            tracing::warn!("Remote update of {} failed, queued for sync: {}", id, error);
            self.pending.enqueue(&updated)?;
        }
        Ok(Some(updated))
    }

    /// Remove `id` locally, including queued snapshots, then best-effort on
    /// the server. Returns whether a cached record was removed.
    pub async fn delete_record(&self, id: &str) -> Result<bool> {
        self.creating.mark_deleted(id);
        let mut records = self.cache.load_all()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        let removed = records.len() != before;
        if removed {
            self.cache.replace_all(&records)?;
            tracing::debug!("Deleted local record {}", id);
        }
        self.pending.remove_id(id)?;

        if self.api.is_authenticated() {
            if let Err(error) = self.api.delete_record(id).await {
                tracing::warn!("Remote delete of {} failed: {}", id, error);
            }
        }
        Ok(removed)
    }

    /// Every record, de-duplicated by id. When signed in, the server's list
    /// refreshes the cache; snapshots still pending sync are kept alongside.
    pub async fn get_all_records(&self) -> Result<Vec<Record>> {
        let records = with_remote_fallback(
            "get_all_records",
            self.api.is_authenticated(),
            || async {
                let server = self.api.get_records(&RecordFilter::default()).await?;
                let merged = self.with_pending(server)?;
                self.cache.replace_all(&merged)?;
                Ok(merged)
            },
            || self.cache.load_all(),
        )
        .await?;
        Ok(dedupe_by_id(&records).into_iter().cloned().collect())
    }

    pub fn get_record(&self, id: &str) -> Result<Option<Record>> {
        let records = self.cache.load_all()?;
        Ok(dedupe_by_id(&records)
            .into_iter()
            .find(|record| record.id == id)
            .cloned())
    }

    /// Distinct records of one day, ordered by time of day.
    pub fn get_records_by_date(&self, date: &str) -> Result<Vec<Record>> {
        let records = self.cache.load_all()?;
        Ok(records_for_date(&records, date).into_iter().cloned().collect())
    }

    pub fn get_today_records(&self) -> Result<Vec<Record>> {
        self.get_records_by_date(&format_date(self.clock.today()))
    }

    /// Whether an offline user has logged enough today to be nudged to sign in.
    pub fn should_prompt_login(&self) -> Result<bool> {
        if self.api.is_authenticated() {
            return Ok(false);
        }
        Ok(self.get_today_records()?.len() >= self.policy.login_prompt_threshold)
    }

    /// `server` merged with the queued snapshots, one record per id. A queued
    /// snapshot newer than the server's copy wins.
    pub(super) fn with_pending(&self, mut server: Vec<Record>) -> Result<Vec<Record>> {
        server.extend(self.pending.drain()?);
        Ok(dedupe_by_id(&server).into_iter().cloned().collect())
    }
}

/// Index of the copy of `id` that reads return.
fn latest_position(records: &[Record], id: &str) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| record.id == id && record.is_countable())
        .max_by(|(_, left), (_, right)| left.recency_cmp(right))
        .map(|(position, _)| position)
}

/// Drop every other copy of the id held at `keep`.
fn collapse_id(records: &mut Vec<Record>, keep: usize) {
    let id = records[keep].id.clone();
    let mut index = 0;
    records.retain(|record| {
        let retained = index == keep || record.id != id;
        index += 1;
        retained
    });
}

/// The server's copy, with blanks filled from the local record.
fn fill_blank_fields(mut server: Record, local: &Record) -> Record {
    for (field, fallback) in [
        (&mut server.date, &local.date),
        (&mut server.time, &local.time),
        (&mut server.created_at, &local.created_at),
        (&mut server.updated_at, &local.updated_at),
    ] {
        if field.trim().is_empty() {
            field.clone_from(fallback);
        }
    }
    if server.score == 0 {
        server.score = local.score;
    }
    server
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;
    use crate::models::RecordKind;
    use crate::store::SyncOutcome;
    use crate::testing::{fixed_now, fixed_store, server_record, FakeRemote};

    fn cached_ids<A: RemoteApi>(store: &Store<A>) -> Vec<String> {
        store
            .cache
            .load_all()
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect()
    }

    #[tokio::test]
    async fn add_record_is_local_and_retrievable_before_sync() {
        let store = fixed_store(FakeRemote::offline());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 10).with_note("  helped  "))
            .await
            .unwrap();

        assert_eq!(record.date, "2026-10-14");
        assert_eq!(record.time, "09:30");
        assert_eq!(record.note.as_deref(), Some("helped"));
        assert_eq!(
            record.id,
            format!("2026-10-14-{}", fixed_now().timestamp_millis())
        );
        assert_eq!(store.get_record(&record.id).unwrap(), Some(record.clone()));
        assert_eq!(store.pending_records().unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn add_record_rejects_invalid_input_without_writing() {
        let store = fixed_store(FakeRemote::offline());
        let error = store
            .add_record(NewRecord::new(RecordKind::Fault, 1001))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        let error = store
            .add_record(NewRecord::new(RecordKind::Fault, 1).with_note("x".repeat(501)))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::InvalidInput(_)));
        assert!(store.get_all_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn local_ids_stay_unique_within_one_millisecond() {
        let store = fixed_store(FakeRemote::offline());
        let first = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();
        let second = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.get_all_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn add_record_adopts_server_identity() {
        let remote = FakeRemote::authenticated();
        let store = fixed_store(remote.clone());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 30))
            .await
            .unwrap();

        assert_eq!(record.id, "srv-1");
        assert_eq!(record.date, "2026-10-14");
        let cached = store.get_records_by_date("2026-10-14").unwrap();
        assert_eq!(cached, vec![record]);
        assert!(store.pending_records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_keeps_record_and_queues_it_once() {
        let remote = FakeRemote::authenticated();
        remote.set_failing(true);
        let store = fixed_store(remote.clone());
        let record = store
            .add_record(NewRecord::new(RecordKind::Fault, 10))
            .await
            .unwrap();

        let all = store.get_all_records().await.unwrap();
        assert_eq!(all, vec![record.clone()]);
        let pending = store.pending_records().unwrap();
        assert_eq!(pending, vec![record]);
        assert_eq!(remote.calls("create_record"), 1);
    }

    #[tokio::test]
    async fn get_all_records_keeps_pending_when_server_lacks_them() {
        let remote = FakeRemote::offline();
        let store = fixed_store(remote.clone());
        let local = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();

        remote.set_server_records(vec![server_record("srv-9", "2026-10-13", RecordKind::Fault, 5)]);
        remote.set_authenticated(true);

        let all = store.get_all_records().await.unwrap();
        let ids = all.iter().map(|record| record.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["srv-9", local.id.as_str()]);
    }

    #[tokio::test]
    async fn update_record_merges_and_queues_offline() {
        let store = fixed_store(FakeRemote::offline());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 1).with_note("first"))
            .await
            .unwrap();

        let updated = store
            .update_record(
                &record.id,
                RecordUpdate {
                    score: Some(100),
                    note: Some(None),
                    ..RecordUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.score, 100);
        assert_eq!(updated.note, None);
        assert_eq!(updated.created_at, record.created_at);
        assert_eq!(store.get_record(&record.id).unwrap(), Some(updated.clone()));
        assert_eq!(store.pending_records().unwrap(), vec![record, updated]);
    }

    #[tokio::test]
    async fn update_unknown_record_is_none() {
        let store = fixed_store(FakeRemote::offline());
        let result = store
            .update_record(
                "missing",
                RecordUpdate {
                    score: Some(5),
                    ..RecordUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(result, None);
        assert!(store.pending_records().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_remote_failure_queues_snapshot() {
        let remote = FakeRemote::authenticated();
        let store = fixed_store(remote.clone());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();
        remote.set_failing(true);

        let updated = store
            .update_record(
                &record.id,
                RecordUpdate {
                    kind: Some(RecordKind::Fault),
                    ..RecordUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.kind, RecordKind::Fault);
        assert_eq!(store.pending_records().unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn failed_update_survives_server_refresh() {
        let remote = FakeRemote::authenticated();
        let store = fixed_store(remote.clone());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();
        let mut stale = record.clone();
        stale.updated_at = "2026-10-13T00:00:00.000Z".to_string();
        remote.set_server_records(vec![stale]);

        remote.set_failing(true);
        store
            .update_record(
                &record.id,
                RecordUpdate {
                    score: Some(100),
                    ..RecordUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        remote.set_failing(false);

        let all = store.get_all_records().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].score, 100);
        assert_eq!(store.get_record(&record.id).unwrap().unwrap().score, 100);
        assert_eq!(store.pending_records().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sync_during_create_keeps_the_new_record() {
        let remote = FakeRemote::authenticated();
        remote.set_sync_response(Some(vec![server_record(
            "srv-1",
            "2026-10-14",
            RecordKind::Merit,
            10,
        )]));
        let gate = remote.gate_create();
        let store = fixed_store(remote.clone());

        let (added, synced) = tokio::join!(
            store.add_record(NewRecord::new(RecordKind::Merit, 10)),
            async {
                remote.wait_for_create_start().await;
                let outcome = store.sync_to_server().await;
                gate.notify_one();
                outcome
            }
        );

        assert_eq!(
            synced.unwrap(),
            SyncOutcome::Synced {
                pushed: 1,
                server_records: Some(1),
            }
        );
        assert_eq!(added.unwrap().id, "srv-1");
        assert_eq!(remote.calls("delete_record"), 0);
        assert_eq!(cached_ids(&store), vec!["srv-1"]);
        let all = store.get_all_records().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "srv-1");
    }

    #[tokio::test]
    async fn refresh_during_create_keeps_the_new_record() {
        let remote = FakeRemote::authenticated();
        let gate = remote.gate_create();
        let store = fixed_store(remote.clone());

        let (added, refreshed) = tokio::join!(
            store.add_record(NewRecord::new(RecordKind::Fault, 30)),
            async {
                remote.wait_for_create_start().await;
                let refreshed = store.get_all_records().await;
                gate.notify_one();
                refreshed
            }
        );

        assert!(refreshed.unwrap().is_empty());
        let added = added.unwrap();
        assert_eq!(added.id, "srv-1");
        assert_eq!(remote.calls("delete_record"), 0);
        assert_eq!(store.get_record("srv-1").unwrap(), Some(added));
    }

    #[tokio::test]
    async fn delete_during_create_removes_the_server_copy() {
        let remote = FakeRemote::authenticated();
        let gate = remote.gate_create();
        let store = fixed_store(remote.clone());

        let (added, deleted) = tokio::join!(
            store.add_record(NewRecord::new(RecordKind::Merit, 1)),
            async {
                remote.wait_for_create_start().await;
                let local = store.get_today_records().unwrap().remove(0);
                let deleted = store.delete_record(&local.id).await;
                gate.notify_one();
                deleted
            }
        );

        assert!(deleted.unwrap());
        assert_eq!(added.unwrap().id, "srv-1");
        // One delete for the local id, one for the server copy.
        assert_eq!(remote.calls("delete_record"), 2);
        assert!(cached_ids(&store).is_empty());
        assert!(store.pending_records().unwrap().is_empty());
        assert!(store.get_all_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_is_local_even_when_remote_fails() {
        let remote = FakeRemote::authenticated();
        remote.set_failing(true);
        let store = fixed_store(remote.clone());
        let record = store
            .add_record(NewRecord::new(RecordKind::Merit, 1))
            .await
            .unwrap();

        assert!(store.delete_record(&record.id).await.unwrap());
        assert_eq!(store.get_record(&record.id).unwrap(), None);
        assert!(store.pending_records().unwrap().is_empty());
        assert_eq!(remote.calls("delete_record"), 1);

        assert!(!store.delete_record(&record.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_ids_surface_once_with_latest_snapshot() {
        let store = fixed_store(FakeRemote::offline());
        let mut older = server_record("dup", "2026-10-14", RecordKind::Merit, 1);
        older.created_at = "2026-10-14T07:00:00.000Z".to_string();
        let mut newer = older.clone();
        newer.score = 30;
        newer.created_at = "2026-10-14T08:00:00.000Z".to_string();
        store.cache.replace_all(&[newer.clone(), older]).unwrap();

        assert_eq!(store.get_records_by_date("2026-10-14").unwrap(), vec![newer.clone()]);
        assert_eq!(store.day_stats("2026-10-14").unwrap().merit, 30);
        assert_eq!(store.get_all_records().await.unwrap(), vec![newer]);
    }

    #[tokio::test]
    async fn update_targets_the_copy_reads_return() {
        let store = fixed_store(FakeRemote::offline());
        let mut newer = server_record("dup", "2026-10-14", RecordKind::Merit, 30);
        newer.created_at = "2026-10-14T08:00:00.000Z".to_string();
        let mut older = newer.clone();
        older.score = 1;
        older.created_at = "2026-10-14T07:00:00.000Z".to_string();
        store.cache.replace_all(&[newer, older]).unwrap();

        let updated = store
            .update_record(
                "dup",
                RecordUpdate {
                    score: Some(100),
                    ..RecordUpdate::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.score, 100);
        assert_eq!(updated.created_at, "2026-10-14T08:00:00.000Z");
        assert_eq!(store.get_record("dup").unwrap(), Some(updated));
        assert_eq!(cached_ids(&store), vec!["dup"]);
    }

    #[tokio::test]
    async fn login_prompt_after_threshold_when_offline() {
        let remote = FakeRemote::offline();
        let store = fixed_store(remote.clone());
        for _ in 0..2 {
            store
                .add_record(NewRecord::new(RecordKind::Merit, 1))
                .await
                .unwrap();
        }
        assert!(!store.should_prompt_login().unwrap());

        store
            .add_record(NewRecord::new(RecordKind::Fault, 1))
            .await
            .unwrap();
        assert!(store.should_prompt_login().unwrap());

        remote.set_authenticated(true);
        assert!(!store.should_prompt_login().unwrap());
    }

    #[test]
    fn blank_server_fields_are_filled_from_local() {
        let local = server_record("2026-10-14-1", "2026-10-14", RecordKind::Merit, 10);
        let mut server = server_record("srv-1", "", RecordKind::Merit, 0);
        server.time = String::new();

        let merged = fill_blank_fields(server, &local);
        assert_eq!(merged.id, "srv-1");
        assert_eq!(merged.date, "2026-10-14");
        assert_eq!(merged.time, local.time);
        assert_eq!(merged.score, 10);
    }
}
