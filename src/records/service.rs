//! Request-scoped record service
//!
//! Each call is one load → compute → (save) cycle against the store. Nothing is
//! cached between calls. Mutating calls hold a process-wide gate for the whole
//! cycle so two writers can never interleave and silently drop each other's
//! changes. Reads skip the gate; the file store's rename-on-save means they see
//! either the old collection or the new one.

use parking_lot::Mutex;
use serde_json::Value;

use crate::core::config::RecordsConfig;
use crate::core::{BulkFlush, Collection, Error, OrderingPolicy, Record, Result};
use crate::storage::RecordStore;
use super::ops;

/// Record operations bound to a store and the deployment's policies
pub struct RecordService<S: RecordStore> {
    store: S,
    ordering: OrderingPolicy,
    bulk_flush: BulkFlush,
    write_gate: Mutex<()>,
}

impl<S: RecordStore> RecordService<S> {
    /// Create a service over `store`
    pub fn new(store: S, ordering: OrderingPolicy, bulk_flush: BulkFlush) -> Self {
        Self {
            store,
            ordering,
            bulk_flush,
            write_gate: Mutex::new(()),
        }
    }

    /// Create a service using the policies from `config`
    pub fn from_config(store: S, config: &RecordsConfig) -> Self {
        Self::new(store, config.ordering, config.bulk_flush)
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every record in stored order
    pub fn list(&self) -> Result<Collection> {
        let records = self.store.load()?;
        tracing::debug!("Listing {} records", records.len());
        Ok(ops::list(&records).to_vec())
    }

    /// Record with the given id, or `None` when absent
    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        let records = self.store.load()?;
        let found = ops::get_by_id(&records, id).cloned();
        if found.is_none() {
            tracing::debug!("Record {} not found", id);
        }
        Ok(found)
    }

    /// Create a record from a JSON object body
    pub fn create(&self, body: Value) -> Result<Record> {
        let fields = ops::record_fields(body)
            .inspect_err(|e| tracing::warn!("Rejected create: {}", e))?;

        let _gate = self.write_gate.lock();
        let mut records = self.store.load()?;
        let created = ops::create(&mut records, fields, self.ordering)?;
        self.store.save(&records)?;

        tracing::info!("Created record {}", created.id().unwrap_or_default());
        Ok(created)
    }

    /// Shallow-merge a JSON object body into the record with `id`.
    ///
    /// Returns `None` without saving when the record is absent.
    pub fn update(&self, id: &str, body: Value) -> Result<Option<Record>> {
        let fields = ops::record_fields(body)
            .inspect_err(|e| tracing::warn!("Rejected update of {}: {}", id, e))?;

        let _gate = self.write_gate.lock();
        let mut records = self.store.load()?;
        let Some(updated) = ops::update(&mut records, id, fields) else {
            tracing::debug!("Record {} not found for update", id);
            return Ok(None);
        };
        self.store.save(&records)?;

        tracing::info!("Updated record {}", id);
        Ok(Some(updated))
    }

    /// Remove the record with `id`; absent ids are not an error
    pub fn delete(&self, id: &str) -> Result<()> {
        let _gate = self.write_gate.lock();
        let mut records = self.store.load()?;
        let removed = ops::delete(&mut records, id);
        self.store.save(&records)?;

        tracing::info!("Deleted record {} ({} removed)", id, removed);
        Ok(())
    }

    /// Remove every record listed in the body's `ids` array
    pub fn bulk_delete(&self, body: &Value) -> Result<()> {
        let ids = ops::id_list(body)
            .inspect_err(|e| tracing::warn!("Rejected bulk delete: {}", e))?;

        let _gate = self.write_gate.lock();
        let mut records = self.store.load()?;
        let removed = ops::bulk_delete(&mut records, &ids);
        self.store.save(&records)?;

        tracing::info!("Bulk deleted {} of {} requested records", removed, ids.len());
        Ok(())
    }

    /// Create one record per element of the body's `users` array
    pub fn bulk_create(&self, body: Value) -> Result<Vec<Record>> {
        let payloads = ops::record_payloads(body)
            .inspect_err(|e| tracing::warn!("Rejected bulk create: {}", e))?;

        let _gate = self.write_gate.lock();
        let mut records = self.store.load()?;

        let created = match self.bulk_flush {
            BulkFlush::EveryItem => {
                ops::bulk_create(&mut records, payloads, self.ordering, |current| {
                    self.store.save(current).map_err(Error::from)
                })?
            }
            BulkFlush::OnceAtEnd => {
                let created =
                    ops::bulk_create(&mut records, payloads, self.ordering, |_| Ok(()))?;
                self.store.save(&records)?;
                created
            }
        };

        tracing::info!("Bulk created {} records", created.len());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StorageError;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Memory store that counts saves and can be told to fail them
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        saves: AtomicUsize,
        fail_saves: bool,
    }

    impl RecordStore for CountingStore {
        fn load(&self) -> std::result::Result<Collection, StorageError> {
            self.inner.load()
        }

        fn save(&self, records: &[Record]) -> std::result::Result<(), StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail_saves {
                return Err(StorageError::write("memory", "refused"));
            }
            self.inner.save(records)
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn service(ordering: OrderingPolicy, flush: BulkFlush) -> RecordService<CountingStore> {
        RecordService::new(CountingStore::default(), ordering, flush)
    }

    fn saves(svc: &RecordService<CountingStore>) -> usize {
        svc.store().saves.load(Ordering::SeqCst)
    }

    #[test]
    fn test_create_then_list() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);

        let created = svc.create(json!({"name": "A"})).unwrap();
        assert_eq!(created.id(), Some("1"));

        let listed = svc.list().unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[test]
    fn test_get_missing_is_none() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);
        svc.create(json!({"name": "A"})).unwrap();

        assert!(svc.get("1").unwrap().is_some());
        assert!(svc.get("2").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_does_not_save() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);
        assert!(svc.update("7", json!({"name": "Z"})).unwrap().is_none());
        assert_eq!(saves(&svc), 0);
    }

    #[test]
    fn test_create_rejects_non_object_body() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);
        let err = svc.create(json!([1, 2])).unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(saves(&svc), 0);
    }

    #[test]
    fn test_delete_always_succeeds() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);
        svc.create(json!({"name": "A"})).unwrap();

        svc.delete("1").unwrap();
        let after_first = svc.list().unwrap();
        svc.delete("1").unwrap();

        assert_eq!(svc.list().unwrap(), after_first);
        assert!(after_first.is_empty());
    }

    #[test]
    fn test_bulk_delete_validation_leaves_collection() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);
        svc.create(json!({"name": "A"})).unwrap();
        let before = svc.list().unwrap();

        let err = svc.bulk_delete(&json!({"ids": "1"})).unwrap_err();

        assert!(matches!(err, Error::Validation(ref m) if m == "ids must be an array"));
        assert_eq!(svc.list().unwrap(), before);
        assert_eq!(saves(&svc), 1);
    }

    #[test]
    fn test_bulk_create_flushes_every_item() {
        let svc = service(OrderingPolicy::NewestFirst, BulkFlush::EveryItem);

        let created = svc
            .bulk_create(json!({"users": [{"name": "A"}, {"name": "B"}, {"name": "C"}]}))
            .unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(saves(&svc), 3);
        assert_eq!(svc.list().unwrap().len(), 3);
    }

    #[test]
    fn test_bulk_create_flushes_once_at_end() {
        let svc = service(OrderingPolicy::OldestFirst, BulkFlush::OnceAtEnd);

        let created = svc
            .bulk_create(json!({"users": [{"name": "A"}, {"name": "B"}, {"name": "C"}]}))
            .unwrap();

        let ids: Vec<_> = created.iter().filter_map(Record::id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(saves(&svc), 1);
    }

    #[test]
    fn test_save_failure_surfaces_as_storage_error() {
        let svc = RecordService::new(
            CountingStore {
                fail_saves: true,
                ..Default::default()
            },
            OrderingPolicy::NewestFirst,
            BulkFlush::EveryItem,
        );

        let err = svc.create(json!({"name": "A"})).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Write { .. })));

        let err = svc.bulk_create(json!({"users": [{"name": "A"}, {"name": "B"}]})).unwrap_err();
        assert!(err.is_server_error());
        assert_eq!(saves(&svc), 2);
    }

    #[test]
    fn test_exhausted_id_space_is_server_error_without_save() {
        let store = CountingStore {
            inner: MemoryStore::with_records(vec![Record::with_id(
                Default::default(),
                u64::MAX.to_string(),
            )]),
            ..Default::default()
        };
        let svc = RecordService::new(store, OrderingPolicy::OldestFirst, BulkFlush::EveryItem);

        assert!(svc.create(json!({"name": "A"})).unwrap_err().is_server_error());
        assert!(svc
            .bulk_create(json!({"users": [{"name": "B"}]}))
            .unwrap_err()
            .is_server_error());
        assert_eq!(saves(&svc), 0);
        assert_eq!(svc.list().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_creates_do_not_lose_writes() {
        let svc = Arc::new(RecordService::new(
            MemoryStore::new(),
            OrderingPolicy::NewestFirst,
            BulkFlush::EveryItem,
        ));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let svc = Arc::clone(&svc);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        svc.create(json!({"name": format!("{}-{}", t, i)})).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = svc.list().unwrap();
        assert_eq!(records.len(), 80);
        let ids: Vec<u64> = records.iter().filter_map(Record::numeric_id).collect();
        let expected: Vec<u64> = (1..=80).rev().collect();
        assert_eq!(ids, expected);
    }
}
