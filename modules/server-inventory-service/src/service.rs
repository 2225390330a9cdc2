//! Record API: list, create, update, delete, import, export.
//!
//! Every operation reads the whole collection, changes it in memory and
//! writes the whole collection back. Identifiers come from the caller and
//! are neither validated nor deduplicated.

use crate::store::{RecordStore, StoreError, parse_records, render_records};
use async_trait::async_trait;
use server_inventory_client::{ApiError, InventoryApi};
use server_inventory_types::{ServerPatch, ServerRecord};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("Server {0} not found")]
    NotFound(i64),

    #[error("Error importing YAML: {0}")]
    Parse(String),

    #[error("Failed to persist servers: {0}")]
    Write(#[source] StoreError),
}

pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Read failures are logged and treated as an empty collection.
    fn load(&self) -> Vec<ServerRecord> {
        match self.store.read_all() {
            Ok(records) => records,
            Err(e) => {
                log::error!("Error reading servers: {}", e);
                Vec::new()
            }
        }
    }

    fn persist(&self, records: &[ServerRecord]) -> Result<(), InventoryError> {
        self.store.write_all(records).map_err(|e| {
            log::error!("Error writing servers: {}", e);
            InventoryError::Write(e)
        })
    }

    pub fn list(&self) -> Vec<ServerRecord> {
        self.load()
    }

    pub fn count(&self) -> usize {
        self.load().len()
    }

    pub fn create(&self, record: ServerRecord) -> Result<ServerRecord, InventoryError> {
        let mut records = self.load();
        records.push(record.clone());
        self.persist(&records)?;
        log::info!(
            "Added server '{}' (id {:?}), {} total",
            record.server_name,
            record.id,
            records.len()
        );
        Ok(record)
    }

    /// Shallow-merges `patch` onto the first record whose id equals `id`.
    pub fn update(&self, id: i64, patch: ServerPatch) -> Result<ServerRecord, InventoryError> {
        let mut records = self.load();
        let Some(index) = records.iter().position(|r| r.id == Some(id)) else {
            log::warn!("Update for unknown server id {}", id);
            return Err(InventoryError::NotFound(id));
        };
        patch.apply(&mut records[index]);
        self.persist(&records)?;
        Ok(records.swap_remove(index))
    }

    /// Removes every record whose id equals `id`.
    pub fn delete(&self, id: i64) -> Result<(), InventoryError> {
        let mut records = self.load();
        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            log::warn!("Delete for unknown server id {}", id);
            return Err(InventoryError::NotFound(id));
        }
        self.persist(&records)?;
        log::info!("Deleted server id {}", id);
        Ok(())
    }

    /// Replaces the whole collection. Nothing is written if `yaml` does not parse.
    pub fn import(&self, yaml: &str) -> Result<usize, InventoryError> {
        if yaml.trim().is_empty() {
            return Err(InventoryError::Parse("empty document".to_string()));
        }
        let records = parse_records(yaml).map_err(|e| {
            log::warn!("Rejected YAML import: {}", e);
            InventoryError::Parse(e.to_string())
        })?;
        self.persist(&records)?;
        log::info!("Imported {} servers", records.len());
        Ok(records.len())
    }

    pub fn export(&self) -> String {
        let records = self.load();
        match render_records(&records) {
            Ok(yaml) => yaml,
            Err(e) => {
                log::error!("Error rendering servers: {}", e);
                String::new()
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::NotFound(_) => ApiError::NotFound(e.to_string()),
            InventoryError::Parse(_) => ApiError::BadRequest(e.to_string()),
            InventoryError::Write(_) => ApiError::Server {
                status: 500,
                message: e.to_string(),
            },
        }
    }
}

/// In-process `InventoryApi`, used by the dashboard when no remote API is configured.
pub struct LocalInventoryApi {
    service: Arc<RecordService>,
}

impl LocalInventoryApi {
    pub fn new(service: Arc<RecordService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl InventoryApi for LocalInventoryApi {
    async fn list(&self) -> Result<Vec<ServerRecord>, ApiError> {
        Ok(self.service.list())
    }

    async fn create(&self, record: &ServerRecord) -> Result<ServerRecord, ApiError> {
        Ok(self.service.create(record.clone())?)
    }

    async fn update(&self, id: i64, patch: &ServerPatch) -> Result<ServerRecord, ApiError> {
        Ok(self.service.update(id, patch.clone())?)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        Ok(self.service.delete(id)?)
    }

    async fn import(&self, yaml: &str) -> Result<(), ApiError> {
        self.service.import(yaml)?;
        Ok(())
    }

    async fn export(&self) -> Result<String, ApiError> {
        Ok(self.service.export())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Barrier;

    fn record(id: i64, name: &str, standort: &str) -> ServerRecord {
        ServerRecord {
            id: Some(id),
            server_name: name.into(),
            standort: standort.into(),
            ..Default::default()
        }
    }

    fn service_with(records: Vec<ServerRecord>) -> (Arc<MemoryStore>, RecordService) {
        let store = Arc::new(MemoryStore::with_records(records));
        let service = RecordService::new(store.clone());
        (store, service)
    }

    struct FailingWrites;

    impl RecordStore for FailingWrites {
        fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
            Ok(Vec::new())
        }

        fn write_all(&self, _records: &[ServerRecord]) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("disk full".into()))
        }
    }

    struct FailingReads;

    impl RecordStore for FailingReads {
        fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
            Err(StoreError::Unavailable("corrupt".into()))
        }

        fn write_all(&self, _records: &[ServerRecord]) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Holds every reader at a barrier after the read, so concurrent
    /// callers all see the same snapshot before any of them writes.
    struct LockstepStore {
        inner: MemoryStore,
        barrier: Barrier,
    }

    impl RecordStore for LockstepStore {
        fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
            let records = self.inner.read_all();
            self.barrier.wait();
            records
        }

        fn write_all(&self, records: &[ServerRecord]) -> Result<(), StoreError> {
            self.inner.write_all(records)
        }
    }

    #[test]
    fn create_appends_one_record() {
        let (store, service) = service_with(vec![record(1, "db1", "A")]);
        let created = service.create(record(2, "db2", "B")).unwrap();
        assert_eq!(created.server_name, "db2");

        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], record(2, "db2", "B"));
    }

    #[test]
    fn create_does_not_dedupe_ids() {
        let (_, service) = service_with(vec![record(1, "db1", "A")]);
        service.create(record(1, "dup", "A")).unwrap();
        assert_eq!(service.count(), 2);
    }

    #[test]
    fn update_merges_supplied_fields() {
        let (store, service) = service_with(vec![record(1, "db1", "A"), record(2, "db2", "B")]);
        let mut patch = ServerPatch::default();
        patch.fields.insert("standort".into(), "Z".into());

        let merged = service.update(2, patch).unwrap();
        assert_eq!(merged, record(2, "db2", "Z"));
        assert_eq!(store.read_all().unwrap()[1], record(2, "db2", "Z"));
        assert_eq!(store.read_all().unwrap()[0], record(1, "db1", "A"));
    }

    #[test]
    fn update_unknown_id_leaves_store_unchanged() {
        let original = vec![record(1, "db1", "A")];
        let (store, service) = service_with(original.clone());
        let err = service.update(9, ServerPatch::default()).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(9)));
        assert_eq!(store.read_all().unwrap(), original);
    }

    #[test]
    fn delete_removes_matching_record() {
        let (store, service) = service_with(vec![record(1, "db1", "A"), record(2, "db2", "B")]);
        service.delete(1).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![record(2, "db2", "B")]);
    }

    #[test]
    fn delete_unknown_id_leaves_store_unchanged() {
        let original = vec![record(1, "db1", "A")];
        let (store, service) = service_with(original.clone());
        assert!(matches!(service.delete(7), Err(InventoryError::NotFound(7))));
        assert_eq!(store.read_all().unwrap(), original);
    }

    #[test]
    fn malformed_import_leaves_store_unchanged() {
        let original = vec![record(1, "db1", "A")];
        let (store, service) = service_with(original.clone());
        for bad in ["- serverName: [unclosed", "serverName: db1", "   "] {
            let err = service.import(bad).unwrap_err();
            assert!(matches!(err, InventoryError::Parse(_)), "accepted {bad:?}");
        }
        assert_eq!(store.read_all().unwrap(), original);
    }

    #[test]
    fn export_then_import_round_trips() {
        let r = ServerRecord {
            id: Some(11),
            server_name: "sql-01".into(),
            fqdn_prod: "sql-01.example.org".into(),
            ip_prod: "10.0.0.5".into(),
            kommentar: "line one\nline two".into(),
            cc_und_mem: "yes: really".into(),
            ..Default::default()
        };
        let (_, source) = service_with(vec![r.clone()]);
        let yaml = source.export();

        let (store, target) = service_with(vec![record(1, "old", "A")]);
        assert_eq!(target.import(&yaml).unwrap(), 1);
        assert_eq!(store.read_all().unwrap(), vec![r]);
        assert_eq!(target.export(), yaml);
    }

    #[test]
    fn write_failure_is_surfaced() {
        let service = RecordService::new(Arc::new(FailingWrites));
        let err = service.create(record(1, "db1", "A")).unwrap_err();
        assert!(matches!(err, InventoryError::Write(_)));
        assert!(matches!(ApiError::from(err), ApiError::Server { status: 500, .. }));
    }

    #[test]
    fn read_failure_lists_as_empty() {
        let service = RecordService::new(Arc::new(FailingReads));
        assert!(service.list().is_empty());
        assert_eq!(service.export(), "[]\n");
    }

    #[test]
    fn concurrent_creates_can_lose_an_update() {
        let store = Arc::new(LockstepStore {
            inner: MemoryStore::new(),
            barrier: Barrier::new(2),
        });
        let service = RecordService::new(store.clone());

        std::thread::scope(|s| {
            s.spawn(|| service.create(record(1, "db1", "A")).unwrap());
            s.spawn(|| service.create(record(2, "db2", "B")).unwrap());
        });

        // Both writers started from the same empty snapshot, so the last
        // write wins and one record is gone.
        let persisted = store.inner.read_all().unwrap();
        assert_eq!(persisted.len(), 1);
    }

    #[tokio::test]
    async fn local_api_maps_errors() {
        let (_, service) = service_with(vec![record(1, "db1", "A")]);
        let api = LocalInventoryApi::new(Arc::new(service));

        assert_eq!(api.list().await.unwrap().len(), 1);
        assert!(matches!(
            api.delete(5).await,
            Err(ApiError::NotFound(ref m)) if m == "Server 5 not found"
        ));
        assert!(matches!(api.import("{{").await, Err(ApiError::BadRequest(_))));
    }
}
