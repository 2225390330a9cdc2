//! Backing storage for the server inventory.
//!
//! The whole collection is read into memory and written back wholesale.
//! There is no locking: two writers interleaving read-modify-write cycles
//! can lose an update.

use server_inventory_types::ServerRecord;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait RecordStore: Send + Sync {
    fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError>;

    /// Replaces the whole stored collection.
    fn write_all(&self, records: &[ServerRecord]) -> Result<(), StoreError>;
}

/// Parses a YAML document holding a top-level sequence of records.
pub fn parse_records(text: &str) -> Result<Vec<ServerRecord>, StoreError> {
    Ok(serde_yaml::from_str(text)?)
}

pub fn render_records(records: &[ServerRecord]) -> Result<String, StoreError> {
    Ok(serde_yaml::to_string(records)?)
}

// =====================================================
// YAML file
// =====================================================

pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for YamlFileStore {
    fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_records(&contents)
    }

    fn write_all(&self, records: &[ServerRecord]) -> Result<(), StoreError> {
        let yaml = render_records(records)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, yaml).map_err(write_err)
    }
}

// =====================================================
// In-memory
// =====================================================

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ServerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ServerRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl RecordStore for MemoryStore {
    fn read_all(&self) -> Result<Vec<ServerRecord>, StoreError> {
        self.records
            .lock()
            .map(|r| r.clone())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn write_all(&self, records: &[ServerRecord]) -> Result<(), StoreError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        *guard = records.to_vec();
        Ok(())
    }
}
