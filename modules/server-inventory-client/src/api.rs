//! The Record API as seen by a client.

use async_trait::async_trait;
use server_inventory_types::{ServerPatch, ServerRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("rejected: {0}")]
    BadRequest(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Each call is one request and one response. Implementations do not
/// retry or cache.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    async fn list(&self) -> Result<Vec<ServerRecord>, ApiError>;

    async fn create(&self, record: &ServerRecord) -> Result<ServerRecord, ApiError>;

    async fn update(&self, id: i64, patch: &ServerPatch) -> Result<ServerRecord, ApiError>;

    async fn delete(&self, id: i64) -> Result<(), ApiError>;

    /// Replaces the whole collection with the parsed YAML text.
    async fn import(&self, yaml: &str) -> Result<(), ApiError>;

    /// The whole collection as YAML text.
    async fn export(&self) -> Result<String, ApiError>;
}
