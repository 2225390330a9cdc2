//! reqwest-backed client for the `/api` HTTP surface.

use crate::api::{ApiError, InventoryApi};
use async_trait::async_trait;
use reqwest::StatusCode;
use server_inventory_types::{ImportRequest, MessageResponse, ServerPatch, ServerRecord};

pub struct HttpInventoryApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInventoryApi {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Maps non-success statuses to `ApiError`, using the `{message}` body when present.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<MessageResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    log::debug!("Inventory API returned {}: {}", status, message);

    Err(match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST => ApiError::BadRequest(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn list(&self) -> Result<Vec<ServerRecord>, ApiError> {
        let response = self.client.get(self.url("/servers")).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn create(&self, record: &ServerRecord) -> Result<ServerRecord, ApiError> {
        let response = self
            .client
            .post(self.url("/servers"))
            .json(record)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update(&self, id: i64, patch: &ServerPatch) -> Result<ServerRecord, ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/servers/{}", id)))
            .json(patch)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.url(&format!("/servers/{}", id)))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn import(&self, yaml: &str) -> Result<(), ApiError> {
        let body = ImportRequest {
            yaml_data: yaml.to_string(),
        };
        let response = self
            .client
            .post(self.url("/import"))
            .json(&body)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn export(&self) -> Result<String, ApiError> {
        let response = self.client.get(self.url("/export")).send().await?;
        Ok(check(response).await?.text().await?)
    }
}
