//! Server Inventory Service: standalone binary for managing server records
//! kept in a YAML file.
//!
//! Hosts both the JSON API (`/api/*`) and a dashboard UI on the same port.
//! Default: http://127.0.0.1:3001/

mod config;
mod dashboard;
mod routes;
mod service;
mod store;

use config::{Config, StoreKind};
use routes::AppState;
use server_inventory_client::{Action, Controller, HttpInventoryApi, InventoryApi};
use service::{LocalInventoryApi, RecordService};
use std::sync::Arc;
use std::time::Instant;
use store::{MemoryStore, RecordStore, YamlFileStore};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let store: Arc<dyn RecordStore> = match config.store {
        StoreKind::File => {
            let file = YamlFileStore::new(config.yaml_path.clone());
            log::info!("Using backing file: {}", file.path().display());
            Arc::new(file)
        }
        StoreKind::Memory => {
            log::warn!("Using in-memory store, records are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    let service = Arc::new(RecordService::new(store));

    let api: Arc<dyn InventoryApi> = match &config.api_url {
        Some(url) => {
            log::info!("Dashboard uses remote inventory API at {}", url);
            Arc::new(HttpInventoryApi::new(url.clone()))
        }
        None => Arc::new(LocalInventoryApi::new(service.clone())),
    };

    let mut controller = Controller::new(api);
    controller.dispatch(Action::Load).await.ok();
    log::info!("Loaded {} servers", controller.state().servers.len());

    let state = Arc::new(AppState {
        service,
        controller: Mutex::new(controller),
        start_time: Instant::now(),
        source: config.source_label(),
    });

    let cors = tower_http::cors::CorsLayer::permissive();
    let app = routes::app(state).layer(cors);

    let addr = config.bind_addr();
    log::info!("Server Inventory Service listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
