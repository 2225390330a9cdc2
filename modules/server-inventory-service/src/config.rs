use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub yaml_path: PathBuf,
    pub store: StoreKind,
    /// Remote Record API root for the dashboard. In-process when unset.
    pub api_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let store = match lookup("SERVER_INVENTORY_STORE").as_deref() {
            Some("memory") => StoreKind::Memory,
            Some("file") | None => StoreKind::File,
            Some(other) => {
                log::warn!("Unknown SERVER_INVENTORY_STORE '{}', using file", other);
                StoreKind::File
            }
        };

        Self {
            host: lookup("SERVER_INVENTORY_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("SERVER_INVENTORY_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3001),
            yaml_path: lookup("SERVER_INVENTORY_YAML_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./servers.yaml")),
            store,
            api_url: lookup("SERVER_INVENTORY_API_URL").filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Where records come from, for the dashboard header.
    pub fn source_label(&self) -> String {
        match (&self.api_url, self.store) {
            (Some(url), _) => url.clone(),
            (None, StoreKind::File) => self.yaml_path.display().to_string(),
            (None, StoreKind::Memory) => "in-memory".to_string(),
        }
    }
}
