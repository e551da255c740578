use serde::{Deserialize, Serialize};
use std::fs;
use std::env;
use anyhow::{Result, Context};

const CONFIG_PATH: &str = "data/config.yaml";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Firestore,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_store_backend")]
    pub store_backend: StoreBackend,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub firestore_project_id: String,
    #[serde(default)]
    pub firestore_api_key: Option<String>,
    #[serde(default = "default_firestore_endpoint")]
    pub firestore_endpoint: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_share_reset_ms")]
    pub share_reset_ms: u64,
    #[serde(default = "default_map_zoom")]
    pub map_zoom: u8,
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

fn default_database_path() -> String {
    "data/listings.db".to_string()
}

fn default_firestore_endpoint() -> String {
    crate::firestore::DEFAULT_ENDPOINT.to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn default_user_agent() -> String {
    format!("listing-view/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_share_reset_ms() -> u64 {
    2000 // "Link Copied!" stays up for 2 seconds
}

fn default_map_zoom() -> u8 {
    13
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store_backend: default_store_backend(),
            database_path: default_database_path(),
            firestore_project_id: String::new(),
            firestore_api_key: None,
            firestore_endpoint: default_firestore_endpoint(),
            base_url: default_base_url(),
            tracing_level: default_tracing_level(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            share_reset_ms: default_share_reset_ms(),
            map_zoom: default_map_zoom(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match fs::read_to_string(CONFIG_PATH) {
            Ok(config_str) => Self::from_yaml(&config_str)?,
            Err(_) => Config::default(),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self> {
        serde_yaml::from_str(config_str).context("Failed to parse data/config.yaml")
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(backend) = env::var("STORE_BACKEND") {
            self.store_backend = match backend.to_lowercase().as_str() {
                "sqlite" => StoreBackend::Sqlite,
                "firestore" => StoreBackend::Firestore,
                other => anyhow::bail!("Unknown STORE_BACKEND '{}' (expected sqlite or firestore)", other),
            };
        }

        if let Ok(path) = env::var("DATABASE_PATH") {
            self.database_path = path;
        }

        if let Ok(project_id) = env::var("FIRESTORE_PROJECT_ID") {
            self.firestore_project_id = project_id;
        }

        if let Ok(api_key) = env::var("FIRESTORE_API_KEY") {
            self.firestore_api_key = Some(api_key);
        }

        if let Ok(endpoint) = env::var("FIRESTORE_ENDPOINT") {
            self.firestore_endpoint = endpoint;
        }

        if let Ok(base_url) = env::var("BASE_URL") {
            self.base_url = base_url;
        }

        if let Ok(tracing_level) = env::var("TRACING_LEVEL") {
            self.tracing_level = tracing_level;
        }

        if let Ok(user_agent) = env::var("USER_AGENT") {
            self.user_agent = user_agent;
        }

        if let Ok(share_reset) = env::var("SHARE_RESET_MS") {
            self.share_reset_ms = share_reset.parse()
                .context("Failed to parse SHARE_RESET_MS environment variable")?;
        }

        if let Ok(zoom) = env::var("MAP_ZOOM") {
            self.map_zoom = zoom.parse()
                .context("Failed to parse MAP_ZOOM environment variable")?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_backend == StoreBackend::Firestore && self.firestore_project_id.trim().is_empty() {
            anyhow::bail!("firestore_project_id is required for the firestore backend (set via data/config.yaml or FIRESTORE_PROJECT_ID env var)");
        }

        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }

        if self.map_zoom > 19 {
            anyhow::bail!("map_zoom {} is outside the tile server range 0-19", self.map_zoom);
        }

        Ok(())
    }

    pub fn create_default() -> Result<()> {
        std::fs::create_dir_all("data")?;

        let config_str = serde_yaml::to_string(&Config::default())?;
        fs::write(CONFIG_PATH, config_str)?;
        Ok(())
    }
}
