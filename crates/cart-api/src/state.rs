//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the product catalog, the credential store and the single
//! shopping session every request acts on.

use anyhow::Context;
use cart_core::{Catalog, InMemoryCredentialStore, Session, UserSeed};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Explicit catalog file, otherwise `config/products.toml` is searched
    pub catalog_path: Option<String>,
    /// Explicit user seed file, otherwise `config/users.toml` is searched
    pub users_path: Option<String>,
    /// Pin the business date (demos and tests); defaults to the local date
    pub fixed_today: Option<NaiveDate>,
    /// Emit JSON log lines instead of the human-readable format
    pub json_logs: bool,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            catalog_path: std::env::var("CATALOG_PATH").ok(),
            users_path: std::env::var("USERS_PATH").ok(),
            fixed_today: std::env::var("SMART_CART_TODAY")
                .ok()
                .and_then(|d| d.parse().ok()),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid socket address {}:{}", self.host, self.port))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            catalog_path: None,
            users_path: None,
            fixed_today: None,
            json_logs: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read-only product catalog
    pub catalog: Arc<Catalog>,
    /// Accounts for login and signup
    pub credentials: Arc<RwLock<InMemoryCredentialStore>>,
    /// The one active shopping session; the lock makes each request a single
    /// uninterrupted action
    pub session: Arc<Mutex<Session>>,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create AppState from environment configuration and config files
    pub fn new() -> anyhow::Result<Self> {
        Self::from_config(AppConfig::from_env())
    }

    /// Load the catalog and accounts named by an existing config
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let catalog = load_catalog(config.catalog_path.as_deref())?;
        let credentials = load_credentials(config.users_path.as_deref())?;
        Ok(Self::from_parts(config, catalog, credentials))
    }

    /// Assemble state from already-loaded parts
    pub fn from_parts(
        config: AppConfig,
        catalog: Catalog,
        credentials: InMemoryCredentialStore,
    ) -> Self {
        let session = Session::new(catalog.currency());
        Self {
            catalog: Arc::new(catalog),
            credentials: Arc::new(RwLock::new(credentials)),
            session: Arc::new(Mutex::new(session)),
            config,
        }
    }

    /// Business date used for reservations and refunds
    pub fn today(&self) -> NaiveDate {
        self.config
            .fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

const CONFIG_DIRS: [&str; 3] = ["config", "../config", "../../config"];

/// Read the first existing candidate file, or the explicit path if given
fn read_config_file(explicit: Option<&str>, file_name: &str) -> anyhow::Result<Option<(String, String)>> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path))?;
        return Ok(Some((path.to_string(), content)));
    }

    for dir in CONFIG_DIRS {
        let path = Path::new(dir).join(file_name);
        if let Ok(content) = std::fs::read_to_string(&path) {
            return Ok(Some((path.display().to_string(), content)));
        }
    }
    Ok(None)
}

/// Load product catalog from config file
fn load_catalog(explicit: Option<&str>) -> anyhow::Result<Catalog> {
    match read_config_file(explicit, "products.toml")? {
        Some((path, content)) => {
            let catalog = Catalog::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} products from {}", catalog.len(), path);
            Ok(catalog)
        }
        None => {
            tracing::warn!("No product catalog found, using built-in store inventory");
            Ok(Catalog::demo())
        }
    }
}

/// Load seeded accounts from config file
fn load_credentials(explicit: Option<&str>) -> anyhow::Result<InMemoryCredentialStore> {
    match read_config_file(explicit, "users.toml")? {
        Some((path, content)) => {
            let seed = UserSeed::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} accounts from {}", seed.users.len(), path);
            Ok(InMemoryCredentialStore::from_seed(seed))
        }
        None => {
            tracing::warn!("No user seed found, using demo accounts");
            Ok(InMemoryCredentialStore::demo())
        }
    }
}
