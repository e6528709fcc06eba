//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything here is either immutable after
//! startup or internally synchronized, so cloning the state is cheap.

use std::path::PathBuf;
use std::sync::Arc;

use llc_core::{CompensationConfig, RegisterRegistry};
use llc_register_client::RegisterClient;
use llc_schema::SchemaStore;
use llc_validation::{CurieCache, Pipeline};

/// Process configuration read at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Directory holding `registers.yaml`.
    pub config_dir: PathBuf,
    /// Directory holding the register schema documents.
    pub schema_dir: PathBuf,
}

impl AppConfig {
    /// Variables: `PORT` (8080), `LLC_CONFIG_DIR` (`config`),
    /// `LLC_SCHEMA_DIR` (`schemas`).
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            config_dir: std::env::var("LLC_CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config")),
            schema_dir: std::env::var("LLC_SCHEMA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("schemas")),
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.config_dir.join("registers.yaml")
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<RegisterRegistry>,
    pub schemas: Arc<SchemaStore>,
    pub client: RegisterClient,
    pub curie_cache: Arc<CurieCache>,
    pub compensation: Arc<CompensationConfig>,
}

impl AppState {
    pub fn new(
        registry: RegisterRegistry,
        schemas: SchemaStore,
        client: RegisterClient,
        curie_cache: CurieCache,
        compensation: CompensationConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            schemas: Arc::new(schemas),
            client,
            curie_cache: Arc::new(curie_cache),
            compensation: Arc::new(compensation),
        }
    }

    /// Validation pipeline backed by the register store client.
    pub fn pipeline(&self) -> Pipeline<'_, RegisterClient> {
        Pipeline {
            registry: &self.registry,
            schemas: &self.schemas,
            cache: &self.curie_cache,
            compensation: &self.compensation,
            source: &self.client,
        }
    }
}
