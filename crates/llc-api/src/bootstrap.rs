//! # Startup
//!
//! Loads the register registry and schema documents and builds the
//! application state. Any failure here is a configuration error and stops
//! the process before it accepts traffic.

use llc_core::{CompensationConfig, RegisterRegistry, RegistryError};
use llc_register_client::{RegisterApiConfig, RegisterApiError, RegisterClient};
use llc_schema::{SchemaError, SchemaStore};
use llc_validation::CurieCache;
use thiserror::Error;

use crate::state::{AppConfig, AppState};

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Client(#[from] RegisterApiError),
}

/// Build application state from configuration and the environment.
pub fn bootstrap(config: &AppConfig) -> Result<AppState, BootstrapError> {
    let client_config = RegisterApiConfig::from_env().map_err(RegisterApiError::from)?;
    tracing::info!(register_url = %client_config.base_url, "register store configured");
    let client = RegisterClient::from_config(client_config)?;
    bootstrap_with_client(config, client)
}

/// Build application state around an existing register client.
pub fn bootstrap_with_client(
    config: &AppConfig,
    client: RegisterClient,
) -> Result<AppState, BootstrapError> {
    let registry = RegisterRegistry::load(config.registry_path())?;
    let schemas = SchemaStore::load(&config.schema_dir, &registry)?;
    let cache = CurieCache::from_env();
    let compensation = CompensationConfig::from_env();

    tracing::info!(
        registers = registry.len(),
        schema_files = schemas.file_count(),
        curie_cache_capacity = cache.capacity(),
        s8 = %compensation.s8.label(),
        s52 = %compensation.s52.label(),
        "register gateway configured"
    );

    Ok(AppState::new(registry, schemas, client, cache, compensation))
}
