//! # llc-register-client: Client for the LLC Register Store
//!
//! The register store is a separate service holding every register's
//! records. This crate is the only code in the workspace that talks to it.
//!
//! ## Retries
//!
//! Reads are idempotent and may be retried on transport failure
//! (`REGISTER_MAX_RETRIES`). Writes and geometry searches are sent once.
//!
//! ## Record Lookups
//!
//! [`RegisterClient`] implements [`llc_core::RecordSource`], so validators
//! can fetch referenced records through it. A 404 there means "not found",
//! not an error.

pub mod config;
pub mod error;
pub mod records;
pub(crate) mod retry;

pub use config::{ConfigError, RegisterApiConfig};
pub use error::RegisterApiError;
pub use records::{BackendReply, RegisterClient};

use std::time::Duration;

impl RegisterClient {
    /// Create a register store client from configuration.
    pub fn from_config(config: RegisterApiConfig) -> Result<Self, RegisterApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegisterApiError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self::new(http, config.base_url, config.max_retries))
    }
}
