//! The seam between validation and the register store.

use std::future::Future;

use serde_json::Value;

use crate::error::SourceError;

/// Anything that can fetch a single record by register and id.
///
/// Implemented by the HTTP register client in production and by in-memory
/// maps in tests. `Ok(None)` means the store answered "not found".
pub trait RecordSource: Send + Sync {
    fn fetch_record(
        &self,
        register: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Value>, SourceError>> + Send;
}
