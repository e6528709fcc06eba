//! Fixtures shared by this crate's unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use llc_core::{RecordSource, RegisterRegistry, SourceError};
use llc_schema::SchemaStore;
use serde_json::Value;

pub(crate) fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

pub(crate) fn registry() -> RegisterRegistry {
    RegisterRegistry::load(repo_root().join("config/registers.yaml")).unwrap()
}

pub(crate) fn schemas() -> SchemaStore {
    SchemaStore::load(repo_root().join("schemas"), &registry()).unwrap()
}

/// Register store held in memory, counting lookups.
#[derive(Default)]
pub(crate) struct MemorySource {
    records: HashMap<(String, String), Value>,
    fail_status: Option<u16>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub(crate) fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn with(mut self, register: &str, id: &str, record: Value) -> Self {
        self.records
            .insert((register.to_string(), id.to_string()), record);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for MemorySource {
    async fn fetch_record(&self, register: &str, id: &str) -> Result<Option<Value>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_status {
            return Err(SourceError::Backend {
                status,
                body: "store failure".into(),
            });
        }
        Ok(self
            .records
            .get(&(register.to_string(), id.to_string()))
            .cloned())
    }
}
