//! # Curie Resolution
//!
//! [`CurieResolver`] turns `register:id` strings into records, memoizing
//! every answer (found or not found) for the rest of one validation pass.
//! Records of registers marked `cacheable` are also kept in the process-wide
//! [`CurieCache`], so reference data such as statutory provisions is fetched
//! from the register store once per process.
//!
//! ## Cache Bounds
//!
//! The process-wide cache holds at most `CURIE_CACHE_CAPACITY` entries and
//! refuses new keys once full. Entries never expire. A slot is claimed from
//! an atomic counter while the key's entry is locked, so the bound holds
//! under concurrent inserts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use llc_core::{Curie, RecordSource, RegisterDefinition, RegisterRegistry};
use serde_json::Value;

use crate::error::ResolveError;

/// Default bound on the process-wide cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Process-wide cache of found reference records, keyed by curie string.
#[derive(Debug)]
pub struct CurieCache {
    entries: DashMap<String, Value>,
    capacity: usize,
    /// Slots claimed so far; equals `entries.len()` since nothing is removed.
    claimed: AtomicUsize,
}

impl Default for CurieCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl CurieCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            claimed: AtomicUsize::new(0),
        }
    }

    /// Capacity from `CURIE_CACHE_CAPACITY`, falling back to the default.
    pub fn from_env() -> Self {
        let capacity = std::env::var("CURIE_CACHE_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_CAPACITY);
        Self::new(capacity)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Insert or replace an entry. Returns `false` when the cache is full
    /// and `key` is new.
    pub fn insert(&self, key: String, record: Value) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.insert(record);
                true
            }
            Entry::Vacant(slot) => {
                let claimed = self
                    .claimed
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.capacity).then_some(n + 1)
                    });
                if claimed.is_err() {
                    return false;
                }
                slot.insert(record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Resolves curies for one validation pass.
pub struct CurieResolver<'a, S> {
    source: &'a S,
    registry: &'a RegisterRegistry,
    cache: &'a CurieCache,
    pass: HashMap<String, Option<Value>>,
}

impl<'a, S: RecordSource> CurieResolver<'a, S> {
    pub fn new(source: &'a S, registry: &'a RegisterRegistry, cache: &'a CurieCache) -> Self {
        Self {
            source,
            registry,
            cache,
            pass: HashMap::new(),
        }
    }

    /// Resolve a `register:id` string.
    ///
    /// `Ok(None)` means the register store has no such record.
    pub async fn resolve(&mut self, raw: &str) -> Result<Option<Value>, ResolveError> {
        let registry = self.registry;
        let curie = Curie::parse(raw, registry)?;
        let Some(def) = registry.get(curie.register()) else {
            return Ok(None);
        };
        Ok(self.lookup(def, curie.id()).await?)
    }

    /// Fetch a record of a known register by primary id.
    pub async fn fetch(
        &mut self,
        def: &RegisterDefinition,
        id: &str,
    ) -> Result<Option<Value>, llc_core::SourceError> {
        self.lookup(def, id).await
    }

    async fn lookup(
        &mut self,
        def: &RegisterDefinition,
        id: &str,
    ) -> Result<Option<Value>, llc_core::SourceError> {
        let key = Curie::new(def.name.as_str(), id).to_string();
        if let Some(known) = self.pass.get(&key) {
            return Ok(known.clone());
        }
        if def.cacheable {
            if let Some(record) = self.cache.get(&key) {
                tracing::debug!(curie = %key, "curie cache hit");
                self.pass.insert(key, Some(record.clone()));
                return Ok(Some(record));
            }
        }

        tracing::debug!(curie = %key, "curie cache miss");
        let found = self.source.fetch_record(def.path(), id).await?;
        if def.cacheable {
            if let Some(record) = &found {
                if !self.cache.insert(key.clone(), record.clone()) {
                    tracing::debug!(curie = %key, "curie cache full, not caching");
                }
            }
        }
        self.pass.insert(key, found.clone());
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry, MemorySource};
    use llc_core::{CurieError, SourceError};
    use serde_json::json;

    #[tokio::test]
    async fn resolves_found_record() {
        let source = MemorySource::default().with("statutory-provision", "1", json!({"text": "x"}));
        let registry = registry();
        let cache = CurieCache::default();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);

        let record = resolver.resolve("statutory-provision:1").await.unwrap();
        assert_eq!(record, Some(json!({"text": "x"})));
    }

    #[tokio::test]
    async fn not_found_is_none() {
        let source = MemorySource::default();
        let registry = registry();
        let cache = CurieCache::default();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);

        assert_eq!(resolver.resolve("statutory-provision:9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn bad_register_and_malformed() {
        let source = MemorySource::default();
        let registry = registry();
        let cache = CurieCache::default();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);

        assert_eq!(
            resolver.resolve("nope:1").await.unwrap_err(),
            ResolveError::Curie(CurieError::InvalidRegisterReference("nope".into()))
        );
        assert_eq!(
            resolver.resolve("statutory-provision").await.unwrap_err(),
            ResolveError::Curie(CurieError::Malformed("statutory-provision".into()))
        );
        assert_eq!(
            resolver.resolve("statutory-provision:").await.unwrap_err(),
            ResolveError::Curie(CurieError::Malformed("statutory-provision:".into()))
        );
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn backend_failure_is_source_error() {
        let source = MemorySource::failing(503);
        let registry = registry();
        let cache = CurieCache::default();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);

        let err = resolver.resolve("statutory-provision:1").await.unwrap_err();
        assert!(matches!(err, ResolveError::Source(SourceError::Backend { status: 503, .. })));
    }

    #[tokio::test]
    async fn memoizes_within_a_pass() {
        let source = MemorySource::default().with("local-land-charge", "5", json!({}));
        let registry = registry();
        let cache = CurieCache::default();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);

        resolver.resolve("local-land-charge:5").await.unwrap();
        resolver.resolve("local-land-charge:5").await.unwrap();
        resolver.resolve("local-land-charge:6").await.unwrap();
        resolver.resolve("local-land-charge:6").await.unwrap();
        assert_eq!(source.calls(), 2);
        assert!(cache.is_empty(), "charges are not cacheable");
    }

    #[tokio::test]
    async fn cacheable_records_survive_the_pass() {
        let source = MemorySource::default().with("statutory-provision", "1", json!({"text": "x"}));
        let registry = registry();
        let cache = CurieCache::default();

        let mut first = CurieResolver::new(&source, &registry, &cache);
        first.resolve("statutory-provision:1").await.unwrap();
        first.resolve("statutory-provision:2").await.unwrap();
        let mut second = CurieResolver::new(&source, &registry, &cache);
        second.resolve("statutory-provision:1").await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(cache.len(), 1, "not-found answers are not cached");
    }

    #[test]
    fn full_cache_refuses_new_keys() {
        let cache = CurieCache::new(1);
        assert!(cache.insert("a:1".into(), json!(1)));
        assert!(!cache.insert("a:2".into(), json!(2)));
        assert!(cache.insert("a:1".into(), json!(3)));
        assert_eq!(cache.get("a:1"), Some(json!(3)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_inserts_respect_capacity() {
        let cache = CurieCache::new(10);
        std::thread::scope(|scope| {
            for t in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..50 {
                        cache.insert(format!("statutory-provision:{t}-{i}"), json!(i));
                    }
                });
            }
        });
        assert_eq!(cache.len(), 10);
        assert!(!cache.insert("statutory-provision:late".into(), json!(0)));
    }
}
