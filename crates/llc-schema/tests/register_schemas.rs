//! Integration test: compose every configured register schema from the
//! repository's `config/` and `schemas/` directories.
//!
//! Catches drift between `registers.yaml` and the schema documents that the
//! startup checks would otherwise only report when the gateway boots.

use std::path::PathBuf;

use llc_core::{Operation, RegisterRegistry};
use llc_schema::{validate, SchemaStore};
use serde_json::{json, Value};

/// Find the repository root.
fn repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates/
    dir.pop(); // repo root
    dir
}

fn load() -> (RegisterRegistry, SchemaStore) {
    let root = repo_root();
    let registry = RegisterRegistry::load(root.join("config/registers.yaml")).unwrap();
    let store = SchemaStore::load(root.join("schemas"), &registry).unwrap();
    (registry, store)
}

#[test]
fn every_register_has_a_schema() {
    let (registry, store) = load();
    assert_eq!(store.register_count(), registry.len());
    assert!(store.file_count() >= 1);
}

#[test]
fn create_and_update_compose_for_every_register() {
    let (registry, store) = load();
    for def in registry.iter() {
        let create = store
            .build_schema(&def.name, Operation::Create, None, None)
            .unwrap_or_else(|e| panic!("{}: {e}", def.name));
        assert!(
            create["properties"].get(&def.primary_id).is_none(),
            "{}: primary id left on create",
            def.name
        );

        let update = store
            .build_schema(&def.name, Operation::Update, Some("1"), None)
            .unwrap_or_else(|e| panic!("{}: {e}", def.name));
        let required: Vec<&str> = update["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&def.primary_id.as_str()), "{}", def.name);
    }
}

#[test]
fn every_subtype_composes() {
    let (registry, store) = load();
    for def in registry.iter() {
        for (tag, _) in store.subtypes(&def.name).unwrap() {
            store
                .build_schema(&def.name, Operation::Create, None, Some(tag))
                .unwrap_or_else(|e| panic!("{} {tag}: {e}", def.name));
        }
    }
}

#[test]
fn geometry_registers_have_search_schemas() {
    let (registry, store) = load();
    for def in registry.iter().filter(|d| d.geometry_search) {
        let schema = store
            .build_schema(&def.name, Operation::Search, None, None)
            .unwrap();
        let errors = validate(&schema, &json!({"geometry": {"type": "Point"}}), &def.primary_id)
            .unwrap();
        assert!(errors.is_empty(), "{}: {errors:?}", def.name);
    }
}
