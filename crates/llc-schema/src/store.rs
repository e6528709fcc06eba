//! # Schema Store
//!
//! Loads every register's schema document at startup and builds the schema
//! used for one validation call.
//!
//! ## Copy Discipline
//!
//! Loaded documents are never mutated. The composition of a record
//! definition with an optional subtype is cached per register behind a
//! read-write lock, and every [`SchemaStore::build_schema`] call clones that
//! cached value before applying operation-specific changes. Nothing one
//! request does to its schema is visible to another.
//!
//! ## Operation Mutations
//!
//! | Operation | Change |
//! |-----------|--------|
//! | Create    | primary id and server-assigned fields removed |
//! | Update    | primary id pinned to the URL id and required |
//! | Search    | search definition used instead of the record |

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jsonschema::Validator;
use llc_core::{ConditionalRequirement, Operation, RegisterDefinition, RegisterRegistry, SubtypeTag};
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::validate::{compile, NON_BLANK_PATTERN};

/// Schema configuration for one register.
#[derive(Debug)]
struct RegisterSchema {
    definitions: Arc<Value>,
    primary_id: String,
    record: String,
    search: Option<String>,
    subtypes: BTreeMap<SubtypeTag, String>,
    server_assigned: Vec<String>,
    conditional_required: Vec<ConditionalRequirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CompositionKey {
    register: String,
    search: bool,
    subtype: Option<SubtypeTag>,
}

/// Loaded schema documents plus the composition caches.
pub struct SchemaStore {
    schema_dir: PathBuf,
    file_count: usize,
    registers: HashMap<String, RegisterSchema>,
    composed: RwLock<HashMap<CompositionKey, Arc<Value>>>,
    subtype_validators: RwLock<HashMap<(String, SubtypeTag), Arc<Validator>>>,
}

impl std::fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStore")
            .field("schema_dir", &self.schema_dir)
            .field("file_count", &self.file_count)
            .field("registers", &self.registers.len())
            .field("composed", &self.composed.read().len())
            .finish()
    }
}

impl SchemaStore {
    /// Load the schema document of every register in `registry`.
    ///
    /// Fails if a file is missing or unparseable, a referenced definition is
    /// absent, a subtype redefines a base property, or a composed schema does
    /// not compile. All of these are configuration errors.
    pub fn load(
        schema_dir: impl AsRef<Path>,
        registry: &RegisterRegistry,
    ) -> Result<Self, SchemaError> {
        let schema_dir = schema_dir.as_ref().to_path_buf();
        let mut documents: HashMap<String, Arc<Value>> = HashMap::new();
        let mut registers = HashMap::with_capacity(registry.len());

        for def in registry.iter() {
            let definitions = match documents.get(&def.schema) {
                Some(doc) => Arc::clone(doc),
                None => {
                    let doc = Arc::new(load_definitions(&schema_dir, &def.schema)?);
                    documents.insert(def.schema.clone(), Arc::clone(&doc));
                    doc
                }
            };
            check_register(def, &definitions)?;
            registers.insert(
                def.name.clone(),
                RegisterSchema {
                    definitions,
                    primary_id: def.primary_id.clone(),
                    record: def.record.clone(),
                    search: def.search.clone(),
                    subtypes: def.subtypes.clone(),
                    server_assigned: def.server_assigned.clone(),
                    conditional_required: def.conditional_required.clone(),
                },
            );
        }

        let store = Self {
            schema_dir,
            file_count: documents.len(),
            registers,
            composed: RwLock::new(HashMap::new()),
            subtype_validators: RwLock::new(HashMap::new()),
        };
        store.compile_all(registry)?;

        tracing::info!(
            schema_dir = %store.schema_dir.display(),
            files = store.file_count,
            registers = store.registers.len(),
            "loaded register schemas"
        );
        Ok(store)
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Number of distinct schema files loaded.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Build the schema for one validation call.
    ///
    /// The returned value is a private deep copy. `primary_id` is required for
    /// [`Operation::Update`]; `subtype` is ignored for [`Operation::Search`].
    pub fn build_schema(
        &self,
        register: &str,
        operation: Operation,
        primary_id: Option<&str>,
        subtype: Option<SubtypeTag>,
    ) -> Result<Value, SchemaError> {
        let entry = self.entry(register)?;
        let search = operation == Operation::Search;
        let key = CompositionKey {
            register: register.to_string(),
            search,
            subtype: if search { None } else { subtype },
        };
        let base = self.composed(entry, key)?;
        let mut schema = Value::clone(&base);

        match operation {
            Operation::Create => {
                remove_property(&mut schema, &entry.primary_id);
                for field in &entry.server_assigned {
                    remove_property(&mut schema, field);
                }
            }
            Operation::Update => {
                let id =
                    primary_id.ok_or_else(|| SchemaError::MissingPrimaryId(register.to_string()))?;
                pin_primary_id(&mut schema, &entry.primary_id, id);
            }
            Operation::Search => {}
        }

        drop_empty_required(&mut schema);
        Ok(schema)
    }

    /// Tighten `schema` with the register's conditional requirements that
    /// `payload` triggers.
    pub fn apply_conditional_required(
        &self,
        register: &str,
        schema: &mut Value,
        payload: &Value,
    ) -> Result<(), SchemaError> {
        let entry = self.entry(register)?;
        for rule in &entry.conditional_required {
            let triggered = payload
                .get(&rule.when)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !triggered {
                continue;
            }
            if let Some(props) = properties_mut(schema) {
                let prop = props
                    .entry(rule.require.clone())
                    .or_insert_with(|| json!({"type": "string"}));
                if let Some(obj) = prop.as_object_mut() {
                    obj.insert("pattern".into(), Value::String(NON_BLANK_PATTERN.into()));
                }
            }
            push_required(schema, &rule.require);
        }
        Ok(())
    }

    /// Whether `payload` satisfies the subtype definition on its own.
    pub fn conforms_to_subtype(
        &self,
        register: &str,
        subtype: SubtypeTag,
        payload: &Value,
    ) -> Result<bool, SchemaError> {
        let key = (register.to_string(), subtype);
        if let Some(validator) = self.subtype_validators.read().get(&key) {
            return Ok(validator.is_valid(payload));
        }

        let entry = self.entry(register)?;
        let definition = entry
            .subtypes
            .get(&subtype)
            .ok_or_else(|| SchemaError::UnknownSubtype {
                register: register.to_string(),
                subtype,
            })?;
        let schema = json!({
            "definitions": Value::clone(&entry.definitions),
            "allOf": [{"$ref": format!("#/definitions/{definition}")}]
        });
        let validator = Arc::new(compile(&schema)?);
        let conforms = validator.is_valid(payload);
        self.subtype_validators.write().insert(key, validator);
        Ok(conforms)
    }

    /// Subtype tags and their definition names for a register.
    pub fn subtypes(&self, register: &str) -> Result<Vec<(SubtypeTag, String)>, SchemaError> {
        let entry = self.entry(register)?;
        Ok(entry
            .subtypes
            .iter()
            .map(|(tag, name)| (*tag, name.clone()))
            .collect())
    }

    fn entry(&self, register: &str) -> Result<&RegisterSchema, SchemaError> {
        self.registers
            .get(register)
            .ok_or_else(|| SchemaError::UnknownRegister(register.to_string()))
    }

    fn composed(
        &self,
        entry: &RegisterSchema,
        key: CompositionKey,
    ) -> Result<Arc<Value>, SchemaError> {
        if let Some(hit) = self.composed.read().get(&key) {
            return Ok(Arc::clone(hit));
        }
        let value = Arc::new(compose(entry, &key)?);
        let mut cache = self.composed.write();
        Ok(Arc::clone(cache.entry(key).or_insert(value)))
    }

    /// Compile every schema shape each register can produce.
    fn compile_all(&self, registry: &RegisterRegistry) -> Result<(), SchemaError> {
        for def in registry.iter() {
            let mut shapes = vec![(Operation::Create, None)];
            shapes.extend(def.subtypes.keys().map(|tag| (Operation::Create, Some(*tag))));
            if def.search.is_some() {
                shapes.push((Operation::Search, None));
            }
            for (operation, subtype) in shapes {
                let schema = self.build_schema(&def.name, operation, None, subtype)?;
                compile(&schema).map_err(|e| {
                    SchemaError::InvalidSchema(format!("register '{}': {e}", def.name))
                })?;
            }
            for tag in def.subtypes.keys() {
                self.conforms_to_subtype(&def.name, *tag, &Value::Null)?;
            }
        }
        Ok(())
    }
}

fn load_definitions(schema_dir: &Path, file: &str) -> Result<Value, SchemaError> {
    let path = schema_dir.join(file);
    let content = std::fs::read_to_string(&path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut doc: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Parse {
        file: file.to_string(),
        reason: e.to_string(),
    })?;
    match doc.get_mut("definitions").map(Value::take) {
        Some(defs @ Value::Object(_)) => Ok(defs),
        _ => Err(SchemaError::MissingDefinitions {
            file: file.to_string(),
        }),
    }
}

fn check_register(def: &RegisterDefinition, definitions: &Value) -> Result<(), SchemaError> {
    let lookup = |name: &str| {
        definitions
            .get(name)
            .filter(|d| d.is_object())
            .ok_or_else(|| SchemaError::MissingDefinition {
                register: def.name.clone(),
                definition: name.to_string(),
            })
    };

    let record = lookup(&def.record)?;
    if let Some(search) = &def.search {
        lookup(search)?;
    }

    let base_props = record.get("properties").and_then(Value::as_object);
    for (tag, name) in &def.subtypes {
        let sub = lookup(name)?;
        let (Some(base), Some(extra)) = (base_props, sub.get("properties").and_then(Value::as_object))
        else {
            continue;
        };
        if let Some(dup) = extra.keys().find(|k| base.contains_key(*k)) {
            return Err(SchemaError::DuplicateProperty {
                register: def.name.clone(),
                subtype: *tag,
                property: dup.clone(),
            });
        }
    }
    Ok(())
}

fn compose(entry: &RegisterSchema, key: &CompositionKey) -> Result<Value, SchemaError> {
    let name = if key.search {
        entry
            .search
            .as_deref()
            .ok_or_else(|| SchemaError::NoSearchDefinition(key.register.clone()))?
    } else {
        entry.record.as_str()
    };
    let base = &entry.definitions[name];

    let mut properties = base
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut required = required_list(base);

    if let Some(tag) = key.subtype {
        let sub_name = entry
            .subtypes
            .get(&tag)
            .ok_or_else(|| SchemaError::UnknownSubtype {
                register: key.register.clone(),
                subtype: tag,
            })?;
        let sub = &entry.definitions[sub_name.as_str()];
        if let Some(extra) = sub.get("properties").and_then(Value::as_object) {
            for (field, constraint) in extra {
                properties.insert(field.clone(), constraint.clone());
            }
        }
        for field in required_list(sub) {
            if !required.contains(&field) {
                required.push(field);
            }
        }
    }

    Ok(json!({
        "type": "object",
        "additionalProperties": false,
        "definitions": Value::clone(&entry.definitions),
        "properties": properties,
        "required": required,
    }))
}

fn required_list(definition: &Value) -> Vec<String> {
    definition
        .get("required")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn properties_mut(schema: &mut Value) -> Option<&mut Map<String, Value>> {
    schema.get_mut("properties").and_then(Value::as_object_mut)
}

fn remove_property(schema: &mut Value, field: &str) {
    if let Some(props) = properties_mut(schema) {
        props.remove(field);
    }
    if let Some(required) = schema.get_mut("required").and_then(Value::as_array_mut) {
        required.retain(|r| r.as_str() != Some(field));
    }
}

fn push_required(schema: &mut Value, field: &str) {
    let Some(obj) = schema.as_object_mut() else {
        return;
    };
    let required = obj
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(list) = required.as_array_mut() {
        if !list.iter().any(|r| r.as_str() == Some(field)) {
            list.push(Value::String(field.to_string()));
        }
    }
}

fn pin_primary_id(schema: &mut Value, primary_id: &str, id: &str) {
    if let Some(props) = properties_mut(schema) {
        props.insert(
            primary_id.to_string(),
            json!({
                "type": "string",
                "pattern": format!("^{}$", regex::escape(id)),
            }),
        );
    }
    push_required(schema, primary_id);
}

/// Draft 4 forbids an empty `required` array.
fn drop_empty_required(schema: &mut Value) {
    let empty = schema
        .get("required")
        .and_then(Value::as_array)
        .is_some_and(Vec::is_empty);
    if empty {
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("required");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn repo_root() -> PathBuf {
        let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        dir.pop(); // crates/
        dir.pop(); // repo root
        dir
    }

    fn registry() -> RegisterRegistry {
        RegisterRegistry::load(repo_root().join("config/registers.yaml")).unwrap()
    }

    fn store() -> SchemaStore {
        SchemaStore::load(repo_root().join("schemas"), &registry()).unwrap()
    }

    fn required(schema: &Value) -> Vec<&str> {
        schema["required"]
            .as_array()
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn loads_repository_schemas() {
        let store = store();
        assert_eq!(store.register_count(), registry().len());
        assert_eq!(store.file_count(), 5);
    }

    #[test]
    fn create_strips_primary_id_and_server_fields() {
        let schema = store()
            .build_schema("local-land-charge", Operation::Create, None, None)
            .unwrap();
        let props = schema["properties"].as_object().unwrap();
        assert!(!props.contains_key("local-land-charge"));
        assert!(!props.contains_key("registration-date"));
        assert!(props.contains_key("charge-type"));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert!(schema["definitions"]["geometry"].is_object());
    }

    #[test]
    fn update_pins_primary_id() {
        let schema = store()
            .build_schema("local-land-charge", Operation::Update, Some("12"), None)
            .unwrap();
        assert_eq!(
            schema["properties"]["local-land-charge"],
            json!({"type": "string", "pattern": "^12$"})
        );
        assert!(required(&schema).contains(&"local-land-charge"));
        assert!(schema["properties"]["registration-date"].is_object());
    }

    #[test]
    fn update_escapes_id_metacharacters() {
        let schema = store()
            .build_schema("statutory-provision", Operation::Update, Some("a.b"), None)
            .unwrap();
        assert_eq!(schema["properties"]["statutory-provision"]["pattern"], json!(r"^a\.b$"));
    }

    #[test]
    fn update_without_id_is_rejected() {
        let err = store()
            .build_schema("local-land-charge", Operation::Update, None, None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingPrimaryId(_)));
    }

    #[test]
    fn subtype_merges_properties_and_required() {
        let schema = store()
            .build_schema("local-land-charge", Operation::Create, None, Some(SubtypeTag::S8))
            .unwrap();
        let req = required(&schema);
        assert!(req.contains(&"land-description"));
        assert!(req.contains(&"works-particulars"));
        assert!(req.contains(&"charge-type"));
        assert!(schema["properties"]["land-description"].is_object());
        assert!(schema["properties"].get("compensation-paid").is_none());
    }

    #[test]
    fn search_uses_search_definition() {
        let schema = store()
            .build_schema("local-land-charge", Operation::Search, None, Some(SubtypeTag::S8))
            .unwrap();
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["geometry"]);
        assert_eq!(required(&schema), vec!["geometry"]);
    }

    #[test]
    fn search_on_register_without_definition() {
        let err = store()
            .build_schema("statutory-provision", Operation::Search, None, None)
            .unwrap_err();
        assert!(matches!(err, SchemaError::NoSearchDefinition(_)));
    }

    #[test]
    fn unknown_register_and_subtype() {
        let store = store();
        assert!(matches!(
            store.build_schema("nope", Operation::Create, None, None),
            Err(SchemaError::UnknownRegister(_))
        ));
        assert!(matches!(
            store.build_schema("statutory-provision", Operation::Create, None, Some(SubtypeTag::S8)),
            Err(SchemaError::UnknownSubtype { .. })
        ));
    }

    #[test]
    fn repeated_builds_do_not_accumulate() {
        let store = store();
        let first = store
            .build_schema("local-land-charge", Operation::Update, Some("1"), None)
            .unwrap();
        let second = store
            .build_schema("local-land-charge", Operation::Update, Some("1"), None)
            .unwrap();
        assert_eq!(first, second);
        let count = required(&second)
            .iter()
            .filter(|r| **r == "local-land-charge")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn caller_mutation_does_not_leak() {
        let store = store();
        let mut first = store
            .build_schema("local-land-charge", Operation::Create, None, None)
            .unwrap();
        first["properties"]["injected"] = json!({"type": "string"});
        first["required"].as_array_mut().unwrap().push(json!("injected"));

        let second = store
            .build_schema("local-land-charge", Operation::Create, None, None)
            .unwrap();
        assert!(second["properties"].get("injected").is_none());
        assert!(!required(&second).contains(&"injected"));
    }

    #[test]
    fn conditional_requirement_triggers_on_non_blank() {
        let store = store();
        let mut schema = store
            .build_schema("local-land-charge", Operation::Create, None, None)
            .unwrap();
        store
            .apply_conditional_required(
                "local-land-charge",
                &mut schema,
                &json!({"inspection-reference": "REF1"}),
            )
            .unwrap();
        assert!(required(&schema).contains(&"place-of-inspection"));
        assert_eq!(schema["properties"]["place-of-inspection"]["pattern"], json!(r"\S+"));

        let mut untouched = store
            .build_schema("local-land-charge", Operation::Create, None, None)
            .unwrap();
        store
            .apply_conditional_required(
                "local-land-charge",
                &mut untouched,
                &json!({"inspection-reference": "  "}),
            )
            .unwrap();
        assert!(!required(&untouched).contains(&"place-of-inspection"));
    }

    #[test]
    fn subtype_conformance() {
        let store = store();
        let s8 = json!({"land-description": "a", "works-particulars": "b"});
        assert!(store.conforms_to_subtype("local-land-charge", SubtypeTag::S8, &s8).unwrap());
        assert!(!store.conforms_to_subtype("local-land-charge", SubtypeTag::S52, &s8).unwrap());
        assert!(!store
            .conforms_to_subtype("local-land-charge", SubtypeTag::S8, &json!({"land-description": "a"}))
            .unwrap());
    }

    #[test]
    fn duplicate_subtype_property_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("x.schema.json"),
            r#"{"definitions": {
                "x": {"type": "object", "properties": {"a": {"type": "string"}}},
                "x-s8": {"type": "object", "properties": {"a": {"type": "string"}}}
            }}"#,
        )
        .unwrap();
        let registry = RegisterRegistry::from_yaml_str(
            r#"
registers:
  - { name: x, primary-id: x, schema: x.schema.json, record: x, subtypes: { s8: x-s8 } }
"#,
        )
        .unwrap();
        let err = SchemaStore::load(dir.path(), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProperty { ref property, .. } if property == "a"));
    }

    #[test]
    fn missing_definition_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.schema.json"), r#"{"definitions": {}}"#).unwrap();
        let registry = RegisterRegistry::from_yaml_str(
            "registers:\n  - { name: x, primary-id: x, schema: x.schema.json, record: x }\n",
        )
        .unwrap();
        let err = SchemaStore::load(dir.path(), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::MissingDefinition { .. }));
    }

    #[test]
    fn missing_file_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = SchemaStore::load(dir.path(), &registry()).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    proptest! {
        #[test]
        fn build_is_stable_for_any_id(id in "[A-Za-z0-9.\\-_]{1,16}") {
            let store = store();
            let a = store.build_schema("local-land-charge", Operation::Update, Some(&id), None).unwrap();
            let b = store.build_schema("local-land-charge", Operation::Update, Some(&id), None).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
