//! # Register Registry
//!
//! The per-register dispatch table: which schema document a register uses,
//! which field is its primary id, which semantic validators run and in what
//! order, and whether it supports geometry search.
//!
//! Built once at startup from YAML and checked for internal consistency
//! before the server accepts traffic. Immutable afterwards.
//!
//! ```yaml
//! registers:
//!   - name: statutory-provision
//!     primary-id: statutory-provision
//!     schema: statutory-provision.schema.json
//!     record: statutory-provision
//!     cacheable: true
//!     validators: [primary-id, archive-guard]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::RegistryError;
use crate::subtype::SubtypeTag;

/// What a request is doing to a register. Drives schema mutation and which
/// validators apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `POST /records`
    Create,
    /// `PUT /record/{id}`
    Update,
    /// `POST /records/geometry/{function}`
    Search,
}

impl Operation {
    /// Create and update carry a record body; search carries criteria.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

/// A semantic validator a register opts into. Order in the registry file is
/// execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidatorKind {
    PrimaryId,
    ArchiveGuard,
    StatutoryProvisions,
    RegistrationDate,
    FurtherInformation,
    DateFormats,
    InstrumentOrProvisions,
}

impl ValidatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PrimaryId => "primary-id",
            Self::ArchiveGuard => "archive-guard",
            Self::StatutoryProvisions => "statutory-provisions",
            Self::RegistrationDate => "registration-date",
            Self::FurtherInformation => "further-information",
            Self::DateFormats => "date-formats",
            Self::InstrumentOrProvisions => "instrument-or-provisions",
        }
    }
}

/// When `when` holds a non-blank string, `require` becomes a required,
/// non-blank field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionalRequirement {
    pub when: String,
    pub require: String,
}

/// Static configuration for one register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegisterDefinition {
    /// Register name; also the subdomain that selects it.
    pub name: String,
    /// Backend URL segment. Defaults to `name`.
    #[serde(default)]
    path: Option<String>,
    /// Field holding the record's primary identifier.
    pub primary_id: String,
    /// Schema document filename under the schema directory.
    pub schema: String,
    /// Record-level definition inside the schema document.
    pub record: String,
    /// Search-criteria definition used by geometry search.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub geometry_search: bool,
    /// Compensation subtypes and the definition each one selects.
    #[serde(default)]
    pub subtypes: BTreeMap<SubtypeTag, String>,
    /// Fields the store assigns; clients may not send them on create.
    #[serde(default)]
    pub server_assigned: Vec<String>,
    /// Array fields whose empty-string placeholders are dropped before validation.
    #[serde(default)]
    pub reference_lists: Vec<String>,
    #[serde(default)]
    pub conditional_required: Vec<ConditionalRequirement>,
    /// Reference data whose records may be held in the process-wide curie cache.
    #[serde(default)]
    pub cacheable: bool,
    #[serde(default)]
    pub validators: Vec<ValidatorKind>,
}

impl RegisterDefinition {
    /// URL segment used when talking to the register store.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }

    pub fn has_subtypes(&self) -> bool {
        !self.subtypes.is_empty()
    }

    /// Definition name for a subtype, if this register classifies records.
    pub fn subtype_definition(&self, tag: SubtypeTag) -> Option<&str> {
        self.subtypes.get(&tag).map(String::as_str)
    }

    /// Remove `""` entries from this register's reference-list arrays.
    pub fn drop_placeholders(&self, payload: &mut Value) {
        for field in &self.reference_lists {
            if let Some(Value::Array(items)) = payload.get_mut(field) {
                items.retain(|item| item.as_str() != Some(""));
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    registers: Vec<RegisterDefinition>,
}

/// Immutable lookup table from register name to definition.
#[derive(Debug, Clone)]
pub struct RegisterRegistry {
    registers: HashMap<String, RegisterDefinition>,
    order: Vec<String>,
}

impl RegisterRegistry {
    /// Read and check a registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_yaml::from_str(yaml)?;
        Self::from_definitions(file.registers)
    }

    /// Build a registry, rejecting inconsistent configuration.
    pub fn from_definitions(defs: Vec<RegisterDefinition>) -> Result<Self, RegistryError> {
        if defs.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut registers = HashMap::with_capacity(defs.len());
        let mut order = Vec::with_capacity(defs.len());

        for def in defs {
            if def.primary_id.trim().is_empty() {
                return Err(RegistryError::EmptyPrimaryId(def.name));
            }
            if def.geometry_search && def.search.is_none() {
                return Err(RegistryError::MissingSearchDefinition(def.name));
            }
            if def.has_subtypes() && def.validators.contains(&ValidatorKind::InstrumentOrProvisions)
            {
                return Err(RegistryError::RedundantValidator {
                    register: def.name,
                    validator: ValidatorKind::InstrumentOrProvisions.name().to_string(),
                });
            }
            if registers.contains_key(&def.name) {
                return Err(RegistryError::DuplicateRegister(def.name));
            }
            order.push(def.name.clone());
            registers.insert(def.name.clone(), def);
        }

        Ok(Self { registers, order })
    }

    pub fn get(&self, name: &str) -> Option<&RegisterDefinition> {
        self.registers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registers.contains_key(name)
    }

    /// Select a register from a `Host` header value by its first DNS label.
    pub fn for_host(&self, host: &str) -> Option<&RegisterDefinition> {
        let label = host.split('.').next().unwrap_or(host);
        let label = label.split(':').next().unwrap_or(label);
        self.get(label)
    }

    /// Definitions in file order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterDefinition> {
        self.order.iter().filter_map(|name| self.registers.get(name))
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}
