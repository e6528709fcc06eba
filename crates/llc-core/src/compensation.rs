//! # Compensation-Act Configuration
//!
//! Two statutory provisions, Land Compensation Act 1973 section 8(4) and
//! section 52(8), force a local land charge into a specialised record shape.
//! Which provisions those are is configuration, read from the environment:
//!
//! - `LAND_COMP_ACT_S8_INSTRUMENT` / `_YEAR` / `_PROVISION`
//! - `LAND_COMP_ACT_S52_INSTRUMENT` / `_YEAR` / `_PROVISION`
//!
//! A provision record is recognised by its structured
//! `(statutory-instrument, year, provision)` fields. Older records carry only
//! a free-text `text` field; those are matched against the act label as a
//! fallback.

use serde_json::Value;

use crate::subtype::SubtypeTag;

/// One statutory provision, identified by instrument, year and section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReference {
    pub instrument: String,
    pub year: String,
    pub provision: String,
}

impl ProvisionReference {
    pub fn new(
        instrument: impl Into<String>,
        year: impl Into<String>,
        provision: impl Into<String>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            year: year.into(),
            provision: provision.into(),
        }
    }

    /// Human-readable label, e.g. `Land Compensation Act 1973 section 8(4)`.
    pub fn label(&self) -> String {
        format!("{} {} {}", self.instrument, self.year, self.provision)
    }

    /// Whether a provision record identifies this provision.
    pub fn matches(&self, identity: &ProvisionIdentity) -> bool {
        match identity {
            ProvisionIdentity::Structured {
                instrument,
                year,
                provision,
            } => {
                same(instrument, &self.instrument)
                    && same(year, &self.year)
                    && same(provision, &self.provision)
            }
            ProvisionIdentity::Text(text) => same(text, &self.label()),
        }
    }
}

/// The identifying fields of a statutory-provision record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionIdentity {
    Structured {
        instrument: String,
        year: String,
        provision: String,
    },
    /// Legacy free-text description.
    Text(String),
}

impl ProvisionIdentity {
    /// Extract identifying fields, or `None` when the record has neither the
    /// structured triple nor a text description.
    pub fn from_record(record: &Value) -> Option<Self> {
        let structured = (
            record.get("statutory-instrument").and_then(Value::as_str),
            record.get("year").and_then(scalar_string),
            record.get("provision").and_then(Value::as_str),
        );
        if let (Some(instrument), Some(year), Some(provision)) = structured {
            return Some(Self::Structured {
                instrument: instrument.to_string(),
                year,
                provision: provision.to_string(),
            });
        }
        record
            .get("text")
            .and_then(Value::as_str)
            .map(|t| Self::Text(t.to_string()))
    }
}

/// The configured S8 and S52 provisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationConfig {
    pub s8: ProvisionReference,
    pub s52: ProvisionReference,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            s8: ProvisionReference::new("Land Compensation Act", "1973", "section 8(4)"),
            s52: ProvisionReference::new("Land Compensation Act", "1973", "section 52(8)"),
        }
    }
}

impl CompensationConfig {
    /// Load from environment variables, falling back to the statutory defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            s8: reference_from_env("LAND_COMP_ACT_S8", defaults.s8),
            s52: reference_from_env("LAND_COMP_ACT_S52", defaults.s52),
        }
    }

    pub fn act(&self, tag: SubtypeTag) -> &ProvisionReference {
        match tag {
            SubtypeTag::S8 => &self.s8,
            SubtypeTag::S52 => &self.s52,
        }
    }

    /// The subtype a provision record selects, if any.
    pub fn classify(&self, identity: &ProvisionIdentity) -> Option<SubtypeTag> {
        SubtypeTag::ALL
            .into_iter()
            .find(|tag| self.act(*tag).matches(identity))
    }
}

fn reference_from_env(prefix: &str, default: ProvisionReference) -> ProvisionReference {
    let var = |suffix: &str, fallback: String| {
        std::env::var(format!("{prefix}_{suffix}")).unwrap_or(fallback)
    };
    ProvisionReference {
        instrument: var("INSTRUMENT", default.instrument),
        year: var("YEAR", default.year),
        provision: var("PROVISION", default.provision),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn same(a: &str, b: &str) -> bool {
    let normalise = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    normalise(a) == normalise(b)
}
