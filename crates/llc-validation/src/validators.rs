//! # Semantic Validators
//!
//! Business rules that JSON Schema cannot express. Each register lists the
//! validators it runs in `config/registers.yaml`; [`run`] dispatches one
//! [`ValidatorKind`] to its implementation.
//!
//! Validators return client-facing messages. A validator that needs the
//! stored version of the record reports a failed lookup as a message. Only
//! a register store failure aborts the pass, as a [`Fault`].

use std::collections::HashSet;

use chrono::NaiveDate;
use llc_core::{Operation, ProvisionIdentity, RecordSource, RegisterDefinition, ValidatorKind};
use serde_json::Value;

use crate::curie::CurieResolver;
use crate::error::{Fault, ResolveError};

/// Field holding the date a charge entered the register.
pub const REGISTRATION_DATE: &str = "registration-date";

/// Fields that must be `YYYY-MM-DD` dates.
pub const DATE_FIELDS: [&str; 2] = ["creation-date", "expiration-date"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The request a validator is checking.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub register: &'a RegisterDefinition,
    pub operation: Operation,
    /// Primary id from the URL, present on update.
    pub id: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn create(register: &'a RegisterDefinition) -> Self {
        Self {
            register,
            operation: Operation::Create,
            id: None,
        }
    }

    pub fn update(register: &'a RegisterDefinition, id: &'a str) -> Self {
        Self {
            register,
            operation: Operation::Update,
            id: Some(id),
        }
    }

    pub fn search(register: &'a RegisterDefinition) -> Self {
        Self {
            register,
            operation: Operation::Search,
            id: None,
        }
    }

    /// The URL id when this is an update.
    fn update_id(&self) -> Option<&'a str> {
        match self.operation {
            Operation::Update => self.id,
            _ => None,
        }
    }

    fn record_ref(&self, id: &str) -> String {
        format!("{}:{}", self.register.name, id)
    }
}

/// Run one validator.
pub async fn run<S: RecordSource>(
    kind: ValidatorKind,
    ctx: &RequestContext<'_>,
    payload: &mut Value,
    resolver: &mut CurieResolver<'_, S>,
) -> Result<Vec<String>, Fault> {
    match kind {
        ValidatorKind::PrimaryId => Ok(primary_id(ctx, payload)),
        ValidatorKind::ArchiveGuard => archive_guard(ctx, resolver).await,
        ValidatorKind::StatutoryProvisions => statutory_provisions(ctx, payload, resolver).await,
        ValidatorKind::RegistrationDate => registration_date(ctx, payload, resolver).await,
        ValidatorKind::FurtherInformation => Ok(further_information(payload)),
        ValidatorKind::DateFormats => Ok(date_formats(payload)),
        ValidatorKind::InstrumentOrProvisions => Ok(match ctx.operation {
            Operation::Search => Vec::new(),
            _ => instrument_or_provisions(payload).into_iter().collect(),
        }),
    }
}

fn primary_id(ctx: &RequestContext<'_>, payload: &Value) -> Vec<String> {
    let Some(id) = ctx.update_id() else {
        return Vec::new();
    };
    let pk = &ctx.register.primary_id;
    match payload.get(pk).and_then(Value::as_str) {
        Some(value) if value == id => Vec::new(),
        _ => vec![format!("Primary identifier in URI must match key '{pk}' in json")],
    }
}

async fn archive_guard<S: RecordSource>(
    ctx: &RequestContext<'_>,
    resolver: &mut CurieResolver<'_, S>,
) -> Result<Vec<String>, Fault> {
    let Some(id) = ctx.update_id() else {
        return Ok(Vec::new());
    };
    let errors = match resolver.fetch(ctx.register, id).await? {
        None => vec![format!(
            "Could not retrieve record '{}' for update validation",
            ctx.record_ref(id)
        )],
        Some(existing) if is_archived(&existing) => {
            vec!["Record has been archived, cannot update".to_string()]
        }
        Some(_) => Vec::new(),
    };
    Ok(errors)
}

async fn statutory_provisions<S: RecordSource>(
    ctx: &RequestContext<'_>,
    payload: &Value,
    resolver: &mut CurieResolver<'_, S>,
) -> Result<Vec<String>, Fault> {
    let mut errors = Vec::new();
    // Provisions cited by the stored record; fetched on first need.
    let mut prior: Option<Option<Vec<String>>> = None;

    for curie in provision_curies(payload) {
        let record = match resolver.resolve(curie).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                errors.push(format!(
                    "Failed to retrieve statutory provision '{curie}' for statutory provision validation"
                ));
                continue;
            }
            Err(ResolveError::Curie(e)) => {
                errors.push(e.to_string());
                continue;
            }
            Err(ResolveError::Source(e)) => return Err(e.into()),
        };

        if ProvisionIdentity::from_record(&record).is_none() {
            errors.push(format!(
                "Invalid statutory provision '{curie}' for statutory provision validation"
            ));
            continue;
        }
        if !is_archived(&record) {
            continue;
        }

        let Some(id) = ctx.update_id() else {
            errors.push(format!(
                "New charges cannot use archived statutory provision '{curie}'"
            ));
            continue;
        };
        if prior.is_none() {
            let existing = resolver.fetch(ctx.register, id).await?;
            if existing.is_none() {
                errors.push(format!(
                    "Could not retrieve record '{}' for statutory provision validation",
                    ctx.record_ref(id)
                ));
            }
            prior = Some(existing.map(|record| {
                provision_curies(&record).map(str::to_string).collect()
            }));
        }
        if let Some(Some(previous)) = &prior {
            if !previous.iter().any(|p| p == curie) {
                errors.push(format!("Cannot add archived statutory provision '{curie}'"));
            }
        }
    }
    Ok(errors)
}

async fn registration_date<S: RecordSource>(
    ctx: &RequestContext<'_>,
    payload: &mut Value,
    resolver: &mut CurieResolver<'_, S>,
) -> Result<Vec<String>, Fault> {
    let Some(id) = ctx.update_id() else {
        return Ok(Vec::new());
    };
    let Some(existing) = resolver.fetch(ctx.register, id).await? else {
        return Ok(vec![format!(
            "Could not retrieve record '{}' for registration date validation",
            ctx.record_ref(id)
        )]);
    };
    let stored = existing.get(REGISTRATION_DATE).filter(|v| !v.is_null());

    let supplied = payload.get(REGISTRATION_DATE).cloned();
    match (supplied, stored) {
        // Records migrated without a date stay without one.
        (None, None) => Ok(Vec::new()),
        (None, Some(stored)) => {
            if let Some(obj) = payload.as_object_mut() {
                obj.insert(REGISTRATION_DATE.to_string(), stored.clone());
            }
            Ok(Vec::new())
        }
        (Some(value), Some(stored)) if &value == stored => Ok(Vec::new()),
        (Some(_), _) => Ok(vec![format!(
            "Cannot update field '{REGISTRATION_DATE}'"
        )]),
    }
}

fn further_information(payload: &Value) -> Vec<String> {
    let Some(entries) = payload.get("further-information").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let duplicate = entries
        .iter()
        .filter_map(|entry| entry.get("information-location"))
        .any(|location| !seen.insert(location.to_string()));
    if duplicate {
        vec!["Further information locations must be unique".to_string()]
    } else {
        Vec::new()
    }
}

fn date_formats(payload: &Value) -> Vec<String> {
    DATE_FIELDS
        .iter()
        .filter_map(|field| {
            let value = payload.get(*field)?.as_str()?;
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .is_err()
                .then(|| (*field, value))
        })
        .enumerate()
        .map(|(i, (field, value))| {
            format!(
                "Date format error {}: '{field}' value '{value}' must be a date in the format YYYY-MM-DD",
                i + 1
            )
        })
        .collect()
}

/// The "cite a provision or an instrument" rule, shared with the classifier.
pub(crate) fn instrument_or_provisions(payload: &Value) -> Option<String> {
    let has_instrument = payload.get("instrument").is_some_and(|v| !v.is_null());
    let has_provisions = payload
        .get("statutory-provisions")
        .and_then(Value::as_array)
        .is_some_and(|list| !list.is_empty());
    if has_instrument || has_provisions {
        None
    } else {
        Some("At least one of 'statutory-provisions' or 'instrument' must be supplied.".to_string())
    }
}

/// String entries of `statutory-provisions`, in order.
pub(crate) fn provision_curies(payload: &Value) -> impl Iterator<Item = &str> {
    payload
        .get("statutory-provisions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// A record is archived once it has a non-empty `end-date`.
fn is_archived(record: &Value) -> bool {
    match record.get("end-date") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::Bool(true)) => true,
    }
}
