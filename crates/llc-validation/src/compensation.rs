//! # Compensation-Charge Classification
//!
//! A local land charge that cites Land Compensation Act 1973 section 8(4)
//! or section 52(8) must take the matching specialised shape, and a charge
//! in a specialised shape must cite the matching provision.
//!
//! [`classify`] runs before structural validation. It resolves each cited
//! provision in list order, picks the first compensation act it finds, and
//! reports:
//!
//! - provisions that cannot be resolved or identified;
//! - every further provision that also cites a compensation act;
//! - each subtype whose shape and citation disagree, in both directions;
//! - a charge citing neither a provision nor an instrument.
//!
//! The chosen tag selects the subtype schema for structural validation.

use llc_core::{CompensationConfig, ProvisionIdentity, RecordSource, RegisterDefinition, SubtypeTag};
use llc_schema::SchemaStore;
use serde_json::Value;

use crate::curie::CurieResolver;
use crate::error::{Fault, ResolveError};
use crate::validators::{instrument_or_provisions, provision_curies};

/// Result of classifying one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Subtype selected by the first compensation-act provision.
    pub tag: Option<SubtypeTag>,
    /// Problems found, in provision order then subtype order.
    pub errors: Vec<String>,
}

/// Classify a create or update payload for a register with subtypes.
pub async fn classify<S: RecordSource>(
    def: &RegisterDefinition,
    payload: &Value,
    config: &CompensationConfig,
    schemas: &SchemaStore,
    resolver: &mut CurieResolver<'_, S>,
) -> Result<Classification, Fault> {
    let mut result = Classification::default();

    for curie in provision_curies(payload) {
        let record = match resolver.resolve(curie).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                result.errors.push(format!(
                    "Failed to retrieve statutory provision '{curie}' for compensation charge validation"
                ));
                continue;
            }
            Err(ResolveError::Curie(e)) => {
                result.errors.push(e.to_string());
                continue;
            }
            Err(ResolveError::Source(e)) => return Err(e.into()),
        };

        let Some(identity) = ProvisionIdentity::from_record(&record) else {
            result.errors.push(format!(
                "Invalid statutory provision '{curie}' for compensation charge validation"
            ));
            continue;
        };

        let Some(tag) = config.classify(&identity) else {
            continue;
        };
        if result.tag.is_none() {
            result.tag = Some(tag);
        } else {
            result.errors.push(format!(
                "Only one compensation act provision is allowed; '{curie}' also references {}",
                config.act(tag).label()
            ));
        }
    }

    for (tag, definition) in &def.subtypes {
        let cited = result.tag == Some(*tag);
        let conforms = schemas.conforms_to_subtype(&def.name, *tag, payload)?;
        let act = config.act(*tag).label();
        if cited && !conforms {
            result.errors.push(format!(
                "Charges with {act} provision must conform to {definition} definition"
            ));
        }
        if conforms && !cited {
            result.errors.push(format!(
                "Charges which conform to {definition} definition must contain {act} provision"
            ));
        }
    }

    if let Some(message) = instrument_or_provisions(payload) {
        result.errors.push(message);
    }

    tracing::debug!(register = %def.name, tag = ?result.tag, errors = result.errors.len(), "classified charge");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curie::CurieCache;
    use crate::testing::{registry, schemas, MemorySource};
    use serde_json::json;

    const S8_TEXT: &str = "Land Compensation Act 1973 section 8(4)";

    fn s8_record() -> Value {
        json!({
            "statutory-instrument": "Land Compensation Act",
            "year": "1973",
            "provision": "section 8(4)"
        })
    }

    fn s52_record() -> Value {
        json!({
            "statutory-instrument": "Land Compensation Act",
            "year": 1973,
            "provision": "section 52(8)"
        })
    }

    fn source() -> MemorySource {
        MemorySource::default()
            .with("statutory-provision", "1", s8_record())
            .with("statutory-provision", "2", s52_record())
            .with("statutory-provision", "3", json!({"statutory-instrument": "Planning Act", "year": "1990", "provision": "section 106"}))
            .with("statutory-provision", "4", json!({"description": "no identity"}))
            .with("statutory-provision", "5", json!({"text": S8_TEXT}))
    }

    async fn run(payload: Value) -> Classification {
        let registry = registry();
        let schemas = schemas();
        let cache = CurieCache::default();
        let source = source();
        let mut resolver = CurieResolver::new(&source, &registry, &cache);
        let def = registry.get("local-land-charge").unwrap();
        classify(def, &payload, &CompensationConfig::default(), &schemas, &mut resolver)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ordinary_provision_has_no_tag() {
        let result = run(json!({"statutory-provisions": ["statutory-provision:3"]})).await;
        assert_eq!(result, Classification::default());
    }

    #[tokio::test]
    async fn s8_provision_selects_s8_and_demands_shape() {
        let result = run(json!({"statutory-provisions": ["statutory-provision:1"]})).await;
        assert_eq!(result.tag, Some(SubtypeTag::S8));
        assert_eq!(
            result.errors,
            vec![format!(
                "Charges with {S8_TEXT} provision must conform to land-compensation-charge-s8 definition"
            )]
        );
    }

    #[tokio::test]
    async fn s8_provision_with_s8_shape_is_clean() {
        let result = run(json!({
            "statutory-provisions": ["statutory-provision:1"],
            "land-description": "field",
            "works-particulars": "road"
        }))
        .await;
        assert_eq!(result.tag, Some(SubtypeTag::S8));
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[tokio::test]
    async fn legacy_text_provision_still_classifies() {
        let result = run(json!({
            "statutory-provisions": ["statutory-provision:5"],
            "land-description": "field",
            "works-particulars": "road"
        }))
        .await;
        assert_eq!(result.tag, Some(SubtypeTag::S8));
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn s52_shape_without_provision() {
        let result = run(json!({
            "instrument": "Deed",
            "charge-description": "a",
            "capacity-description": "b",
            "compensation-paid": "c"
        }))
        .await;
        assert_eq!(result.tag, None);
        assert_eq!(
            result.errors,
            vec!["Charges which conform to land-compensation-charge-s52 definition must contain \
                  Land Compensation Act 1973 section 52(8) provision"]
        );
    }

    #[tokio::test]
    async fn one_error_per_extra_compensation_provision() {
        let result = run(json!({
            "statutory-provisions": [
                "statutory-provision:1",
                "statutory-provision:3",
                "statutory-provision:2",
                "statutory-provision:5"
            ],
            "land-description": "field",
            "works-particulars": "road"
        }))
        .await;
        assert_eq!(result.tag, Some(SubtypeTag::S8));
        assert_eq!(
            result.errors,
            vec![
                "Only one compensation act provision is allowed; 'statutory-provision:2' also \
                 references Land Compensation Act 1973 section 52(8)"
                    .to_string(),
                format!(
                    "Only one compensation act provision is allowed; 'statutory-provision:5' also \
                     references {S8_TEXT}"
                ),
            ]
        );
    }

    #[tokio::test]
    async fn unresolvable_provisions_are_reported_and_skipped() {
        let result = run(json!({
            "statutory-provisions": [
                "statutory-provision:404",
                "statutory-provision:4",
                "nowhere:1",
                "statutory-provision:3"
            ]
        }))
        .await;
        assert_eq!(
            result.errors,
            vec![
                "Failed to retrieve statutory provision 'statutory-provision:404' for compensation charge validation",
                "Invalid statutory provision 'statutory-provision:4' for compensation charge validation",
                "Invalid register name 'nowhere'",
            ]
        );
    }

    #[tokio::test]
    async fn neither_provisions_nor_instrument() {
        let result = run(json!({"statutory-provisions": []})).await;
        assert_eq!(
            result.errors,
            vec!["At least one of 'statutory-provisions' or 'instrument' must be supplied."]
        );
    }

    #[tokio::test]
    async fn store_failure_is_fatal() {
        let registry = registry();
        let schemas = schemas();
        let cache = CurieCache::default();
        let source = MemorySource::failing(500);
        let mut resolver = CurieResolver::new(&source, &registry, &cache);
        let def = registry.get("local-land-charge").unwrap();
        let payload = json!({"statutory-provisions": ["statutory-provision:1"]});
        let err = classify(def, &payload, &CompensationConfig::default(), &schemas, &mut resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Fault::Source(_)));
    }
}
