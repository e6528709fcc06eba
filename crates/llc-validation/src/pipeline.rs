//! # Validation Pipeline
//!
//! One validation pass over a request payload:
//!
//! 1. drop empty-string placeholders from reference lists;
//! 2. classify compensation charges (registers with subtypes, writes only);
//! 3. build the operation's schema and validate structurally;
//! 4. if nothing failed so far, run the semantic validator chain (writes
//!    only).
//!
//! Structural errors come first, sorted; classifier errors follow in
//! provision order. The chain only runs against a structurally valid
//! payload, and may amend it (registration-date copy-forward). The amended
//! payload is what gets forwarded.

use llc_core::{CompensationConfig, RecordSource, RegisterRegistry, SubtypeTag};
use llc_schema::{render_all, validate, SchemaStore};
use serde_json::Value;

use crate::chain::ValidatorChain;
use crate::compensation::{classify, Classification};
use crate::curie::{CurieCache, CurieResolver};
use crate::error::Fault;
use crate::validators::RequestContext;

/// Result of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Compensation subtype the payload was validated as.
    pub subtype: Option<SubtypeTag>,
    pub errors: Vec<String>,
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Shared, read-only inputs to every validation pass.
pub struct Pipeline<'a, S> {
    pub registry: &'a RegisterRegistry,
    pub schemas: &'a SchemaStore,
    pub cache: &'a CurieCache,
    pub compensation: &'a CompensationConfig,
    pub source: &'a S,
}

impl<'a, S: RecordSource> Pipeline<'a, S> {
    /// Validate `payload` for the request described by `ctx`.
    pub async fn validate(
        &self,
        ctx: RequestContext<'_>,
        payload: &mut Value,
    ) -> Result<Outcome, Fault> {
        let def = ctx.register;
        let write = ctx.operation.is_write();
        let mut resolver = CurieResolver::new(self.source, self.registry, self.cache);

        if write {
            def.drop_placeholders(payload);
        }

        let Classification { tag, errors: classifier_errors } = if write && def.has_subtypes() {
            classify(def, payload, self.compensation, self.schemas, &mut resolver).await?
        } else {
            Classification::default()
        };

        let mut schema = self.schemas.build_schema(&def.name, ctx.operation, ctx.id, tag)?;
        if write {
            self.schemas
                .apply_conditional_required(&def.name, &mut schema, payload)?;
        }
        let structural = validate(&schema, payload, &def.primary_id)?;

        let mut errors = render_all(&structural);
        errors.extend(classifier_errors);
        if !errors.is_empty() || !write {
            return Ok(Outcome { subtype: tag, errors });
        }

        let errors = ValidatorChain::for_register(def)
            .run_all(&ctx, payload, &mut resolver)
            .await?;
        Ok(Outcome { subtype: tag, errors })
    }
}
