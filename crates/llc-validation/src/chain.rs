//! The per-register validator chain.
//!
//! Every configured validator runs, in configuration order, and their
//! messages are concatenated. Clients see all problems in one response. Only
//! a [`Fault`] stops the chain early.

use llc_core::{RecordSource, RegisterDefinition, ValidatorKind};
use serde_json::Value;

use crate::curie::CurieResolver;
use crate::error::Fault;
use crate::validators::{self, RequestContext};

#[derive(Debug, Clone, Copy)]
pub struct ValidatorChain<'a> {
    validators: &'a [ValidatorKind],
}

impl<'a> ValidatorChain<'a> {
    pub fn for_register(def: &'a RegisterDefinition) -> Self {
        Self {
            validators: &def.validators,
        }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator against `payload`, which validators may amend.
    pub async fn run_all<S: RecordSource>(
        &self,
        ctx: &RequestContext<'_>,
        payload: &mut Value,
        resolver: &mut CurieResolver<'_, S>,
    ) -> Result<Vec<String>, Fault> {
        let mut errors = Vec::new();
        for kind in self.validators {
            let found = validators::run(*kind, ctx, payload, resolver).await?;
            if !found.is_empty() {
                tracing::debug!(
                    register = %ctx.register.name,
                    validator = kind.name(),
                    count = found.len(),
                    "validator reported errors"
                );
            }
            errors.extend(found);
        }
        Ok(errors)
    }
}
