//! # llc-validation: Semantic Validation for LLC Registers
//!
//! Everything between "the payload parsed as JSON" and "forward it to the
//! register store":
//!
//! - [`curie`]: resolve `register:id` references through a
//!   [`llc_core::RecordSource`], with per-pass memoization and a bounded
//!   process-wide cache for reference data.
//! - [`compensation`]: pick the S8/S52 compensation subtype from cited
//!   provisions and check shape and citation agree.
//! - [`validators`] and [`chain`]: the configured business rules, all run,
//!   errors concatenated.
//! - [`pipeline`]: the whole pass in order.
//!
//! Nothing here performs HTTP itself; the register client is injected as a
//! `RecordSource`.

pub mod chain;
pub mod compensation;
pub mod curie;
pub mod error;
pub mod pipeline;
pub mod validators;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::ValidatorChain;
pub use compensation::{classify, Classification};
pub use curie::{CurieCache, CurieResolver};
pub use error::{Fault, ResolveError};
pub use pipeline::{Outcome, Pipeline};
pub use validators::RequestContext;
