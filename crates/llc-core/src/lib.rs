//! # llc-core: Foundational Types for the LLC Register Gateway
//!
//! Every other crate in the workspace depends on `llc-core`; it depends on
//! nothing internal.
//!
//! ## Contents
//!
//! 1. **Register registry.** [`RegisterRegistry`] is the immutable dispatch
//!    table built once at startup from `config/registers.yaml`. A request's
//!    subdomain is looked up here and nowhere else.
//!
//! 2. **Curie references.** [`Curie`] parses `register:id` strings and checks
//!    the register segment against the registry.
//!
//! 3. **Compensation acts.** [`CompensationConfig`] names the two statutory
//!    provisions (S8 and S52) that force a charge into a specialised record
//!    shape, and knows how to recognise them in a provision record.
//!
//! 4. **Record sources.** [`RecordSource`] is the seam between validation and
//!    the backend register store.
//!
//! 5. **Canonical output.** [`canonical::to_canonical_string`] renders JSON
//!    with sorted keys for deterministic responses.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `llc-*` crates.
//! - No `.unwrap()` outside tests.

pub mod canonical;
pub mod compensation;
pub mod curie;
pub mod error;
pub mod registry;
pub mod source;
pub mod subtype;

pub use compensation::{CompensationConfig, ProvisionIdentity, ProvisionReference};
pub use curie::Curie;
pub use error::{CanonicalizationError, CurieError, RegistryError, SourceError};
pub use registry::{
    ConditionalRequirement, Operation, RegisterDefinition, RegisterRegistry, ValidatorKind,
};
pub use source::RecordSource;
pub use subtype::SubtypeTag;
