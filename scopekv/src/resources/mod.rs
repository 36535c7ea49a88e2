//! Resource kinds persisted by the store.
//!
//! A [`Resource`] is the descriptor the generic store is parameterized over:
//! it names the kind's key segment, the depth of its tenancy scope, and how to
//! read the identity fields out of a value. Everything else in the payload is
//! opaque to the store. Implement it with `#[derive(ConfigResource)]`.

mod check;
mod environment;
mod organization;

pub use check::CheckConfig;
pub use environment::Environment;
pub use organization::Organization;

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    errors::ValidationResult,
    tenancy::{ScopeLevel, TenancyContext},
};

pub trait Resource: Serialize + DeserializeOwned {
    /// Key segment identifying this kind (`checks`, `environments`, ...).
    const KIND: &'static str;

    /// How deep in the tenancy hierarchy this kind is namespaced.
    const SCOPE: ScopeLevel;

    /// Unique name within the resource's tenancy context.
    fn name(&self) -> &str;

    /// Scope the resource belongs to, as recorded in its own fields.
    fn tenancy(&self) -> TenancyContext;

    /// Self-validation run before any write reaches the backend.
    fn validate(&self) -> ValidationResult<()>;
}
