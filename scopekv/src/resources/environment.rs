use serde::{Deserialize, Serialize};

use crate::{
    errors::{ValidationError, ValidationResult},
    keys::ENVIRONMENTS_KIND,
    resources::Resource,
    tenancy::{ScopeLevel, TenancyContext},
    validators::identity_issues,
};

/// An environment within an organization.
///
/// The environment's own key is the marker whose presence allows
/// environment-scoped resources to be written beneath it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub organization: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Environment {
    pub fn new(organization: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Resource for Environment {
    const KIND: &'static str = ENVIRONMENTS_KIND;
    const SCOPE: ScopeLevel = ScopeLevel::Organization;

    fn name(&self) -> &str {
        &self.name
    }

    fn tenancy(&self) -> TenancyContext {
        TenancyContext::organization(self.organization.clone())
    }

    fn validate(&self) -> ValidationResult<()> {
        let issues = identity_issues(&self.name, &self.tenancy(), Self::SCOPE);
        if issues.is_empty() { Ok(()) } else { Err(ValidationError::new(issues)) }
    }
}
