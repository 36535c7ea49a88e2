use serde::{Deserialize, Serialize};

use crate::{
    errors::{ValidationError, ValidationResult},
    keys::ORGANIZATIONS_KIND,
    resources::Resource,
    tenancy::{ScopeLevel, TenancyContext},
    validators::identity_issues,
};

/// Top of the tenancy hierarchy. Its key gates every environment beneath it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// Implemented by hand: the derive reserves marker kinds.
impl Resource for Organization {
    const KIND: &'static str = ORGANIZATIONS_KIND;
    const SCOPE: ScopeLevel = ScopeLevel::Global;

    fn name(&self) -> &str {
        &self.name
    }

    fn tenancy(&self) -> TenancyContext {
        TenancyContext::default()
    }

    fn validate(&self) -> ValidationResult<()> {
        let issues = identity_issues(&self.name, &self.tenancy(), Self::SCOPE);
        if issues.is_empty() { Ok(()) } else { Err(ValidationError::new(issues)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_matches_marker_layout() {
        assert_eq!(Organization::KIND, ORGANIZATIONS_KIND);
        assert_eq!(Organization::SCOPE, ScopeLevel::Global);
    }

    #[test]
    fn rejects_empty_names() {
        let err = Organization::new("").validate().unwrap_err();
        assert!(err.has_field("name"));
        assert!(Organization::new("acme").validate().is_ok());
    }
}
