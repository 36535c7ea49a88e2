//! Tenancy scoping: the (organization, environment) pair resources live under.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How deep in the tenancy hierarchy a resource kind is namespaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeLevel {
    /// Not tenant scoped (organizations themselves).
    Global,
    /// Scoped by organization only (environments).
    Organization,
    /// Scoped by organization and environment (checks and most resources).
    Environment,
}

impl ScopeLevel {
    /// The level whose marker must exist before a resource at this level is written.
    pub fn parent(self) -> Option<ScopeLevel> {
        match self {
            ScopeLevel::Global => None,
            ScopeLevel::Organization => Some(ScopeLevel::Global),
            ScopeLevel::Environment => Some(ScopeLevel::Organization),
        }
    }
}

/// Explicit tenancy value threaded through every scoped store call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenancyContext {
    pub organization: String,
    pub environment: String,
}

impl TenancyContext {
    pub fn new(organization: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            environment: environment.into(),
        }
    }

    /// Context carrying only an organization, for organization-scoped kinds.
    pub fn organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            environment: String::new(),
        }
    }

    /// Scope segments used in key paths for a kind namespaced at `level`.
    pub fn segments(&self, level: ScopeLevel) -> Vec<&str> {
        match level {
            ScopeLevel::Global => Vec::new(),
            ScopeLevel::Organization => vec![self.organization.as_str()],
            ScopeLevel::Environment => vec![self.organization.as_str(), self.environment.as_str()],
        }
    }
}

impl fmt::Display for TenancyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.organization.is_empty(), self.environment.is_empty()) {
            (true, _) => write!(f, "global scope"),
            (false, true) => write!(f, "organization {}", self.organization),
            (false, false) => write!(f, "environment {}/{}", self.organization, self.environment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_follow_scope_level() {
        let ctx = TenancyContext::new("acme", "prod");
        assert!(ctx.segments(ScopeLevel::Global).is_empty());
        assert_eq!(ctx.segments(ScopeLevel::Organization), vec!["acme"]);
        assert_eq!(ctx.segments(ScopeLevel::Environment), vec!["acme", "prod"]);
    }

    #[test]
    fn parent_levels_walk_up_the_hierarchy() {
        assert_eq!(ScopeLevel::Environment.parent(), Some(ScopeLevel::Organization));
        assert_eq!(ScopeLevel::Organization.parent(), Some(ScopeLevel::Global));
        assert_eq!(ScopeLevel::Global.parent(), None);
    }

    #[test]
    fn display_describes_scope() {
        assert_eq!(TenancyContext::organization("acme").to_string(), "organization acme");
        assert_eq!(TenancyContext::default().to_string(), "global scope");
    }
}
