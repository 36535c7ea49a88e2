use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    errors::ValidationIssue,
    tenancy::{ScopeLevel, TenancyContext},
};

/// Names, organizations, and environments: word characters, dots, and dashes.
static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.\-]+$").expect("name regex is valid"));

/// Returns `true` if `value` is a legal resource or scope name.
pub fn is_valid_name(value: &str) -> bool {
    NAME_REGEX.is_match(value)
}

/// Checks one identity field, returning an issue when it is empty or malformed.
pub fn name_issue(field: &str, value: &str) -> Option<ValidationIssue> {
    if value.is_empty() {
        Some(ValidationIssue::new(field, "validation.required", format!("{field} must not be empty")))
    } else if !is_valid_name(value) {
        Some(ValidationIssue::new(
            field,
            "validation.regex",
            format!("{field} may only contain letters, digits, '_', '.', and '-'"),
        ))
    } else {
        None
    }
}

/// Validates the name and whichever scope fields a resource at `level` carries.
pub fn identity_issues(name: &str, tenancy: &TenancyContext, level: ScopeLevel) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    issues.extend(name_issue("name", name));
    if matches!(level, ScopeLevel::Organization | ScopeLevel::Environment) {
        issues.extend(name_issue("organization", &tenancy.organization));
    }
    if level == ScopeLevel::Environment {
        issues.extend(name_issue("environment", &tenancy.environment));
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(is_valid_name("disk-check"));
        assert!(is_valid_name("check_1.v2"));
        assert!(!is_valid_name("disk check"));
        assert!(!is_valid_name("a/b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn identity_checks_only_fields_in_scope() {
        let ctx = TenancyContext::organization("acme");
        assert!(identity_issues("prod", &ctx, ScopeLevel::Organization).is_empty());

        let issues = identity_issues("disk", &ctx, ScopeLevel::Environment);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "environment");
        assert_eq!(issues[0].code, "validation.required");
    }
}
