use serde::{Deserialize, Serialize};

use crate::{
    ConfigResource,
    errors::{ValidationError, ValidationIssue, ValidationResult},
};

/// Definition of a monitoring check scheduled against subscribed agents.
#[derive(ConfigResource, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[resource(kind = "checks", scope = "environment", validate = "validate_check")]
pub struct CheckConfig {
    #[resource(name)]
    pub name: String,
    #[resource(organization)]
    pub organization: String,
    #[resource(environment)]
    pub environment: String,
    pub command: String,
    /// Seconds between executions.
    pub interval: u32,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default)]
    pub runtime_assets: Vec<String>,
    #[serde(default = "default_publish")]
    pub publish: bool,
    /// Seconds before the execution is killed; zero disables the timeout.
    #[serde(default)]
    pub timeout: u32,
    #[serde(default)]
    pub stdin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_flap_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_flap_threshold: Option<u32>,
}

fn default_publish() -> bool {
    true
}

impl CheckConfig {
    pub fn new(
        organization: impl Into<String>,
        environment: impl Into<String>,
        name: impl Into<String>,
        command: impl Into<String>,
        interval: u32,
    ) -> Self {
        Self {
            name: name.into(),
            organization: organization.into(),
            environment: environment.into(),
            command: command.into(),
            interval,
            subscriptions: Vec::new(),
            handlers: Vec::new(),
            runtime_assets: Vec::new(),
            publish: true,
            timeout: 0,
            stdin: false,
            high_flap_threshold: None,
            low_flap_threshold: None,
        }
    }

    pub fn with_subscriptions<I, S>(mut self, subscriptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscriptions = subscriptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_handlers<I, S>(mut self, handlers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers = handlers.into_iter().map(Into::into).collect();
        self
    }
}

fn validate_check(check: &CheckConfig) -> ValidationResult<()> {
    let mut issues = Vec::new();

    if check.command.trim().is_empty() {
        issues.push(ValidationIssue::new("command", "validation.required", "command must not be empty"));
    }
    if check.interval == 0 {
        issues.push(ValidationIssue::new(
            "interval",
            "validation.range",
            "interval must be greater than 0",
        ));
    }
    if check.timeout > 0 && check.timeout >= check.interval.saturating_mul(10) {
        issues.push(ValidationIssue::new(
            "timeout",
            "validation.range",
            "timeout must be shorter than ten intervals",
        ));
    }
    for subscription in &check.subscriptions {
        if subscription.trim().is_empty() {
            issues.push(ValidationIssue::new(
                "subscriptions",
                "validation.required",
                "subscriptions must not contain empty entries",
            ));
        }
    }

    match (check.low_flap_threshold, check.high_flap_threshold) {
        (Some(low), Some(high)) if low >= high => issues.push(ValidationIssue::new(
            "low_flap_threshold",
            "validation.range",
            "low flap threshold must be lower than the high flap threshold",
        )),
        (Some(_), None) | (None, Some(_)) => issues.push(ValidationIssue::new(
            "high_flap_threshold",
            "validation.required",
            "flap thresholds must be set together",
        )),
        _ => {}
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::new(issues))
    }
}
