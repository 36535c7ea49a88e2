//! Common key-construction helpers used across scopekv.
//!
//! Keys are `/`-joined paths: `{root}/{kind}/{scope segments...}/{name}`.
//! Scope segments and names are form-urlencoded so a `/` inside them can
//! never be mistaken for a separator.

use url::form_urlencoded;

use crate::tenancy::{ScopeLevel, TenancyContext};

pub const SEPARATOR: char = '/';
pub const DEFAULT_ROOT: &str = "/scopekv";
pub const ORGANIZATIONS_KIND: &str = "organizations";
pub const ENVIRONMENTS_KIND: &str = "environments";

#[derive(Debug, Clone, Copy)]
pub struct KeyBuilder<'a> {
    pub root: &'a str,
    pub kind: &'a str,
    pub level: ScopeLevel,
}

impl<'a> KeyBuilder<'a> {
    pub fn new(root: &'a str, kind: &'a str, level: ScopeLevel) -> Self {
        Self { root, kind, level }
    }

    /// Maps an optional context and optional name to a key.
    ///
    /// - no context, no name: bare kind prefix (`root/kind/`)
    /// - context, no name: scope prefix (`root/kind/org/env/`)
    /// - context and name: exact key (`root/kind/org/env/name`)
    pub fn build(&self, context: Option<&TenancyContext>, name: Option<&str>) -> String {
        let mut key = String::new();
        let root = self.root.trim_end_matches(SEPARATOR);
        if !root.is_empty() {
            key.push_str(root);
            key.push(SEPARATOR);
        }
        key.push_str(self.kind);
        key.push(SEPARATOR);
        if let Some(context) = context {
            for segment in context.segments(self.level) {
                key.push_str(&encode_segment(segment));
                key.push(SEPARATOR);
            }
        }
        if let Some(name) = name {
            key.push_str(&encode_segment(name));
        }
        key
    }

    pub fn exact(&self, context: &TenancyContext, name: &str) -> String {
        self.build(Some(context), Some(name))
    }

    pub fn scope_prefix(&self, context: &TenancyContext) -> String {
        self.build(Some(context), None)
    }

    pub fn kind_prefix(&self) -> String {
        self.build(None, None)
    }

    /// Key whose existence gates writes under `context` at this builder's level.
    pub fn parent_marker(&self, context: &TenancyContext) -> Option<String> {
        parent_marker(self.root, self.level, context)
    }
}

/// Key of the scope that owns resources namespaced at `level` under `context`.
///
/// Environment-scoped resources are gated on the environment's own key,
/// organization-scoped ones on the organization key. Global kinds have no parent.
pub fn parent_marker(root: &str, level: ScopeLevel, context: &TenancyContext) -> Option<String> {
    match level {
        ScopeLevel::Global => None,
        ScopeLevel::Organization => {
            Some(KeyBuilder::new(root, ORGANIZATIONS_KIND, ScopeLevel::Global).build(None, Some(&context.organization)))
        }
        ScopeLevel::Environment => Some(
            KeyBuilder::new(root, ENVIRONMENTS_KIND, ScopeLevel::Organization)
                .exact(context, &context.environment),
        ),
    }
}

fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}
