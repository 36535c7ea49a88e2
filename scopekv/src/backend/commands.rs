use serde::Serialize;

/// Single-comparison transaction: IF `guard_key` exists THEN PUT `key`.
///
/// Serialized as the argument of the guarded put Lua script, so field names
/// are part of the script contract.
#[derive(Debug, Clone, Serialize)]
pub struct GuardedPut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_key: Option<String>,
    pub key: String,
    pub payload_json: String,
    #[serde(skip_serializing_if = "skip_false")]
    pub require_absent: bool,
}

impl GuardedPut {
    pub fn new(guard_key: Option<String>, key: impl Into<String>, payload_json: impl Into<String>) -> Self {
        Self {
            guard_key,
            key: key.into(),
            payload_json: payload_json.into(),
            require_absent: false,
        }
    }

    /// Additionally require the target key to be absent (create semantics).
    pub fn require_absent(mut self) -> Self {
        self.require_absent = true;
        self
    }
}

fn skip_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_unset_fields_from_script_payload() {
        let put = GuardedPut::new(None, "/k", "{}");
        let json = serde_json::to_value(&put).unwrap();
        assert!(json.get("guard_key").is_none());
        assert!(json.get("require_absent").is_none());
        assert_eq!(json["key"], "/k");
    }

    #[test]
    fn create_sets_require_absent() {
        let put = GuardedPut::new(Some("/env".into()), "/k", "{}").require_absent();
        let json = serde_json::to_value(&put).unwrap();
        assert_eq!(json["guard_key"], "/env");
        assert_eq!(json["require_absent"], true);
    }
}
