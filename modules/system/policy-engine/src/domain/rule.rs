use serde::{Deserialize, Serialize};

/// One allow rule.
///
/// On the wire the fields are named after what administrators see:
/// `{"role_name": ..., "path": ..., "method": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRule {
    /// Role name, matched exactly.
    #[serde(rename = "role_name")]
    pub subject: String,

    /// Path pattern (`/crm/v1.0/*`, `/crm/v1.0/orders/:id`).
    #[serde(rename = "path")]
    pub object: String,

    /// HTTP method regex (`GET`, `GET|POST`, `*`).
    #[serde(rename = "method")]
    pub action: String,
}

impl PolicyRule {
    pub fn new(
        subject: impl Into<String>,
        object: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            object: object.into(),
            action: action.into(),
        }
    }
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.object, self.action)
    }
}
