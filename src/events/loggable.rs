use serde::{Deserialize, Serialize};

/// Severity levels for activity logs.
/// Controls retention policies and log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Authorization changes: long-term retention, never auto-delete
    Critical,
    /// Session lifecycle and role switches
    #[default]
    Important,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Important => "important",
        }
    }
}

/// Records that can be published to the activity log.
pub trait Loggable: Serialize + Send + Sync {
    /// Prefix of the event name, e.g. "scope_override" in "scope_override.written"
    fn entity_type() -> &'static str;

    /// Identifier of what the event is about (role name, session id, ...)
    fn subject(&self) -> String;

    fn severity(&self) -> Severity {
        Severity::Important
    }

    /// Resets and deletions are always kept.
    fn severity_for_action(&self, action: &str) -> Severity {
        match action {
            "reset" | "deleted" => Severity::Critical,
            _ => self.severity(),
        }
    }
}
