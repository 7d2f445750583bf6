//! Status conditions as reported by knative style resources
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The condition type that signals completion of a build
pub const SUCCEEDED: &str = "Succeeded";

/// The condition type that signals a service is ready to serve traffic
pub const READY: &str = "Ready";

/// Tri-state value of a [`Condition`]
///
/// Anything the platform sends that is not `"True"` or `"False"` is treated as
/// [`ConditionStatus::Unknown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// The platform has not decided yet
    #[default]
    Unknown,
}

impl ConditionStatus {
    /// The wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ConditionStatus {
    fn from(s: &str) -> Self {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl Serialize for ConditionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ConditionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ConditionStatus::from(s.as_str()))
    }
}

/// A typed status flag on a platform resource
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// What this condition describes, e.g. `Succeeded` or `Ready`
    #[serde(rename = "type")]
    pub type_: String,

    /// Whether the condition holds
    #[serde(default)]
    pub status: ConditionStatus,

    /// Machine readable reason for the last transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human readable details, may be empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    /// Create a condition with the given type and status and no message
    pub fn new(type_: &str, status: ConditionStatus) -> Self {
        Self {
            type_: type_.into(),
            status,
            ..Self::default()
        }
    }

    /// Attach a message
    #[must_use]
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a reason
    #[must_use]
    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether this is the terminal build failure signal: `Succeeded` set to `False`
    pub fn is_failure(&self) -> bool {
        self.type_ == SUCCEEDED && self.status == ConditionStatus::False
    }
}

/// Find the first condition of the given type
pub fn find<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_unknown_strings_as_unknown() {
        let c: Condition = serde_json::from_value(json!({
            "type": "Ready",
            "status": "Maybe",
        }))
        .unwrap();
        assert_eq!(c.status, ConditionStatus::Unknown);
        assert!(c.message.is_empty());
    }

    #[test]
    fn only_succeeded_false_is_a_failure() {
        assert!(Condition::new(SUCCEEDED, ConditionStatus::False).is_failure());
        assert!(!Condition::new(SUCCEEDED, ConditionStatus::True).is_failure());
        assert!(!Condition::new(SUCCEEDED, ConditionStatus::Unknown).is_failure());
        assert!(!Condition::new(READY, ConditionStatus::False).is_failure());
    }

    #[test]
    fn serializes_in_wire_format() {
        let c = Condition::new(READY, ConditionStatus::True).message("all good");
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            json!({"type": "Ready", "status": "True", "message": "all good"})
        );
    }
}
