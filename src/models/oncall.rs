//! On-call identities and escalation policy shapes.

use serde::{Deserialize, Serialize};

/// A person currently on call, as reported by the schedule provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OnCallIdentity {
    /// Display name in the schedule provider.
    pub name: String,
    /// Email used to find the matching Slack user.
    pub email: String,
    /// IANA time zone, when the provider reports one.
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl OnCallIdentity {
    /// Convenience constructor without a time zone.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            time_zone: None,
        }
    }
}

/// One target of an escalation rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationTarget {
    /// Provider target type, e.g. `schedule_reference` or `user_reference`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target identifier.
    pub id: String,
}

impl EscalationTarget {
    /// Build a `schedule_reference` target.
    #[must_use]
    pub fn schedule(id: impl Into<String>) -> Self {
        Self {
            kind: "schedule_reference".into(),
            id: id.into(),
        }
    }

    /// Whether this target points at a schedule.
    #[must_use]
    pub fn is_schedule(&self) -> bool {
        self.kind == "schedule_reference"
    }
}

/// One tier of an escalation policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationRule {
    /// Who gets paged at this tier.
    #[serde(default)]
    pub targets: Vec<EscalationTarget>,
}

/// An escalation policy with its ordered rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Policy identifier.
    pub id: String,
    /// Rules in escalation order.
    #[serde(default)]
    pub escalation_rules: Vec<EscalationRule>,
}
