//! Classification of schedule-provider URLs.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{AppError, Result};

#[allow(clippy::expect_used)] // Pattern is a compile-time literal.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<kind>schedules|escalation_policies|service-directory)[/#](?P<id>[A-Za-z0-9]+)")
        .expect("reference pattern compiles")
});

/// What a schedule reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// An on-call schedule.
    Schedule,
    /// An escalation policy; resolved through its first rule.
    EscalationPolicy,
    /// A service; resolved through its escalation policy.
    Service,
}

impl ReferenceKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "schedules" => Some(Self::Schedule),
            "escalation_policies" => Some(Self::EscalationPolicy),
            "service-directory" => Some(Self::Service),
            _ => None,
        }
    }
}

/// A classified schedule-provider locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleReference {
    /// Target kind.
    pub kind: ReferenceKind,
    /// Provider object id.
    pub id: String,
}

impl ScheduleReference {
    /// Classify a URL such as `https://acme.pagerduty.com/schedules#P1ABC`.
    ///
    /// Percent-encoded separators are decoded first, so links that embed
    /// the provider URL in a query string classify too.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let decoded = url
            .replace("%2F", "/")
            .replace("%2f", "/")
            .replace("%23", "#");
        let caps = REFERENCE.captures(&decoded)?;
        Some(Self {
            kind: ReferenceKind::from_segment(caps.name("kind")?.as_str())?,
            id: caps.name("id")?.as_str().to_owned(),
        })
    }

    /// Like [`parse`](Self::parse), but reports unrecognized URLs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidInput` when `url` names no schedule,
    /// escalation policy, or service.
    pub fn require(url: &str) -> Result<Self> {
        Self::parse(url).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "`{url}` is not a pagerduty schedule, escalation policy, or service url"
            ))
        })
    }
}

impl fmt::Display for ScheduleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let segment = match self.kind {
            ReferenceKind::Schedule => "schedules",
            ReferenceKind::EscalationPolicy => "escalation_policies",
            ReferenceKind::Service => "service-directory",
        };
        write!(f, "{segment}/{}", self.id)
    }
}
