//! Schedule-provider collaborator and its `PagerDuty` REST implementation.

pub mod client;
pub mod summary;

use chrono::{DateTime, Utc};

use crate::models::oncall::{EscalationPolicy, OnCallIdentity};
use crate::oncall::reference::ScheduleReference;
use crate::BoxFuture;

pub use summary::PagingSummary;

/// Read access to on-call schedules and paging history.
///
/// Implementations bound their own request latency and surface failures
/// as `AppError::PagerDuty`.
pub trait ScheduleProvider: Send + Sync {
    /// People on call for `schedule_id` right now.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PagerDuty` if the schedule cannot be queried.
    fn on_call_for_schedule<'a>(
        &'a self,
        schedule_id: &'a str,
    ) -> BoxFuture<'a, Vec<OnCallIdentity>>;

    /// Escalation policy with its rules in order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PagerDuty` if the policy cannot be fetched.
    fn escalation_policy<'a>(&'a self, policy_id: &'a str) -> BoxFuture<'a, EscalationPolicy>;

    /// Escalation policy id attached to a service, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PagerDuty` if the service cannot be fetched.
    fn service_escalation_policy<'a>(
        &'a self,
        service_id: &'a str,
    ) -> BoxFuture<'a, Option<String>>;

    /// Aggregate pages routed through `reference` within `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PagerDuty` if incidents cannot be listed.
    fn paging_summary<'a>(
        &'a self,
        reference: &'a ScheduleReference,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, PagingSummary>;
}
