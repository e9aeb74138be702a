//! Vacation request approval workflow.
//!
//! A request moves `PendingSupervisor -> PendingHr -> ApprovedByHr`, with a
//! rejection exit at each stage and an owner-initiated cancellation from any
//! non-terminal state. Every operation checks the state it expects before
//! touching anything; a refused transition leaves the request (and the
//! employee's balance) exactly as it was.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::employee::VacationBalance;
use crate::model::vacation_request::{RequestStatus, VacationCategory, VacationRequest};
use crate::vacation::calendar::{requested_days, tenure_years};

/// Outcome chosen by an approver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// A transition was attempted from a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("request is {current}, expected {expected}")]
    UnexpectedState {
        current: RequestStatus,
        expected: RequestStatus,
    },

    #[error("request is already {0} and can no longer be cancelled")]
    AlreadyFinal(RequestStatus),
}

impl TransitionError {
    pub fn current(&self) -> RequestStatus {
        match self {
            TransitionError::UnexpectedState { current, .. } => *current,
            TransitionError::AlreadyFinal(current) => *current,
        }
    }
}

/// Reasons a new request is refused before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("start date {start} is in the past")]
    StartInPast { start: NaiveDate },

    #[error("the selected range contains no vacation days")]
    EmptyRange,

    #[error("normal vacations require at least one year of tenure; use extraordinary or emergency")]
    CategoryRequiresTenure,

    #[error("insufficient balance: {requested} days requested, {available} available")]
    InsufficientBalance { requested: u32, available: Decimal },
}

/// Data supplied by the employee when filing a request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewVacationRequest {
    #[schema(example = "2026-11-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-11-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "normal")]
    pub category: VacationCategory,
    #[schema(example = "Family trip")]
    pub reason: String,
}

/// A validated request, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub requested_days: u32,
    pub category: VacationCategory,
    pub reason: String,
    pub status: RequestStatus,
}

impl NewVacationRequest {
    /// Checks only the date ordering, which needs no stored data.
    pub fn check_range(&self) -> Result<(), ValidationError> {
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Validates the request against the employee's record as of `today`.
    ///
    /// The day count is derived here from the range; whatever the caller
    /// believes the count to be is irrelevant.
    pub fn validate(
        self,
        employee_id: u64,
        hire_date: Option<NaiveDate>,
        balance: &VacationBalance,
        today: NaiveDate,
    ) -> Result<ValidatedRequest, ValidationError> {
        self.check_range()?;

        if self.start_date < today {
            return Err(ValidationError::StartInPast {
                start: self.start_date,
            });
        }

        let tenure = hire_date.map_or(0, |hired| tenure_years(hired, today));
        if self.category == VacationCategory::Normal && tenure < 1 {
            return Err(ValidationError::CategoryRequiresTenure);
        }

        let days = requested_days(self.start_date, self.end_date);
        if days == 0 {
            return Err(ValidationError::EmptyRange);
        }
        if !balance.covers(days) {
            return Err(ValidationError::InsufficientBalance {
                requested: days,
                available: balance.available_days().normalize(),
            });
        }

        Ok(ValidatedRequest {
            employee_id,
            start_date: self.start_date,
            end_date: self.end_date,
            requested_days: days,
            category: self.category,
            reason: self.reason.trim().to_string(),
            status: RequestStatus::PendingSupervisor,
        })
    }
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

impl VacationRequest {
    fn expect_status(&self, expected: RequestStatus) -> Result<(), TransitionError> {
        if self.status != expected {
            return Err(TransitionError::UnexpectedState {
                current: self.status,
                expected,
            });
        }
        Ok(())
    }

    /// Supervisor decision on a `PendingSupervisor` request.
    ///
    /// Approval always forwards the request to HR, whatever its category.
    pub fn decide_as_supervisor(
        &mut self,
        supervisor_id: u64,
        decision: Decision,
        comment: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<RequestStatus, TransitionError> {
        self.expect_status(RequestStatus::PendingSupervisor)?;

        self.status = match decision {
            Decision::Approve => RequestStatus::PendingHr,
            Decision::Reject => RequestStatus::RejectedBySupervisor,
        };
        self.supervisor_id = Some(supervisor_id);
        self.supervisor_comment = normalize_comment(comment);
        self.supervisor_decided_at = Some(at);
        Ok(self.status)
    }

    /// HR decision on a `PendingHr` request.
    ///
    /// Approval debits the requested days from `balance`. This is the only
    /// place used days grow, and it can run at most once per request since
    /// the request leaves `PendingHr` in the same step.
    pub fn decide_as_hr(
        &mut self,
        hr_id: u64,
        decision: Decision,
        comment: Option<String>,
        at: DateTime<Utc>,
        balance: &mut VacationBalance,
    ) -> Result<RequestStatus, TransitionError> {
        self.expect_status(RequestStatus::PendingHr)?;

        self.status = match decision {
            Decision::Approve => {
                balance.used_days += self.requested_days;
                RequestStatus::ApprovedByHr
            }
            Decision::Reject => RequestStatus::RejectedByHr,
        };
        self.hr_id = Some(hr_id);
        self.hr_comment = normalize_comment(comment);
        self.hr_decided_at = Some(at);
        Ok(self.status)
    }

    /// Owner cancellation from any non-terminal state.
    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<RequestStatus, TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyFinal(self.status));
        }
        self.status = RequestStatus::Cancelled;
        self.cancelled_at = Some(at);
        Ok(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn request(status: RequestStatus, days: u32) -> VacationRequest {
        VacationRequest {
            id: 1,
            employee_id: 10,
            start_date: date("2024-03-04"),
            end_date: date("2024-03-10"),
            requested_days: days,
            category: VacationCategory::Normal,
            reason: "rest".to_string(),
            status,
            supervisor_id: None,
            supervisor_comment: None,
            supervisor_decided_at: None,
            hr_id: None,
            hr_comment: None,
            hr_decided_at: None,
            cancelled_at: None,
            created_at: now(),
        }
    }

    fn balance(entitlement: u32, used: u32) -> VacationBalance {
        VacationBalance {
            entitlement_days: Decimal::from(entitlement),
            used_days: used,
            ..VacationBalance::default()
        }
    }

    fn new_request(start: &str, end: &str, category: VacationCategory) -> NewVacationRequest {
        NewVacationRequest {
            start_date: date(start),
            end_date: date(end),
            category,
            reason: "  rest  ".to_string(),
        }
    }

    #[test]
    fn test_supervisor_approval_forwards_to_hr() {
        let mut r = request(RequestStatus::PendingSupervisor, 6);
        let status = r
            .decide_as_supervisor(7, Decision::Approve, Some("ok".into()), now())
            .unwrap();
        assert_eq!(status, RequestStatus::PendingHr);
        assert_eq!(r.supervisor_id, Some(7));
        assert_eq!(r.supervisor_comment.as_deref(), Some("ok"));
        assert_eq!(r.supervisor_decided_at, Some(now()));
    }

    #[test]
    fn test_supervisor_approval_forwards_every_category() {
        for category in [VacationCategory::Extraordinary, VacationCategory::Emergency] {
            let mut r = request(RequestStatus::PendingSupervisor, 2);
            r.category = category;
            assert_eq!(
                r.decide_as_supervisor(7, Decision::Approve, None, now()),
                Ok(RequestStatus::PendingHr)
            );
        }
    }

    #[test]
    fn test_supervisor_rejection_is_terminal() {
        let mut r = request(RequestStatus::PendingSupervisor, 6);
        r.decide_as_supervisor(7, Decision::Reject, None, now()).unwrap();
        assert_eq!(r.status, RequestStatus::RejectedBySupervisor);
        assert!(r.status.is_terminal());
    }

    #[test]
    fn test_supervisor_cannot_redecide() {
        let mut r = request(RequestStatus::PendingHr, 6);
        let before = r.clone();
        let err = r
            .decide_as_supervisor(7, Decision::Reject, None, now())
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::UnexpectedState {
                current: RequestStatus::PendingHr,
                expected: RequestStatus::PendingSupervisor,
            }
        );
        assert_eq!(r, before);
    }

    #[test]
    fn test_hr_approval_debits_balance() {
        let mut r = request(RequestStatus::PendingHr, 6);
        let mut b = balance(20, 2);
        let status = r
            .decide_as_hr(3, Decision::Approve, None, now(), &mut b)
            .unwrap();
        assert_eq!(status, RequestStatus::ApprovedByHr);
        assert_eq!(b.used_days, 8);
        assert_eq!(r.hr_id, Some(3));
        assert_eq!(r.hr_decided_at, Some(now()));
    }

    #[test]
    fn test_hr_rejection_keeps_balance() {
        let mut r = request(RequestStatus::PendingHr, 6);
        let mut b = balance(20, 2);
        r.decide_as_hr(3, Decision::Reject, Some("  ".into()), now(), &mut b)
            .unwrap();
        assert_eq!(r.status, RequestStatus::RejectedByHr);
        assert_eq!(r.hr_comment, None);
        assert_eq!(b.used_days, 2);
    }

    #[test]
    fn test_hr_cannot_act_before_supervisor() {
        let mut r = request(RequestStatus::PendingSupervisor, 6);
        let mut b = balance(20, 0);
        let before = r.clone();
        assert!(r.decide_as_hr(3, Decision::Approve, None, now(), &mut b).is_err());
        assert_eq!(r, before);
        assert_eq!(b.used_days, 0);
    }

    #[test]
    fn test_legacy_approved_by_supervisor_is_not_actionable_by_hr() {
        let mut r = request(RequestStatus::ApprovedBySupervisor, 6);
        let mut b = balance(20, 0);
        assert!(r.decide_as_hr(3, Decision::Approve, None, now(), &mut b).is_err());
        assert_eq!(r.cancel(now()), Ok(RequestStatus::Cancelled));
    }

    #[test]
    fn test_cancel_from_pending_states() {
        for status in [RequestStatus::PendingSupervisor, RequestStatus::PendingHr] {
            let mut r = request(status, 6);
            assert_eq!(r.cancel(now()), Ok(RequestStatus::Cancelled));
            assert_eq!(r.cancelled_at, Some(now()));
        }
    }

    #[test]
    fn test_cancel_refused_from_terminal_states() {
        for status in [
            RequestStatus::ApprovedByHr,
            RequestStatus::RejectedByHr,
            RequestStatus::RejectedBySupervisor,
            RequestStatus::Cancelled,
        ] {
            let mut r = request(status, 6);
            assert_eq!(r.cancel(now()), Err(TransitionError::AlreadyFinal(status)));
            assert_eq!(r.cancelled_at, None);
        }
    }

    #[test]
    fn test_validate_derives_day_count() {
        let valid = new_request("2024-03-04", "2024-03-10", VacationCategory::Normal)
            .validate(10, Some(date("2020-01-01")), &balance(20, 0), date("2024-03-01"))
            .unwrap();
        assert_eq!(valid.requested_days, 6);
        assert_eq!(valid.status, RequestStatus::PendingSupervisor);
        assert_eq!(valid.reason, "rest");
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let err = new_request("2024-03-10", "2024-03-04", VacationCategory::Normal)
            .validate(10, Some(date("2020-01-01")), &balance(20, 0), date("2024-03-01"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
    }

    #[test]
    fn test_validate_rejects_past_start() {
        let err = new_request("2024-02-28", "2024-03-04", VacationCategory::Normal)
            .validate(10, Some(date("2020-01-01")), &balance(20, 0), date("2024-03-01"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::StartInPast {
                start: date("2024-02-28")
            }
        );
    }

    #[test]
    fn test_validate_rejects_sunday_only_range() {
        let err = new_request("2024-03-10", "2024-03-10", VacationCategory::Normal)
            .validate(10, Some(date("2020-01-01")), &balance(20, 0), date("2024-03-01"))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyRange);
    }

    #[test]
    fn test_validate_rejects_normal_category_in_first_year() {
        let err = new_request("2024-03-04", "2024-03-05", VacationCategory::Normal)
            .validate(10, Some(date("2023-09-01")), &balance(6, 0), date("2024-03-01"))
            .unwrap_err();
        assert_eq!(err, ValidationError::CategoryRequiresTenure);

        let ok = new_request("2024-03-04", "2024-03-05", VacationCategory::Emergency)
            .validate(10, Some(date("2023-09-01")), &balance(6, 0), date("2024-03-01"));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_validate_rejects_insufficient_balance() {
        let err = new_request("2024-03-04", "2024-03-10", VacationCategory::Normal)
            .validate(10, Some(date("2020-01-01")), &balance(20, 15), date("2024-03-01"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InsufficientBalance {
                requested: 6,
                available: Decimal::from(5),
            }
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::StartInPast {
                start: date("2024-01-01")
            }
            .to_string(),
            "start date 2024-01-01 is in the past"
        );
        assert_eq!(
            TransitionError::UnexpectedState {
                current: RequestStatus::PendingSupervisor,
                expected: RequestStatus::PendingHr,
            }
            .to_string(),
            "request is PENDING_SUPERVISOR, expected PENDING_HR"
        );
    }
}
