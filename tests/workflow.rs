//! End-to-end scenarios over the pure workflow and accrual rules: file a
//! request, walk it through both approval stages, roll the year over.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use hr_vacations::model::employee::VacationBalance;
use hr_vacations::model::vacation_request::{RequestStatus, VacationCategory, VacationRequest};
use hr_vacations::vacation::accrual::{apply_year_boundary, entitlement};
use hr_vacations::vacation::workflow::{
    Decision, NewVacationRequest, TransitionError, ValidatedRequest, ValidationError,
};

const EMPLOYEE: u64 = 10;
const SUPERVISOR: u64 = 7;
const HR: u64 = 3;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

fn balance(entitlement_days: u32, used_days: u32) -> VacationBalance {
    VacationBalance {
        entitlement_days: Decimal::from(entitlement_days),
        used_days,
        ..VacationBalance::default()
    }
}

/// What the store would hand back after inserting `validated`.
fn stored(validated: ValidatedRequest) -> VacationRequest {
    VacationRequest {
        id: 1,
        employee_id: validated.employee_id,
        start_date: validated.start_date,
        end_date: validated.end_date,
        requested_days: validated.requested_days,
        category: validated.category,
        reason: validated.reason,
        status: validated.status,
        supervisor_id: None,
        supervisor_comment: None,
        supervisor_decided_at: None,
        hr_id: None,
        hr_comment: None,
        hr_decided_at: None,
        cancelled_at: None,
        created_at: at(1),
    }
}

fn file(start: NaiveDate, end: NaiveDate, balance: &VacationBalance) -> Result<ValidatedRequest, ValidationError> {
    NewVacationRequest {
        start_date: start,
        end_date: end,
        category: VacationCategory::Normal,
        reason: "  family trip ".to_string(),
    }
    .validate(EMPLOYEE, Some(date(2018, 2, 1)), balance, date(2024, 3, 1))
}

#[test]
fn full_approval_debits_used_days_once() {
    let mut balance = balance(20, 2);
    let validated = file(date(2024, 3, 4), date(2024, 3, 10), &balance).unwrap();
    assert_eq!(validated.requested_days, 6);
    assert_eq!(validated.reason, "family trip");

    let mut request = stored(validated);
    assert_eq!(request.status, RequestStatus::PendingSupervisor);

    let status = request
        .decide_as_supervisor(SUPERVISOR, Decision::Approve, Some("ok".to_string()), at(2))
        .unwrap();
    assert_eq!(status, RequestStatus::PendingHr);
    assert_eq!(balance.used_days, 2, "supervisor approval never touches the balance");

    let status = request
        .decide_as_hr(HR, Decision::Approve, None, at(3), &mut balance)
        .unwrap();
    assert_eq!(status, RequestStatus::ApprovedByHr);
    assert_eq!(balance.used_days, 8);
    assert_eq!(request.hr_id, Some(HR));
    assert_eq!(request.hr_decided_at, Some(at(3)));

    // A repeated HR approval is refused and changes nothing.
    let before = request.clone();
    let err = request
        .decide_as_hr(HR, Decision::Approve, None, at(4), &mut balance)
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::UnexpectedState {
            current: RequestStatus::ApprovedByHr,
            expected: RequestStatus::PendingHr,
        }
    );
    assert_eq!(balance.used_days, 8);
    assert_eq!(request, before);
}

#[test]
fn hr_cannot_act_before_supervisor() {
    let mut balance = balance(20, 0);
    let mut request = stored(file(date(2024, 3, 4), date(2024, 3, 8), &balance).unwrap());
    let before = request.clone();

    let err = request
        .decide_as_hr(HR, Decision::Approve, None, at(2), &mut balance)
        .unwrap_err();

    assert_eq!(err.current(), RequestStatus::PendingSupervisor);
    assert_eq!(request, before);
    assert_eq!(balance, self::balance(20, 0));
}

#[test]
fn supervisor_rejection_is_final() {
    let mut balance = balance(20, 0);
    let mut request = stored(file(date(2024, 3, 4), date(2024, 3, 8), &balance).unwrap());

    request
        .decide_as_supervisor(SUPERVISOR, Decision::Reject, Some("  ".to_string()), at(2))
        .unwrap();
    assert_eq!(request.status, RequestStatus::RejectedBySupervisor);
    assert_eq!(request.supervisor_comment, None);

    assert!(request
        .decide_as_supervisor(SUPERVISOR, Decision::Approve, None, at(3))
        .is_err());
    assert!(request
        .decide_as_hr(HR, Decision::Approve, None, at(3), &mut balance)
        .is_err());
    assert_eq!(request.cancel(at(3)), Err(TransitionError::AlreadyFinal(RequestStatus::RejectedBySupervisor)));
}

#[test]
fn hr_rejection_leaves_balance() {
    let mut balance = balance(20, 5);
    let mut request = stored(file(date(2024, 3, 4), date(2024, 3, 8), &balance).unwrap());
    request
        .decide_as_supervisor(SUPERVISOR, Decision::Approve, None, at(2))
        .unwrap();

    let status = request
        .decide_as_hr(HR, Decision::Reject, Some("peak season".to_string()), at(3), &mut balance)
        .unwrap();

    assert_eq!(status, RequestStatus::RejectedByHr);
    assert_eq!(balance.used_days, 5);
    assert_eq!(request.hr_comment.as_deref(), Some("peak season"));
}

#[test]
fn owner_can_cancel_while_pending_hr() {
    let balance = balance(20, 0);
    let mut request = stored(file(date(2024, 3, 4), date(2024, 3, 8), &balance).unwrap());
    request
        .decide_as_supervisor(SUPERVISOR, Decision::Approve, None, at(2))
        .unwrap();

    assert_eq!(request.cancel(at(3)), Ok(RequestStatus::Cancelled));
    assert_eq!(request.cancelled_at, Some(at(3)));
    assert!(request.cancel(at(4)).is_err());
}

#[test]
fn status_never_moves_backwards() {
    let mut balance = balance(20, 0);
    let mut request = stored(file(date(2024, 3, 4), date(2024, 3, 8), &balance).unwrap());

    let mut last = request.status.stage();
    request
        .decide_as_supervisor(SUPERVISOR, Decision::Approve, None, at(2))
        .unwrap();
    assert!(request.status.stage() > last);
    last = request.status.stage();
    request
        .decide_as_hr(HR, Decision::Approve, None, at(3), &mut balance)
        .unwrap();
    assert!(request.status.stage() > last);
    assert!(request.status.is_terminal());
}

#[test]
fn request_exceeding_balance_is_rejected_at_creation() {
    // 2024-01-01 is a Monday; through Saturday the 13th that is 12 working days.
    let balance = balance(10, 0);
    let err = NewVacationRequest {
        start_date: date(2024, 1, 1),
        end_date: date(2024, 1, 13),
        category: VacationCategory::Normal,
        reason: String::new(),
    }
    .validate(EMPLOYEE, Some(date(2018, 2, 1)), &balance, date(2023, 12, 20))
    .unwrap_err();

    assert_eq!(
        err,
        ValidationError::InsufficientBalance {
            requested: 12,
            available: Decimal::from(10),
        }
    );
}

#[test]
fn past_start_is_rejected() {
    let balance = balance(20, 0);
    let err = file(date(2024, 2, 28), date(2024, 3, 2), &balance).unwrap_err();
    assert_eq!(err, ValidationError::StartInPast { start: date(2024, 2, 28) });
}

#[test]
fn carry_over_is_idempotent_within_a_year() {
    let hire = Some(date(2019, 6, 1));
    let mut balance = balance(20, 20);

    assert!(apply_year_boundary(&mut balance, hire, date(2025, 1, 1)));
    let after_first = balance.clone();
    assert!(!apply_year_boundary(&mut balance, hire, date(2025, 7, 1)));
    assert_eq!(balance, after_first);
}

#[test]
fn fully_used_year_carries_nothing() {
    let hire = Some(date(2019, 6, 1));
    let today = date(2025, 1, 1);
    let mut balance = balance(20, 20);

    apply_year_boundary(&mut balance, hire, today);

    assert_eq!(balance.carry_over_days, Decimal::ZERO);
    assert_eq!(balance.used_days, 0);
    assert_eq!(balance.entitlement_days, entitlement(hire, today).days());
    assert_eq!(balance.last_reset_on, Some(today));
}

#[test]
fn unused_days_replace_previous_carry_over() {
    let hire = Some(date(2019, 6, 1));
    let mut balance = VacationBalance {
        carry_over_days: Decimal::from(7),
        ..balance(20, 15)
    };

    apply_year_boundary(&mut balance, hire, date(2025, 1, 1));

    assert_eq!(balance.carry_over_days, Decimal::from(5));
}

#[test]
fn first_year_days_are_not_counted_twice_at_year_end() {
    let hire = Some(date(2024, 3, 1));
    let boundary = date(2025, 1, 2);
    let mut balance = VacationBalance {
        entitlement_days: entitlement(hire, date(2024, 12, 31)).days(),
        ..balance(0, 0)
    };

    apply_year_boundary(&mut balance, hire, boundary);

    assert_eq!(balance.carry_over_days, Decimal::ZERO);
    assert_eq!(balance.available_days(), entitlement(hire, boundary).days());
    assert!(balance.available_days() < Decimal::from(12));

    // At the first anniversary the annual grant takes over; nothing extra
    // was banked from the first year.
    let anniversary = date(2025, 3, 1);
    balance.entitlement_days = entitlement(hire, anniversary).days();
    assert_eq!(balance.available_days(), Decimal::from(12));
}
