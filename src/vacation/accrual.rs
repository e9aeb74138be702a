//! Vacation-day entitlement and accrual.
//!
//! Entitlement is keyed by whole years of tenure. Employees in their first
//! year accrue a 12-day allotment month by month instead of receiving an
//! annual grant. Employees with at least one year of tenure additionally
//! accrue a monthly fraction of their entitlement into carry-over, and once
//! per calendar year unused days roll into carry-over.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::employee::VacationBalance;
use crate::vacation::calendar::{days_since, tenure_years};

/// Average length of a month in days, used for first-year accrual.
pub fn average_days_per_month() -> Decimal {
    Decimal::new(3044, 2)
}

/// Days accrued per month during the first year (12 days / 12 months).
pub fn first_year_days_per_month() -> Decimal {
    Decimal::new(12, 0) / Decimal::new(12, 0)
}

/// Annual entitlement in whole days for a tenure in complete years.
///
/// A tenure of 0 has no annual grant; see [`proportional_accrual`].
pub fn entitlement_for_tenure(tenure_years: u32) -> u32 {
    match tenure_years {
        0 => 0,
        1 => 12,
        2 => 14,
        3 => 16,
        4 => 18,
        5 => 20,
        6..=10 => 22,
        11..=15 => 24,
        16..=20 => 26,
        21..=25 => 28,
        26..=30 => 30,
        _ => 32,
    }
}

/// What an employee is entitled to on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    /// No hire date on record; nothing can be computed.
    Ineligible,
    /// First-year employee accruing monthly.
    Proportional(Decimal),
    /// Annual grant from the tenure table.
    Annual(u32),
}

impl Entitlement {
    pub fn days(&self) -> Decimal {
        match self {
            Entitlement::Ineligible => Decimal::ZERO,
            Entitlement::Proportional(days) => *days,
            Entitlement::Annual(days) => Decimal::from(*days),
        }
    }
}

/// Entitlement for an employee hired on `hire_date`, evaluated at `today`.
pub fn entitlement(hire_date: Option<NaiveDate>, today: NaiveDate) -> Entitlement {
    let Some(hire_date) = hire_date else {
        return Entitlement::Ineligible;
    };
    match tenure_years(hire_date, today) {
        0 => Entitlement::Proportional(proportional_accrual(Some(hire_date), today)),
        tenure => Entitlement::Annual(entitlement_for_tenure(tenure)),
    }
}

/// Days accrued so far by a first-year employee, rounded to 2 places.
///
/// Returns 0 once the employee has a full year of tenure, or when no hire
/// date is recorded.
pub fn proportional_accrual(hire_date: Option<NaiveDate>, today: NaiveDate) -> Decimal {
    let Some(hire_date) = hire_date else {
        return Decimal::ZERO;
    };
    if tenure_years(hire_date, today) >= 1 {
        return Decimal::ZERO;
    }
    let months = Decimal::from(days_since(hire_date, today)) / average_days_per_month();
    (months * first_year_days_per_month())
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Days added to carry-over per monthly accrual run, rounded to 4 places.
///
/// First-year employees do not accrue through this path.
pub fn monthly_accrual_rate(hire_date: Option<NaiveDate>, today: NaiveDate) -> Decimal {
    let Some(hire_date) = hire_date else {
        return Decimal::ZERO;
    };
    match tenure_years(hire_date, today) {
        0 => Decimal::ZERO,
        tenure => (Decimal::from(entitlement_for_tenure(tenure)) / Decimal::new(12, 0))
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
    }
}

/// Recomputes the stored entitlement. Returns `true` if it changed.
pub fn recalculate(balance: &mut VacationBalance, hire_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    let days = entitlement(hire_date, today).days();
    if balance.entitlement_days == days {
        return false;
    }
    balance.entitlement_days = days;
    true
}

/// Rolls the previous cycle into carry-over, once per calendar year.
///
/// Unused days (entitlement - used, floored at 0) replace any previous
/// carry-over, used days reset to 0 and the entitlement is recomputed from
/// the current tenure. Returns `false` without touching the balance when a
/// reset already happened this calendar year.
///
/// An employee still in the first year keeps accruing from the hire date
/// across the boundary, so nothing is rolled over: only the entitlement is
/// refreshed, and used days keep counting against the first-year allotment.
pub fn apply_year_boundary(
    balance: &mut VacationBalance,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    if balance
        .last_reset_on
        .is_some_and(|reset| reset.year() == today.year())
    {
        return false;
    }

    if let Entitlement::Proportional(days) = entitlement(hire_date, today) {
        balance.entitlement_days = days;
        balance.last_reset_on = Some(today);
        return true;
    }

    let unused = balance.entitlement_days - Decimal::from(balance.used_days);
    balance.carry_over_days = unused.max(Decimal::ZERO);
    balance.used_days = 0;
    balance.entitlement_days = entitlement(hire_date, today).days();
    balance.last_reset_on = Some(today);
    true
}

/// Adds one month of accrual to carry-over, at most once per calendar month.
///
/// Returns `false` when the employee does not accrue (no hire date, first
/// year) or has already accrued this month.
pub fn apply_monthly_accrual(
    balance: &mut VacationBalance,
    hire_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    let rate = monthly_accrual_rate(hire_date, today);
    if rate.is_zero() {
        return false;
    }
    if balance
        .last_accrual_on
        .is_some_and(|last| (last.year(), last.month()) == (today.year(), today.month()))
    {
        return false;
    }

    balance.carry_over_days += rate;
    balance.last_accrual_on = Some(today);
    true
}
