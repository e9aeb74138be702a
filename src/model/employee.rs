use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Day counters kept on every employee record.
///
/// `used_days` and `carry_over_days` never go negative. The available
/// balance is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct VacationBalance {
    /// Annual entitlement, or days accrued so far during the first year
    #[schema(example = "20", value_type = String)]
    pub entitlement_days: Decimal,
    #[schema(example = 4)]
    pub used_days: u32,
    /// Unused days rolled over from the previous cycle plus monthly accrual
    #[schema(example = "3.3334", value_type = String)]
    pub carry_over_days: Decimal,
    #[schema(example = "2026-01-02", format = "date", value_type = Option<String>)]
    pub last_reset_on: Option<NaiveDate>,
    #[schema(example = "2026-03-01", format = "date", value_type = Option<String>)]
    pub last_accrual_on: Option<NaiveDate>,
}

impl VacationBalance {
    /// entitlement + carry-over - used
    pub fn available_days(&self) -> Decimal {
        self.entitlement_days + self.carry_over_days - Decimal::from(self.used_days)
    }

    /// Whether `days` can be drawn from the current balance.
    pub fn covers(&self, days: u32) -> bool {
        Decimal::from(days) <= self.available_days()
    }
}

impl Default for VacationBalance {
    fn default() -> Self {
        Self {
            entitlement_days: Decimal::ZERO,
            used_days: 0,
            carry_over_days: Decimal::ZERO,
            last_reset_on: None,
            last_accrual_on: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_number": "EMP0001",
        "first_name": "Maria",
        "last_name": "Lopez",
        "email": "maria.lopez@company.com",
        "job_title": "Accountant",
        "hire_date": "2019-03-01",
        "department_id": 2,
        "supervisor_id": 7,
        "entitlement_days": "20",
        "used_days": 4,
        "carry_over_days": "3.3334",
        "last_reset_on": "2026-01-02",
        "last_accrual_on": "2026-03-01",
        "is_active": true
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP0001")]
    pub employee_number: String,

    #[schema(example = "Maria")]
    pub first_name: String,

    #[schema(example = "Lopez")]
    pub last_name: String,

    #[schema(example = "maria.lopez@company.com")]
    pub email: String,

    #[schema(example = "Accountant")]
    pub job_title: String,

    #[schema(
        example = "2019-03-01",
        value_type = Option<String>,
        format = "date"
    )]
    pub hire_date: Option<NaiveDate>,

    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,

    #[schema(example = 7, nullable = true)]
    pub supervisor_id: Option<u64>,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub balance: VacationBalance,

    pub is_active: bool,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Columns selected wherever a full [`Employee`] row is loaded.
pub const EMPLOYEE_COLUMNS: &str = "id, employee_number, first_name, last_name, email, job_title, \
     hire_date, department_id, supervisor_id, entitlement_days, used_days, carry_over_days, \
     last_reset_on, last_accrual_on, is_active";
