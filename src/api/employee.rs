use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{MessageResponse, page_bounds},
    auth::auth::AuthUser,
    db::{self, employees::EmployeeFilter},
    error::{AppError, AppResult},
    model::employee::Employee,
    utils::db_utils::{Column, ColumnKind, build_update_sql, execute_update},
    vacation::{accrual, calendar},
};

/// Columns HR may change through `PUT /employees/{id}`. Balance counters are
/// owned by the workflow and the batch jobs.
const UPDATABLE_COLUMNS: [Column; 7] = [
    Column::new("first_name", ColumnKind::Text),
    Column::new("last_name", ColumnKind::Text),
    Column::new("email", ColumnKind::Text),
    Column::new("job_title", ColumnKind::Text),
    Column::new("hire_date", ColumnKind::NullableDate),
    Column::new("department_id", ColumnKind::NullableId),
    Column::new("supervisor_id", ColumnKind::NullableId),
];

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Items per page (max 100)
    pub per_page: Option<u32>,
    pub department_id: Option<u64>,
    /// Filter by active flag; both when omitted
    pub active: Option<bool>,
    /// Search by name or employee number
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

/// Documents the accepted fields; the handler reads the raw JSON object so
/// that `null` can clear nullable columns.
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub job_title: Option<String>,
    #[schema(example = "2020-02-01", format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<u64>,
    pub supervisor_id: Option<u64>,
}

/// Balance figures as of today.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2019-03-01", format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = 7)]
    pub tenure_years: u32,
    #[schema(example = "22", value_type = String)]
    pub entitlement_days: Decimal,
    #[schema(example = 4)]
    pub used_days: u32,
    #[schema(example = "3.3334", value_type = String)]
    pub carry_over_days: Decimal,
    #[schema(example = "21.3334", value_type = String)]
    pub available_days: Decimal,
    /// Whether the `normal` category may be requested
    pub normal_category_eligible: bool,
    /// Days accrued so far in the first year; 0 afterwards
    #[schema(example = "0", value_type = String)]
    pub proportional_accrual: Decimal,
    /// Added to carry-over each month after the first year
    #[schema(example = "1.8333", value_type = String)]
    pub monthly_accrual_rate: Decimal,
}

impl BalanceResponse {
    pub fn for_employee(employee: &Employee, today: NaiveDate) -> Self {
        let tenure = employee
            .hire_date
            .map_or(0, |hired| calendar::tenure_years(hired, today));
        Self {
            employee_id: employee.id,
            hire_date: employee.hire_date,
            tenure_years: tenure,
            entitlement_days: employee.balance.entitlement_days,
            used_days: employee.balance.used_days,
            carry_over_days: employee.balance.carry_over_days,
            available_days: employee.balance.available_days(),
            normal_category_eligible: tenure >= 1,
            proportional_accrual: accrual::proportional_accrual(employee.hire_date, today),
            monthly_accrual_rate: accrual::monthly_accrual_rate(employee.hire_date, today),
        }
    }
}

/// Loads the employee and brings its stored entitlement up to date.
///
/// The read takes no lock, so only the entitlement is written back; the
/// counters may already have moved under a concurrent approval.
pub(crate) async fn load_with_fresh_entitlement(
    pool: &MySqlPool,
    employee_id: u64,
    today: NaiveDate,
) -> AppResult<Employee> {
    let mut employee = db::employees::fetch(pool, employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    if accrual::recalculate(&mut employee.balance, employee.hire_date, today) {
        debug!(
            employee_id,
            entitlement = %employee.balance.entitlement_days,
            "Entitlement recomputed"
        );
        db::employees::save_entitlement(pool, employee_id, employee.balance.entitlement_days)
            .await?;
    }

    Ok(employee)
}

fn require_self_or_hr(auth: &AuthUser, employee_id: u64) -> AppResult<()> {
    if auth.is_hr_or_admin() || auth.employee_id == Some(employee_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not allowed to view this employee"))
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "Caller is not HR/Admin", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let (page, per_page, offset) = page_bounds(query.page, query.per_page);
    let filter = EmployeeFilter {
        department_id: query.department_id,
        active: query.active,
        search: query.search.clone(),
        limit: u64::from(per_page),
        offset,
    };
    let (data, total) = db::employees::list(pool.get_ref(), &filter).await?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Not HR/Admin and not the employee", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    require_self_or_hr(&auth, employee_id)?;

    let employee = db::employees::fetch(pool.get_ref(), employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Partial update. A new hire date recomputes the entitlement in the same
/// transaction.
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Unknown field or invalid value", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse),
        (status = 422, description = "Department or supervisor does not exist", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    if body.get("supervisor_id").and_then(Value::as_u64) == Some(employee_id) {
        return Err(AppError::Unprocessable(
            "An employee cannot supervise themselves".to_string(),
        ));
    }

    let update = build_update_sql("employees", &body, &UPDATABLE_COLUMNS, "id", employee_id)?;
    let hire_date_changed = update.touches("hire_date");

    let mut tx = pool.begin().await?;

    if db::employees::fetch_for_update(&mut tx, employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee"));
    }

    execute_update(&mut *tx, update)
        .await
        .map_err(|e| AppError::from_insert(e, "Employee data conflicts with an existing record"))?;

    let mut employee = db::employees::fetch(&mut *tx, employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    if hire_date_changed
        && accrual::recalculate(&mut employee.balance, employee.hire_date, calendar::today())
    {
        db::employees::save_entitlement(&mut *tx, employee_id, employee.balance.entitlement_days)
            .await?;
    }

    tx.commit().await?;

    info!(employee_id, by = auth.user_id, "Employee updated");
    Ok(HttpResponse::Ok().json(employee))
}

/// Soft delete: the employee and its linked accounts are deactivated.
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/deactivate",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    let employee = db::employees::fetch(pool.get_ref(), employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    if !employee.is_active {
        return Ok(HttpResponse::Ok().json(MessageResponse::new("Employee already inactive")));
    }

    db::employees::deactivate(pool.get_ref(), employee_id).await?;

    info!(employee_id, by = auth.user_id, "Employee deactivated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Employee deactivated")))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/balance",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 403, description = "Not HR/Admin and not the employee", body = MessageResponse),
        (status = 404, description = "Employee not found", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    require_self_or_hr(&auth, employee_id)?;

    let today = calendar::today();
    let employee = load_with_fresh_entitlement(pool.get_ref(), employee_id, today).await?;

    Ok(HttpResponse::Ok().json(BalanceResponse::for_employee(&employee, today)))
}

#[utoipa::path(
    get,
    path = "/api/me/balance",
    responses(
        (status = 200, description = "Caller's balance", body = BalanceResponse),
        (status = 403, description = "Account is not linked to an employee", body = MessageResponse)
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn my_balance(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee_link()?;

    let today = calendar::today();
    let employee = load_with_fresh_entitlement(pool.get_ref(), employee_id, today).await?;

    Ok(HttpResponse::Ok().json(BalanceResponse::for_employee(&employee, today)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::VacationBalance;

    fn employee(hire_date: Option<NaiveDate>, balance: VacationBalance) -> Employee {
        Employee {
            id: 3,
            employee_number: "EMP0003".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: String::new(),
            job_title: String::new(),
            hire_date,
            department_id: None,
            supervisor_id: None,
            balance,
            is_active: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_balance_for_first_year_employee() {
        let today = date(2024, 6, 1);
        let e = employee(
            Some(date(2024, 1, 1)),
            VacationBalance {
                entitlement_days: accrual::proportional_accrual(Some(date(2024, 1, 1)), today),
                ..VacationBalance::default()
            },
        );
        let balance = BalanceResponse::for_employee(&e, today);
        assert_eq!(balance.tenure_years, 0);
        assert!(!balance.normal_category_eligible);
        assert_eq!(balance.available_days, balance.proportional_accrual);
        assert!(balance.monthly_accrual_rate.is_zero());
    }

    #[test]
    fn test_balance_for_senior_employee() {
        let today = date(2024, 6, 1);
        let e = employee(
            Some(date(2019, 3, 1)),
            VacationBalance {
                entitlement_days: Decimal::from(22),
                used_days: 5,
                carry_over_days: Decimal::from(2),
                ..VacationBalance::default()
            },
        );
        let balance = BalanceResponse::for_employee(&e, today);
        assert_eq!(balance.tenure_years, 5);
        assert!(balance.normal_category_eligible);
        assert_eq!(balance.available_days, Decimal::from(19));
        assert!(balance.proportional_accrual.is_zero());
    }

    #[test]
    fn test_balance_counters_are_not_updatable() {
        assert!(UPDATABLE_COLUMNS.iter().all(|c| !c.name.contains("days")));
    }
}
