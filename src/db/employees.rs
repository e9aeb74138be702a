use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlConnection, MySqlPool};

use crate::model::employee::{EMPLOYEE_COLUMNS, Employee, VacationBalance};

/// Fields needed to create an employee record.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub employee_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub job_title: String,
    pub hire_date: Option<NaiveDate>,
    pub department_id: Option<u64>,
    pub supervisor_id: Option<u64>,
    pub entitlement_days: Decimal,
}

pub async fn fetch<'e, E>(executor: E, id: u64) -> Result<Option<Employee>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Loads the employee and locks the row until the transaction ends.
pub async fn fetch_for_update(
    conn: &mut MySqlConnection,
    id: u64,
) -> Result<Option<Employee>, sqlx::Error> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ? FOR UPDATE");
    sqlx::query_as::<_, Employee>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub department_id: Option<u64>,
    pub active: Option<bool>,
    /// Matched against names and the employee number
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

enum FilterValue {
    U64(u64),
    Bool(bool),
    Text(String),
}

fn where_clause(filter: &EmployeeFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(department_id) = filter.department_id {
        where_sql.push_str(" AND department_id = ?");
        args.push(FilterValue::U64(department_id));
    }
    if let Some(active) = filter.active {
        where_sql.push_str(" AND is_active = ?");
        args.push(FilterValue::Bool(active));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        where_sql.push_str(" AND (first_name LIKE ? OR last_name LIKE ? OR employee_number LIKE ?)");
        let pattern = format!("%{search}%");
        for _ in 0..3 {
            args.push(FilterValue::Text(pattern.clone()));
        }
    }

    (where_sql, args)
}

/// One page of employees plus the total matching `filter`.
pub async fn list(
    pool: &MySqlPool,
    filter: &EmployeeFilter,
) -> Result<(Vec<Employee>, i64), sqlx::Error> {
    let (where_sql, args) = where_clause(filter);

    let count_sql = format!("SELECT COUNT(*) FROM employees{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Bool(v) => count_q.bind(*v),
            FilterValue::Text(v) => count_q.bind(v.as_str()),
        };
    }
    let total = count_q.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees{where_sql} ORDER BY last_name, first_name, id LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, Employee>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Bool(v) => data_q.bind(v),
            FilterValue::Text(v) => data_q.bind(v),
        };
    }
    let rows = data_q
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Active employees with their department name, optionally only departments
/// whose name contains `department`. Used by the balance report.
pub async fn active_with_department(
    pool: &MySqlPool,
    department: Option<&str>,
) -> Result<Vec<(Employee, Option<String>)>, sqlx::Error> {
    #[derive(sqlx::FromRow)]
    struct Row {
        #[sqlx(flatten)]
        employee: Employee,
        department_name: Option<String>,
    }

    let columns = EMPLOYEE_COLUMNS
        .split(", ")
        .map(|c| format!("e.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {columns}, d.name AS department_name \
         FROM employees e LEFT JOIN departments d ON d.id = e.department_id \
         WHERE e.is_active = TRUE"
    );
    if department.is_some() {
        sql.push_str(" AND d.name LIKE ?");
    }
    sql.push_str(" ORDER BY d.name, e.last_name, e.first_name");

    let mut q = sqlx::query_as::<_, Row>(&sql);
    if let Some(name) = department {
        q = q.bind(format!("%{}%", name.trim()));
    }
    let rows = q.fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| (r.employee, r.department_name)).collect())
}

pub async fn count_active(pool: &MySqlPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE is_active = TRUE")
        .fetch_one(pool)
        .await
}

/// Active employees a supervisor answers for, directly or as department head.
pub async fn count_supervised(pool: &MySqlPool, approver_id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE e.is_active = TRUE
          AND e.id <> ?
          AND (e.supervisor_id = ? OR d.head_id = ?)
        "#,
    )
    .bind(approver_id)
    .bind(approver_id)
    .bind(approver_id)
    .fetch_one(pool)
    .await
}

/// Ids of active employees, optionally narrowed to one employee.
pub async fn active_ids(pool: &MySqlPool, only: Option<u64>) -> Result<Vec<u64>, sqlx::Error> {
    match only {
        Some(id) => {
            sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? AND is_active = TRUE")
                .bind(id)
                .fetch_all(pool)
                .await
        }
        None => {
            sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE is_active = TRUE ORDER BY id")
                .fetch_all(pool)
                .await
        }
    }
}

const SAVE_ENTITLEMENT_SQL: &str = "UPDATE employees SET entitlement_days = ? WHERE id = ?";

/// Writes only the entitlement. Used outside a row lock, so it must not
/// touch the counters that approvals and batch jobs own.
pub async fn save_entitlement<'e, E>(
    executor: E,
    id: u64,
    entitlement_days: Decimal,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let result = sqlx::query(SAVE_ENTITLEMENT_SQL)
        .bind(entitlement_days)
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

/// Writes every balance field. Callers must hold the row lock
/// (`fetch_for_update`) for the read that produced `balance`.
pub async fn save_balance<'e, E>(
    executor: E,
    id: u64,
    balance: &VacationBalance,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE employees
        SET entitlement_days = ?,
            used_days = ?,
            carry_over_days = ?,
            last_reset_on = ?,
            last_accrual_on = ?
        WHERE id = ?
        "#,
    )
    .bind(balance.entitlement_days)
    .bind(balance.used_days)
    .bind(balance.carry_over_days)
    .bind(balance.last_reset_on)
    .bind(balance.last_accrual_on)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Inserts the employee and returns its id. Without an explicit number the
/// employee gets `EMP{id:04}`.
pub async fn insert(conn: &mut MySqlConnection, new: &NewEmployee) -> Result<u64, sqlx::Error> {
    // Placeholder number keeps the unique key satisfied until the id is known.
    let number = match &new.employee_number {
        Some(number) => number.clone(),
        None => format!("TMP{}", &uuid::Uuid::new_v4().to_simple().to_string()[..16]),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO employees
            (employee_number, first_name, last_name, email, job_title, hire_date,
             department_id, supervisor_id, entitlement_days)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&number)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.job_title)
    .bind(new.hire_date)
    .bind(new.department_id)
    .bind(new.supervisor_id)
    .bind(new.entitlement_days)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_id();

    if new.employee_number.is_none() {
        sqlx::query("UPDATE employees SET employee_number = ? WHERE id = ?")
            .bind(default_employee_number(id))
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(id)
}

pub fn default_employee_number(id: u64) -> String {
    format!("EMP{id:04}")
}

/// Soft delete: the record and its request history stay.
pub async fn deactivate(pool: &MySqlPool, id: u64) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE employees SET is_active = FALSE WHERE id = ? AND is_active = TRUE")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    // An inactive employee cannot head a department.
    sqlx::query("UPDATE departments SET head_id = NULL WHERE head_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE employee_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

/// True when `approver_id` is the employee's direct supervisor or heads the
/// employee's department.
pub async fn is_supervised_by<'e, E>(
    executor: E,
    employee_id: u64,
    approver_id: u64,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM employees e
            LEFT JOIN departments d ON d.id = e.department_id
            WHERE e.id = ?
              AND (e.supervisor_id = ? OR d.head_id = ?)
        )
        "#,
    )
    .bind(employee_id)
    .bind(approver_id)
    .bind(approver_id)
    .fetch_one(executor)
    .await
}

pub async fn is_active<'e, E>(executor: E, id: u64) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND is_active = TRUE)",
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_binds_three_patterns() {
        let filter = EmployeeFilter {
            active: Some(true),
            search: Some(" lop ".to_string()),
            ..EmployeeFilter::default()
        };
        let (sql, args) = where_clause(&filter);
        assert!(sql.starts_with(" WHERE 1=1 AND is_active = ? AND (first_name LIKE ?"));
        assert_eq!(args.len(), 4);
        assert!(matches!(&args[1], FilterValue::Text(p) if p == "%lop%"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = EmployeeFilter {
            search: Some("   ".to_string()),
            ..EmployeeFilter::default()
        };
        assert_eq!(where_clause(&filter).0, " WHERE 1=1");
    }

    #[test]
    fn test_entitlement_write_leaves_counters_alone() {
        assert_eq!(SAVE_ENTITLEMENT_SQL.matches('?').count(), 2);
        for column in ["used_days", "carry_over_days", "last_reset_on", "last_accrual_on"] {
            assert!(!SAVE_ENTITLEMENT_SQL.contains(column), "{column}");
        }
    }

    #[test]
    fn test_default_employee_number_is_zero_padded() {
        assert_eq!(default_employee_number(7), "EMP0007");
        assert_eq!(default_employee_number(12345), "EMP12345");
    }
}
