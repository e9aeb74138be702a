use sqlx::{MySql, MySqlConnection, MySqlPool};

use crate::model::vacation_request::{RequestStatus, VACATION_REQUEST_COLUMNS, VacationRequest};
use crate::vacation::workflow::ValidatedRequest;

/// Which requests a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    /// Requests of employees supervised by, or in a department headed by, this employee.
    SupervisedBy(u64),
    /// `SupervisedBy` plus the supervisor's own requests.
    Team(u64),
    /// The employee's own requests.
    Own(u64),
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub employee_id: Option<u64>,
    pub status: Option<RequestStatus>,
    pub limit: u64,
    pub offset: u64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Status(RequestStatus),
}

const SUPERVISED_EMPLOYEES: &str = "employee_id IN (\
     SELECT e.id FROM employees e LEFT JOIN departments d ON d.id = e.department_id \
     WHERE e.supervisor_id = ? OR d.head_id = ?)";

fn where_clause(visibility: Visibility, filter: &RequestFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    match visibility {
        Visibility::All => {}
        Visibility::SupervisedBy(approver) => {
            where_sql.push_str(" AND ");
            where_sql.push_str(SUPERVISED_EMPLOYEES);
            args.push(FilterValue::U64(approver));
            args.push(FilterValue::U64(approver));
        }
        Visibility::Team(supervisor) => {
            where_sql.push_str(" AND (employee_id = ? OR ");
            where_sql.push_str(SUPERVISED_EMPLOYEES);
            where_sql.push(')');
            args.push(FilterValue::U64(supervisor));
            args.push(FilterValue::U64(supervisor));
            args.push(FilterValue::U64(supervisor));
        }
        Visibility::Own(employee) => {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee));
        }
    }

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }
    if let Some(status) = filter.status {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Status(status));
    }

    (where_sql, args)
}

pub async fn list(
    pool: &MySqlPool,
    visibility: Visibility,
    filter: &RequestFilter,
) -> Result<(Vec<VacationRequest>, i64), sqlx::Error> {
    let (where_sql, args) = where_clause(visibility, filter);

    let count_sql = format!("SELECT COUNT(*) FROM vacation_requests{where_sql}");
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Status(s) => count_q.bind(*s),
        };
    }
    let total = count_q.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT {VACATION_REQUEST_COLUMNS} FROM vacation_requests{where_sql} \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut data_q = sqlx::query_as::<_, VacationRequest>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Status(s) => data_q.bind(s),
        };
    }
    let rows = data_q
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

pub async fn fetch<'e, E>(executor: E, id: u64) -> Result<Option<VacationRequest>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {VACATION_REQUEST_COLUMNS} FROM vacation_requests WHERE id = ?");
    sqlx::query_as::<_, VacationRequest>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn fetch_for_update(
    conn: &mut MySqlConnection,
    id: u64,
) -> Result<Option<VacationRequest>, sqlx::Error> {
    let sql = format!(
        "SELECT {VACATION_REQUEST_COLUMNS} FROM vacation_requests WHERE id = ? FOR UPDATE"
    );
    sqlx::query_as::<_, VacationRequest>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn insert<'e, E>(executor: E, request: &ValidatedRequest) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO vacation_requests
            (employee_id, start_date, end_date, requested_days, category, reason, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.employee_id)
    .bind(request.start_date)
    .bind(request.end_date)
    .bind(request.requested_days)
    .bind(request.category)
    .bind(&request.reason)
    .bind(request.status)
    .execute(executor)
    .await?;

    Ok(result.last_insert_id())
}

/// Persists a transition applied in memory. The update only lands if the
/// stored status still equals `from`; returns the number of rows changed.
pub async fn save_transition<'e, E>(
    executor: E,
    request: &VacationRequest,
    from: RequestStatus,
) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        UPDATE vacation_requests
        SET status = ?,
            supervisor_id = ?,
            supervisor_comment = ?,
            supervisor_decided_at = ?,
            hr_id = ?,
            hr_comment = ?,
            hr_decided_at = ?,
            cancelled_at = ?
        WHERE id = ?
          AND status = ?
        "#,
    )
    .bind(request.status)
    .bind(request.supervisor_id)
    .bind(&request.supervisor_comment)
    .bind(request.supervisor_decided_at)
    .bind(request.hr_id)
    .bind(&request.hr_comment)
    .bind(request.hr_decided_at)
    .bind(request.cancelled_at)
    .bind(request.id)
    .bind(from)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Request counts per status, limited to what `visibility` allows.
pub async fn count_by_status(
    pool: &MySqlPool,
    visibility: Visibility,
    status: RequestStatus,
    decided_this_month: bool,
) -> Result<i64, sqlx::Error> {
    let filter = RequestFilter {
        status: Some(status),
        ..RequestFilter::default()
    };
    let (mut where_sql, args) = where_clause(visibility, &filter);
    if decided_this_month {
        where_sql.push_str(
            " AND COALESCE(hr_decided_at, supervisor_decided_at, cancelled_at) \
             >= DATE_FORMAT(UTC_TIMESTAMP(), '%Y-%m-01')",
        );
    }

    let sql = format!("SELECT COUNT(*) FROM vacation_requests{where_sql}");
    let mut q = sqlx::query_scalar::<_, i64>(&sql);
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::Status(s) => q.bind(s),
        };
    }
    q.fetch_one(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_for_own_requests() {
        let filter = RequestFilter {
            status: Some(RequestStatus::PendingHr),
            ..RequestFilter::default()
        };
        let (sql, args) = where_clause(Visibility::Own(4), &filter);
        assert_eq!(sql, " WHERE 1=1 AND employee_id = ? AND status = ?");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_where_clause_for_supervisor_binds_twice() {
        let (sql, args) = where_clause(Visibility::SupervisedBy(9), &RequestFilter::default());
        assert!(sql.contains("e.supervisor_id = ? OR d.head_id = ?"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_where_clause_for_team_includes_own_requests() {
        let (sql, args) = where_clause(Visibility::Team(9), &RequestFilter::default());
        assert!(sql.starts_with(" WHERE 1=1 AND (employee_id = ? OR employee_id IN ("));
        assert!(sql.ends_with("))"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_where_clause_all_is_unrestricted() {
        let (sql, args) = where_clause(Visibility::All, &RequestFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }
}
