use sqlx::MySqlPool;

use crate::model::department::{Department, DepartmentSummary};

pub async fn insert(
    pool: &MySqlPool,
    name: &str,
    description: Option<&str>,
    head_id: Option<u64>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO departments (name, description, head_id) VALUES (?, ?, ?)")
        .bind(name)
        .bind(description)
        .bind(head_id)
        .execute(pool)
        .await?;
    Ok(result.last_insert_id())
}

pub async fn fetch(pool: &MySqlPool, id: u64) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as::<_, Department>(
        "SELECT id, name, description, head_id, is_active FROM departments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Active departments with their active-employee counts.
pub async fn list_with_counts(pool: &MySqlPool) -> Result<Vec<DepartmentSummary>, sqlx::Error> {
    sqlx::query_as::<_, DepartmentSummary>(
        r#"
        SELECT d.id, d.name, d.description, d.head_id, d.is_active,
               COUNT(e.id) AS employee_count
        FROM departments d
        LEFT JOIN employees e ON e.department_id = d.id AND e.is_active = TRUE
        WHERE d.is_active = TRUE
        GROUP BY d.id, d.name, d.description, d.head_id, d.is_active
        ORDER BY d.name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn update(pool: &MySqlPool, department: &Department) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE departments SET name = ?, description = ?, head_id = ?, is_active = ? WHERE id = ?",
    )
    .bind(&department.name)
    .bind(&department.description)
    .bind(department.head_id)
    .bind(department.is_active)
    .bind(department.id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
