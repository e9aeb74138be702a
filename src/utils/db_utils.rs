use chrono::NaiveDate;
use serde_json::Value;
use sqlx::MySql;

use crate::error::AppError;

/// ===============================
/// Updatable column description
/// ===============================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Non-empty string
    Text,
    /// `YYYY-MM-DD` or null
    NullableDate,
    /// Foreign key id or null
    NullableId,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
    NullDate,
    NullId,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
    /// Columns touched by the update, in SET order
    pub columns: Vec<&'static str>,
}

impl SqlUpdate {
    pub fn touches(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

fn convert(column: &Column, value: &Value) -> Result<SqlValue, AppError> {
    let invalid = || AppError::BadRequest(format!("Invalid value for '{}'", column.name));

    match (column.kind, value) {
        (ColumnKind::Text, Value::String(s)) if !s.trim().is_empty() => {
            Ok(SqlValue::String(s.trim().to_string()))
        }
        (ColumnKind::NullableDate, Value::Null) => Ok(SqlValue::NullDate),
        (ColumnKind::NullableDate, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| invalid()),
        (ColumnKind::NullableId, Value::Null) => Ok(SqlValue::NullId),
        (ColumnKind::NullableId, Value::Number(n)) => n.as_u64().map(SqlValue::U64).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `allowed` may appear in `payload`; anything else is
/// rejected rather than silently dropped.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[Column],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::BadRequest("Payload must be a JSON object".to_string()))?;

    if obj.is_empty() {
        return Err(AppError::BadRequest("No fields provided for update".to_string()));
    }

    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for (key, value) in obj {
        let column = allowed
            .iter()
            .find(|c| c.name == key)
            .ok_or_else(|| AppError::BadRequest(format!("Field '{key}' cannot be updated")))?;
        values.push(convert(column, value)?);
        columns.push(column.name);
    }

    // Build SET clause
    let set_clause = columns
        .iter()
        .map(|c| format!("{c} = ?"))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {table} SET {set_clause} WHERE {id_column} = ?");

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate {
        sql,
        values,
        columns,
    })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update<'e, E>(executor: E, update: SqlUpdate) -> Result<u64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::NullDate => query.bind(None::<NaiveDate>),
            SqlValue::NullId => query.bind(None::<u64>),
        };
    }

    let result = query.execute(executor).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: [Column; 3] = [
        Column::new("first_name", ColumnKind::Text),
        Column::new("hire_date", ColumnKind::NullableDate),
        Column::new("supervisor_id", ColumnKind::NullableId),
    ];

    #[test]
    fn test_builds_set_clause_for_allowed_columns() {
        let update = build_update_sql(
            "employees",
            &json!({"first_name": " Ana ", "hire_date": "2020-02-01"}),
            &COLUMNS,
            "id",
            4,
        )
        .unwrap();

        assert_eq!(update.sql, "UPDATE employees SET first_name = ?, hire_date = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![
                SqlValue::String("Ana".to_string()),
                SqlValue::Date(NaiveDate::from_ymd_opt(2020, 2, 1).unwrap()),
                SqlValue::U64(4),
            ]
        );
        assert!(update.touches("hire_date"));
    }

    #[test]
    fn test_rejects_columns_outside_allow_list() {
        let err = build_update_sql("employees", &json!({"used_days": 0}), &COLUMNS, "id", 1).unwrap_err();
        assert_eq!(err.to_string(), "Field 'used_days' cannot be updated");
    }

    #[test]
    fn test_null_clears_nullable_columns_only() {
        let update =
            build_update_sql("employees", &json!({"supervisor_id": null}), &COLUMNS, "id", 1).unwrap();
        assert_eq!(update.values[0], SqlValue::NullId);

        assert!(build_update_sql("employees", &json!({"first_name": null}), &COLUMNS, "id", 1).is_err());
    }

    #[test]
    fn test_rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("employees", &json!({}), &COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!([1, 2]), &COLUMNS, "id", 1).is_err());
        assert!(build_update_sql("employees", &json!({"hire_date": "01/02/2020"}), &COLUMNS, "id", 1).is_err());
    }
}
