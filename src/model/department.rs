use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Finance")]
    pub name: String,
    #[schema(example = "Accounts payable and treasury", nullable = true)]
    pub description: Option<String>,
    /// Employee heading the department
    #[schema(example = 7, nullable = true)]
    pub head_id: Option<u64>,
    pub is_active: bool,
}

/// Department with the number of active employees assigned to it.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct DepartmentSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub department: Department,
    #[schema(example = 12)]
    pub employee_count: i64,
}
