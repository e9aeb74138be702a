use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Credentials row used by the login path.
#[derive(sqlx::FromRow)]
pub struct UserCredentials {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    pub is_active: bool,
}

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: u64,
    pub username: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    pub is_active: bool,
    pub last_login_at: Option<NaiveDateTime>,
}

/// Account as exposed to administrators; never carries the password hash.
#[derive(Debug, Serialize, ToSchema)]
pub struct User {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "mlopez")]
    pub username: String,
    /// `None` when the stored role id is not a known role
    pub role: Option<Role>,
    #[schema(example = 12, nullable = true)]
    pub employee_id: Option<u64>,
    pub is_active: bool,
    #[schema(example = "2026-01-01T09:30:00", format = "date-time", value_type = Option<String>)]
    pub last_login_at: Option<NaiveDateTime>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            role: Role::from_id(row.role_id),
            employee_id: row.employee_id,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
        }
    }
}
