use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::MessageResponse,
    auth::{auth::AuthUser, password::hash_password},
    db::{self, employees::NewEmployee},
    error::{AppError, AppResult},
    model::{role::Role, user::User},
    utils::username_cache,
    vacation::{accrual, calendar},
};

/// Account plus the employee record it is linked to.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "mlopez")]
    pub username: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "employee")]
    pub role: Role,
    /// Defaults to `EMP{id:04}`
    #[schema(example = "EMP0042", nullable = true)]
    pub employee_number: Option<String>,
    #[schema(example = "Maria")]
    pub first_name: String,
    #[schema(example = "Lopez")]
    pub last_name: String,
    #[serde(default)]
    #[schema(example = "maria.lopez@company.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "Accountant")]
    pub job_title: String,
    /// Defaults to today
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = 7, nullable = true)]
    pub supervisor_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUser {
    #[schema(example = 15)]
    pub user_id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "EMP0042")]
    pub employee_number: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Only accounts with this role
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRole {
    #[schema(example = "supervisor")]
    pub role: Role,
}

impl CreateUser {
    fn validate(&self, caller: &AuthUser) -> AppResult<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username and password must not be empty".to_string(),
            ));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "First and last name must not be empty".to_string(),
            ));
        }
        if self
            .employee_number
            .as_deref()
            .is_some_and(|n| n.trim().is_empty() || n.len() > 20)
        {
            return Err(AppError::BadRequest(
                "Employee number must be 1 to 20 characters".to_string(),
            ));
        }
        // Only administrators hand out administrative roles.
        if matches!(self.role, Role::Admin | Role::Hr) && caller.role != Role::Admin {
            return Err(AppError::Forbidden("Only an admin can create HR or admin accounts"));
        }
        Ok(())
    }
}

/// Provision an account and its employee record in one transaction.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User and employee created", body = CreatedUser),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 403, description = "Caller is not HR/Admin", body = MessageResponse),
        (status = 409, description = "Username or employee number taken", body = MessageResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
#[instrument(name = "create_user", skip(auth, pool, body), fields(username = %body.username))]
pub async fn create_user(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateUser>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    body.validate(&auth)?;

    let body = body.into_inner();
    let username = body.username.trim().to_string();

    if !username_cache::is_username_available(pool.get_ref(), &username).await? {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = hash_password(&body.password)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;

    let today = calendar::today();
    let hire_date = body.hire_date.unwrap_or(today);
    let employee_number = body.employee_number.map(|n| n.trim().to_string());

    let new_employee = NewEmployee {
        employee_number: employee_number.clone(),
        first_name: body.first_name.trim().to_string(),
        last_name: body.last_name.trim().to_string(),
        email: body.email.trim().to_string(),
        job_title: body.job_title.trim().to_string(),
        hire_date: Some(hire_date),
        department_id: body.department_id,
        supervisor_id: body.supervisor_id,
        entitlement_days: accrual::entitlement(Some(hire_date), today).days(),
    };

    let mut tx = pool.begin().await?;

    let employee_id = db::employees::insert(&mut tx, &new_employee)
        .await
        .map_err(|e| AppError::from_insert(e, "Employee number already exists"))?;

    let user_id = db::users::insert(&mut tx, &username, &password_hash, body.role, employee_id)
        .await
        .map_err(|e| AppError::from_insert(e, "Username already taken"))?;

    tx.commit().await?;

    username_cache::mark_taken(&username).await;

    info!(user_id, employee_id, role = body.role.as_str(), "User provisioned");

    Ok(HttpResponse::Created().json(CreatedUser {
        user_id,
        employee_id,
        employee_number: employee_number
            .unwrap_or_else(|| db::employees::default_employee_number(employee_id)),
    }))
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(UserQuery),
    responses(
        (status = 200, description = "Accounts", body = [User]),
        (status = 403, description = "Caller is not HR/Admin", body = MessageResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let users: Vec<User> = db::users::list(pool.get_ref(), query.role)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    put,
    path = "/api/users/{user_id}/role",
    params(("user_id", Path, description = "User ID")),
    request_body = ChangeRole,
    responses(
        (status = 200, description = "Role changed", body = User),
        (status = 403, description = "Caller is not an admin", body = MessageResponse),
        (status = 404, description = "User not found", body = MessageResponse),
        (status = 422, description = "Admins cannot change their own role", body = MessageResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn change_role(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<ChangeRole>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    if user_id == auth.user_id {
        return Err(AppError::Unprocessable(
            "Admins cannot change their own role".to_string(),
        ));
    }

    if db::users::fetch(pool.get_ref(), user_id).await?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    db::users::set_role(pool.get_ref(), user_id, body.role).await?;

    let user = db::users::fetch(pool.get_ref(), user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    info!(user_id, role = body.role.as_str(), by = auth.user_id, "Role changed");
    Ok(HttpResponse::Ok().json(User::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "boss".to_string(),
            role,
            employee_id: None,
        }
    }

    fn payload(role: Role) -> CreateUser {
        serde_json::from_value(serde_json::json!({
            "username": "mlopez",
            "password": "pw",
            "role": role,
            "first_name": "Maria",
            "last_name": "Lopez"
        }))
        .unwrap()
    }

    #[test]
    fn test_hr_cannot_create_admins() {
        assert!(matches!(
            payload(Role::Admin).validate(&caller(Role::Hr)),
            Err(AppError::Forbidden(_))
        ));
        assert!(payload(Role::Admin).validate(&caller(Role::Admin)).is_ok());
        assert!(payload(Role::Supervisor).validate(&caller(Role::Hr)).is_ok());
    }

    #[test]
    fn test_blank_names_rejected() {
        let mut p = payload(Role::Employee);
        p.last_name = "  ".to_string();
        assert!(matches!(p.validate(&caller(Role::Hr)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_optional_fields_default() {
        let p = payload(Role::Employee);
        assert_eq!(p.email, "");
        assert_eq!(p.hire_date, None);
        assert_eq!(p.employee_number, None);
    }
}
