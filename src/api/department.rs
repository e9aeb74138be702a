use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    api::{MessageResponse, double_option},
    auth::auth::AuthUser,
    db,
    error::{AppError, AppResult},
    model::department::{Department, DepartmentSummary},
};

const DUPLICATE_NAME: &str = "Department name already exists";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Finance")]
    pub name: String,
    #[schema(example = "Accounts payable and treasury", nullable = true)]
    pub description: Option<String>,
    #[schema(example = 7, nullable = true)]
    pub head_id: Option<u64>,
}

/// Absent fields are left unchanged; `null` clears `description` or `head_id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable = true)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u64>, nullable = true)]
    pub head_id: Option<Option<u64>>,
    pub is_active: Option<bool>,
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.len() > 100 {
        return Err(AppError::BadRequest(
            "Department name must be 1 to 100 characters".to_string(),
        ));
    }
    Ok(name.to_string())
}

async fn check_head(pool: &MySqlPool, head_id: Option<u64>) -> AppResult<()> {
    if let Some(head_id) = head_id {
        if !db::employees::is_active(pool, head_id).await? {
            return Err(AppError::Unprocessable(
                "Department head must be an active employee".to_string(),
            ));
        }
    }
    Ok(())
}

impl UpdateDepartment {
    fn apply(self, department: &mut Department) -> AppResult<()> {
        if let Some(name) = self.name {
            department.name = clean_name(&name)?;
        }
        if let Some(description) = self.description {
            department.description = description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty());
        }
        if let Some(head_id) = self.head_id {
            department.head_id = head_id;
        }
        if let Some(is_active) = self.is_active {
            department.is_active = is_active;
        }
        Ok(())
    }
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 409, description = "Name already exists", body = MessageResponse),
        (status = 422, description = "Head is not an active employee", body = MessageResponse)
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let name = clean_name(&body.name)?;
    check_head(pool.get_ref(), body.head_id).await?;

    let description = body
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let id = db::departments::insert(pool.get_ref(), &name, description, body.head_id)
        .await
        .map_err(|e| AppError::from_insert(e, DUPLICATE_NAME))?;

    let department = db::departments::fetch(pool.get_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Department"))?;

    info!(department_id = id, name = %department.name, "Department created");
    Ok(HttpResponse::Created().json(department))
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Active departments with employee counts", body = [DepartmentSummary])
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn list_departments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let departments = db::departments::list_with_counts(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    get,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = Department),
        (status = 404, description = "Department not found", body = MessageResponse)
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let department = db::departments::fetch(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Department"))?;

    Ok(HttpResponse::Ok().json(department))
}

#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 404, description = "Department not found", body = MessageResponse),
        (status = 409, description = "Name already exists", body = MessageResponse),
        (status = 422, description = "Head is not an active employee", body = MessageResponse)
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDepartment>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let department_id = path.into_inner();

    let mut department = db::departments::fetch(pool.get_ref(), department_id)
        .await?
        .ok_or(AppError::NotFound("Department"))?;

    let head_changed = matches!(body.head_id, Some(Some(_)));
    body.into_inner().apply(&mut department)?;
    if head_changed {
        check_head(pool.get_ref(), department.head_id).await?;
    }

    db::departments::update(pool.get_ref(), &department)
        .await
        .map_err(|e| AppError::from_insert(e, DUPLICATE_NAME))?;

    info!(department_id, by = auth.user_id, "Department updated");
    Ok(HttpResponse::Ok().json(department))
}
