//! Vacation request endpoints: filing, listing and the two approval stages.
//!
//! The state checks themselves live on [`VacationRequest`]; the handlers
//! decide who may act and make the change durable. Each decision reloads the
//! request with `FOR UPDATE` and persists with a status guard, so two
//! concurrent approvers cannot both succeed.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{MessageResponse, employee::load_with_fresh_entitlement, page_bounds},
    auth::auth::AuthUser,
    db::{
        self,
        vacations::{RequestFilter, Visibility},
    },
    error::{AppError, AppResult},
    model::{
        role::Role,
        vacation_request::{RequestStatus, VacationRequest},
    },
    vacation::{
        calendar,
        workflow::{Decision, NewVacationRequest, TransitionError},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VacationQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<RequestStatus>,
    pub employee_id: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct VacationListResponse {
    pub data: Vec<VacationRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DecisionRequest {
    pub decision: Decision,
    #[schema(example = "Enjoy", nullable = true)]
    pub comment: Option<String>,
}

/// Which requests the caller may list.
pub fn visibility_for(auth: &AuthUser) -> AppResult<Visibility> {
    match auth.role {
        Role::Admin | Role::Hr => Ok(Visibility::All),
        Role::Supervisor => Ok(Visibility::Team(auth.require_employee_link()?)),
        Role::Employee => Ok(Visibility::Own(auth.require_employee_link()?)),
    }
}

async fn ensure_can_view(pool: &MySqlPool, auth: &AuthUser, request: &VacationRequest) -> AppResult<()> {
    if auth.is_hr_or_admin() || auth.employee_id == Some(request.employee_id) {
        return Ok(());
    }
    if let (Role::Supervisor, Some(me)) = (auth.role, auth.employee_id) {
        if db::employees::is_supervised_by(pool, request.employee_id, me).await? {
            return Ok(());
        }
    }
    Err(AppError::Forbidden("Not allowed to view this request"))
}

/// Neither approval stage may be given by the requester.
fn ensure_not_own_request(request: &VacationRequest, approver_id: u64) -> AppResult<()> {
    if request.employee_id == approver_id {
        return Err(AppError::Forbidden("Approvers cannot decide their own requests"));
    }
    Ok(())
}

/// Turns a lost race on the status guard into the usual 409.
async fn refused_after_race(pool: &MySqlPool, id: u64, expected: RequestStatus) -> AppError {
    match db::vacations::fetch(pool, id).await {
        Ok(Some(current)) => TransitionError::UnexpectedState {
            current: current.status,
            expected,
        }
        .into(),
        Ok(None) => AppError::NotFound("Vacation request"),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    post,
    path = "/api/vacations",
    request_body = NewVacationRequest,
    responses(
        (status = 201, description = "Request filed, pending supervisor", body = VacationRequest),
        (status = 400, description = "Invalid dates, category or insufficient balance", body = MessageResponse),
        (status = 403, description = "Account is not linked to an employee", body = MessageResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
#[instrument(name = "create_vacation", skip(auth, pool, body), fields(user_id = auth.user_id))]
pub async fn create_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<NewVacationRequest>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee_link()?;
    let body = body.into_inner();

    // Cheap check first; it needs nothing from the database.
    body.check_range()?;

    let today = calendar::today();
    let employee = load_with_fresh_entitlement(pool.get_ref(), employee_id, today).await?;
    if !employee.is_active {
        return Err(AppError::Forbidden("Employee is not active"));
    }

    let validated = body.validate(employee_id, employee.hire_date, &employee.balance, today)?;
    let id = db::vacations::insert(pool.get_ref(), &validated).await?;

    let request = db::vacations::fetch(pool.get_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Vacation request"))?;

    info!(
        request_id = id,
        employee_id,
        days = request.requested_days,
        category = %request.category,
        "Vacation request filed"
    );
    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    get,
    path = "/api/vacations",
    params(VacationQuery),
    responses(
        (status = 200, description = "Requests visible to the caller", body = VacationListResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
pub async fn list_vacations(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<VacationQuery>,
) -> AppResult<HttpResponse> {
    let visibility = visibility_for(&auth)?;
    let (page, per_page, offset) = page_bounds(query.page, query.per_page);

    let filter = RequestFilter {
        employee_id: query.employee_id,
        status: query.status,
        limit: u64::from(per_page),
        offset,
    };
    let (data, total) = db::vacations::list(pool.get_ref(), visibility, &filter).await?;

    Ok(HttpResponse::Ok().json(VacationListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/vacations/{request_id}",
    params(("request_id", Path, description = "Vacation request ID")),
    responses(
        (status = 200, description = "Request found", body = VacationRequest),
        (status = 403, description = "Request not visible to the caller", body = MessageResponse),
        (status = 404, description = "Request not found", body = MessageResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
pub async fn get_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let request = db::vacations::fetch(pool.get_ref(), path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Vacation request"))?;

    ensure_can_view(pool.get_ref(), &auth, &request).await?;

    Ok(HttpResponse::Ok().json(request))
}

/// Supervisor stage. Approval forwards to HR; rejection is final.
#[utoipa::path(
    put,
    path = "/api/vacations/{request_id}/supervisor",
    params(("request_id", Path, description = "Vacation request ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = VacationRequest),
        (status = 403, description = "Caller does not supervise the employee", body = MessageResponse),
        (status = 404, description = "Request not found", body = MessageResponse),
        (status = 409, description = "Request is not pending supervisor", body = MessageResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
#[instrument(
    name = "supervisor_decision",
    skip(auth, pool, path, body),
    fields(request_id = *path, decision = ?body.decision)
)]
pub async fn supervisor_decision(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionRequest>,
) -> AppResult<HttpResponse> {
    auth.require_supervisor()?;
    let approver_id = auth.require_employee_link()?;
    let request_id = path.into_inner();
    let DecisionRequest { decision, comment } = body.into_inner();

    let mut tx = pool.begin().await?;

    let mut request = db::vacations::fetch_for_update(&mut tx, request_id)
        .await?
        .ok_or(AppError::NotFound("Vacation request"))?;

    ensure_not_own_request(&request, approver_id)?;
    if !db::employees::is_supervised_by(&mut *tx, request.employee_id, approver_id).await? {
        return Err(AppError::Forbidden("Not the supervisor of this employee"));
    }

    let from = request.status;
    let to = request.decide_as_supervisor(approver_id, decision, comment, Utc::now())?;

    if db::vacations::save_transition(&mut *tx, &request, from).await? == 0 {
        tx.rollback().await?;
        return Err(refused_after_race(pool.get_ref(), request_id, from).await);
    }
    tx.commit().await?;

    info!(request_id, employee_id = request.employee_id, status = %to, "Supervisor decision recorded");
    Ok(HttpResponse::Ok().json(request))
}

/// HR stage. Approval debits the employee's used days in the same
/// transaction as the status change.
#[utoipa::path(
    put,
    path = "/api/vacations/{request_id}/hr",
    params(("request_id", Path, description = "Vacation request ID")),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = VacationRequest),
        (status = 403, description = "Caller is not HR or owns the request", body = MessageResponse),
        (status = 404, description = "Request not found", body = MessageResponse),
        (status = 409, description = "Request is not pending HR", body = MessageResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
#[instrument(
    name = "hr_decision",
    skip(auth, pool, path, body),
    fields(request_id = *path, decision = ?body.decision)
)]
pub async fn hr_decision(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<DecisionRequest>,
) -> AppResult<HttpResponse> {
    auth.require_hr()?;
    let hr_id = auth.require_employee_link()?;
    let request_id = path.into_inner();
    let DecisionRequest { decision, comment } = body.into_inner();

    let mut tx = pool.begin().await?;

    let mut request = db::vacations::fetch_for_update(&mut tx, request_id)
        .await?
        .ok_or(AppError::NotFound("Vacation request"))?;
    ensure_not_own_request(&request, hr_id)?;

    let mut employee = db::employees::fetch_for_update(&mut tx, request.employee_id)
        .await?
        .ok_or(AppError::NotFound("Employee"))?;

    let from = request.status;
    let to = request.decide_as_hr(hr_id, decision, comment, Utc::now(), &mut employee.balance)?;

    if db::vacations::save_transition(&mut *tx, &request, from).await? == 0 {
        tx.rollback().await?;
        return Err(refused_after_race(pool.get_ref(), request_id, from).await);
    }
    if to == RequestStatus::ApprovedByHr {
        db::employees::save_balance(&mut *tx, employee.id, &employee.balance).await?;
    }
    tx.commit().await?;

    if employee.balance.available_days().is_sign_negative() {
        warn!(
            employee_id = employee.id,
            available = %employee.balance.available_days(),
            "Approval left a negative balance"
        );
    }

    info!(
        request_id,
        employee_id = employee.id,
        status = %to,
        used_days = employee.balance.used_days,
        "HR decision recorded"
    );
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    post,
    path = "/api/vacations/{request_id}/cancel",
    params(("request_id", Path, description = "Vacation request ID")),
    responses(
        (status = 200, description = "Request cancelled", body = VacationRequest),
        (status = 403, description = "Caller does not own the request", body = MessageResponse),
        (status = 404, description = "Request not found", body = MessageResponse),
        (status = 409, description = "Request already final", body = MessageResponse)
    ),
    tag = "Vacation",
    security(("bearer_auth" = []))
)]
#[instrument(name = "cancel_vacation", skip(auth, pool, path), fields(request_id = *path))]
pub async fn cancel_vacation(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.require_employee_link()?;
    let request_id = path.into_inner();

    let mut tx = pool.begin().await?;

    let mut request = db::vacations::fetch_for_update(&mut tx, request_id)
        .await?
        .ok_or(AppError::NotFound("Vacation request"))?;

    if request.employee_id != employee_id {
        return Err(AppError::Forbidden("Only the requesting employee can cancel"));
    }

    let from = request.status;
    request.cancel(Utc::now())?;

    if db::vacations::save_transition(&mut *tx, &request, from).await? == 0 {
        tx.rollback().await?;
        return Err(refused_after_race(pool.get_ref(), request_id, from).await);
    }
    tx.commit().await?;

    info!(request_id, employee_id, "Vacation request cancelled");
    Ok(HttpResponse::Ok().json(request))
}
