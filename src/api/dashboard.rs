use actix_web::{HttpResponse, web};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::{
    api::employee::load_with_fresh_entitlement,
    auth::auth::AuthUser,
    db::{self, vacations::Visibility},
    error::AppResult,
    model::{role::Role, vacation_request::RequestStatus},
    vacation::calendar,
};

/// Counters for the caller's landing page. Which optional fields are set
/// depends on the role.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardResponse {
    #[schema(example = "supervisor")]
    pub role: Option<Role>,
    /// Requests waiting on the caller (HR: pending HR, supervisor: pending
    /// supervisor for the team, employee: own open requests)
    #[schema(example = 3)]
    pub pending_for_me: i64,
    #[schema(example = 5)]
    pub approved_this_month: i64,
    #[schema(example = 1)]
    pub rejected_this_month: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 120)]
    pub active_employees: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = 8)]
    pub team_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "12.5", value_type = Option<String>)]
    pub available_days: Option<Decimal>,
}

async fn count(
    pool: &MySqlPool,
    visibility: Visibility,
    statuses: &[RequestStatus],
    this_month: bool,
) -> AppResult<i64> {
    let mut total = 0;
    for status in statuses {
        total += db::vacations::count_by_status(pool, visibility, *status, this_month).await?;
    }
    Ok(total)
}

const REJECTED: [RequestStatus; 2] = [RequestStatus::RejectedBySupervisor, RequestStatus::RejectedByHr];

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Role-specific counters", body = DashboardResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let pool = pool.get_ref();
    let mut response = DashboardResponse {
        role: Some(auth.role),
        ..DashboardResponse::default()
    };

    match (auth.role, auth.employee_id) {
        (Role::Admin | Role::Hr, _) => {
            let all = Visibility::All;
            response.pending_for_me = count(pool, all, &[RequestStatus::PendingHr], false).await?;
            response.approved_this_month = count(pool, all, &[RequestStatus::ApprovedByHr], true).await?;
            response.rejected_this_month = count(pool, all, &REJECTED, true).await?;
            response.active_employees = Some(db::employees::count_active(pool).await?);
        }
        (Role::Supervisor, Some(me)) => {
            let team = Visibility::SupervisedBy(me);
            response.pending_for_me =
                count(pool, team, &[RequestStatus::PendingSupervisor], false).await?;
            response.approved_this_month = count(pool, team, &[RequestStatus::ApprovedByHr], true).await?;
            response.rejected_this_month = count(pool, team, &REJECTED, true).await?;
            response.team_size = Some(db::employees::count_supervised(pool, me).await?);
        }
        (Role::Employee, Some(me)) => {
            let own = Visibility::Own(me);
            response.pending_for_me = count(
                pool,
                own,
                &[RequestStatus::PendingSupervisor, RequestStatus::PendingHr],
                false,
            )
            .await?;
            response.approved_this_month = count(pool, own, &[RequestStatus::ApprovedByHr], true).await?;
            response.rejected_this_month = count(pool, own, &REJECTED, true).await?;
        }
        // Unlinked supervisor/employee accounts only get the role.
        (Role::Supervisor | Role::Employee, None) => {}
    }

    if let Some(me) = auth.employee_id {
        let employee = load_with_fresh_entitlement(pool, me, calendar::today()).await?;
        response.available_days = Some(employee.balance.available_days());
    }

    Ok(HttpResponse::Ok().json(response))
}
