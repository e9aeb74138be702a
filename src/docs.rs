use crate::api::MessageResponse;
use crate::api::dashboard::DashboardResponse;
use crate::api::department::{CreateDepartment, UpdateDepartment};
use crate::api::employee::{BalanceResponse, EmployeeListResponse, UpdateEmployee};
use crate::api::user::{ChangeRole, CreateUser, CreatedUser};
use crate::api::vacation::{DecisionRequest, VacationListResponse};
use crate::auth::handlers::{LoginRequest, TokenPair};
use crate::model::department::{Department, DepartmentSummary};
use crate::model::employee::{Employee, VacationBalance};
use crate::model::role::Role;
use crate::model::user::User;
use crate::model::vacation_request::{RequestStatus, VacationCategory, VacationRequest};
use crate::vacation::workflow::{Decision, NewVacationRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Vacations API",
        version = "1.0.0",
        description = r#"
## Vacation Management

Tracks vacation entitlement for every employee and routes vacation requests
through a two-stage approval.

### Key Features
- **Entitlement**
  - Annual days by tenure, proportional accrual during the first year
  - Carry-over of unused days and monthly accrual (batch jobs)
- **Requests**
  - File, list and cancel requests
  - Supervisor review, then HR approval; HR approval debits the balance
- **Administration**
  - Provision accounts with their employee record, manage roles and departments

### Security
All `/api` endpoints require a **JWT Bearer** access token obtained from
`/auth/login`. Roles: `admin`, `hr`, `supervisor`, `employee`.

### Response Format
- JSON bodies; errors are `{"message": "..."}`
- Refused workflow transitions answer `409` and include the current `status`
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::change_role,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::deactivate_employee,
        crate::api::employee::get_balance,
        crate::api::employee::my_balance,

        crate::api::department::create_department,
        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::update_department,

        crate::api::vacation::create_vacation,
        crate::api::vacation::list_vacations,
        crate::api::vacation::get_vacation,
        crate::api::vacation::supervisor_decision,
        crate::api::vacation::hr_decision,
        crate::api::vacation::cancel_vacation,

        crate::api::dashboard::dashboard
    ),
    components(
        schemas(
            MessageResponse,
            LoginRequest,
            TokenPair,
            Role,
            User,
            CreateUser,
            CreatedUser,
            ChangeRole,
            Employee,
            VacationBalance,
            EmployeeListResponse,
            UpdateEmployee,
            BalanceResponse,
            Department,
            DepartmentSummary,
            CreateDepartment,
            UpdateDepartment,
            RequestStatus,
            VacationCategory,
            VacationRequest,
            VacationListResponse,
            NewVacationRequest,
            Decision,
            DecisionRequest,
            DashboardResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "User", description = "Account provisioning and roles"),
        (name = "Employee", description = "Employee records and balances"),
        (name = "Department", description = "Department management"),
        (name = "Vacation", description = "Vacation requests and approvals"),
        (name = "Dashboard", description = "Role-specific counters"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
