use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::{TokenType, verify_token};
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;

/// Caller identity taken from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl AuthUser {
    /// Validates an access token; refresh tokens are refused here.
    pub fn from_token(token: &str, secret: &str) -> Result<Self, AppError> {
        let claims =
            verify_token(token, secret).map_err(|_| AppError::Unauthorized("Invalid or expired token"))?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required"));
        }

        let role = Role::from_id(claims.role).ok_or(AppError::Unauthorized("Invalid role"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only"))
        }
    }

    pub fn require_hr(&self) -> Result<(), AppError> {
        if self.role == Role::Hr {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only"))
        }
    }

    pub fn require_supervisor(&self) -> Result<(), AppError> {
        if self.role == Role::Supervisor {
            Ok(())
        } else {
            Err(AppError::Forbidden("Supervisor only"))
        }
    }

    /// The employee record behind this account.
    pub fn require_employee_link(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or(AppError::Forbidden("Account is not linked to an employee"))
    }

    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Some(t) => t,
            None => return ready(Err(AppError::Unauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".to_string()))),
        };

        ready(AuthUser::from_token(token, &config.jwt_secret))
    }
}
