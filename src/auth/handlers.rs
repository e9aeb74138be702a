use actix_web::{HttpRequest, HttpResponse, web};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    api::MessageResponse,
    auth::{
        auth::{AuthUser, bearer_token},
        jwt::{Claims, TokenType, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    db,
    error::{AppError, AppResult},
    model::role::Role,
};

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "mlopez")]
    pub username: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues an access/refresh pair and records the refresh token's `jti`.
async fn issue_tokens(pool: &MySqlPool, config: &Config, user: &AuthUser) -> AppResult<TokenPair> {
    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| AppError::Internal(format!("failed to sign access token: {e}")))?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(|e| AppError::Internal(format!("failed to sign refresh token: {e}")))?;

    let expires_at = DateTime::from_timestamp(refresh_claims.exp as i64, 0)
        .ok_or_else(|| AppError::Internal("refresh token expiry out of range".to_string()))?
        .naive_utc();

    debug!(user_id = user.user_id, jti = %refresh_claims.jti, "Storing refresh token");
    db::users::store_refresh_token(pool, user.user_id, &refresh_claims.jti, expires_at).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Option<Claims> {
    let token = bearer_token(req)?;
    let claims = verify_token(token, &config.jwt_secret).ok()?;
    (claims.token_type == TokenType::Refresh).then_some(claims)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Username or password missing", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, body),
    fields(username = %body.username)
)]
pub async fn login(
    body: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if body.username.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::BadRequest("Username or password required".to_string()));
    }

    let db_user = match db::users::fetch_credentials(pool.get_ref(), body.username.trim()).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            info!("Invalid credentials: account deactivated");
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
    };

    if let Err(e) = verify_password(&body.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let role = Role::from_id(db_user.role_id).ok_or_else(|| {
        AppError::Internal(format!("user {} has unknown role id {}", db_user.id, db_user.role_id))
    })?;

    let auth_user = AuthUser {
        user_id: db_user.id,
        username: db_user.username,
        role,
        employee_id: db_user.employee_id,
    };
    let tokens = issue_tokens(pool.get_ref(), &config, &auth_user).await?;

    if let Err(e) = db::users::touch_last_login(pool.get_ref(), auth_user.user_id).await {
        // not fatal for the login itself
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = auth_user.user_id, role = role.as_str(), "Login successful");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Exchanges a refresh token for a new pair. Each refresh token works once.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Refresh token invalid, expired or already used", body = MessageResponse)
    ),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
#[instrument(name = "auth_refresh", skip_all)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let claims = refresh_claims(&req, &config).ok_or(AppError::Unauthorized("Invalid refresh token"))?;

    if !db::users::revoke_refresh_token(pool.get_ref(), &claims.jti).await? {
        warn!(user_id = claims.user_id, jti = %claims.jti, "Refresh token reused or unknown");
        return Err(AppError::Unauthorized("Invalid refresh token"));
    }

    // Role and activation may have changed since the token was issued.
    let row = db::users::fetch(pool.get_ref(), claims.user_id)
        .await?
        .filter(|row| row.is_active)
        .ok_or(AppError::Unauthorized("Account is not active"))?;
    let role = Role::from_id(row.role_id).ok_or(AppError::Unauthorized("Invalid role"))?;

    let auth_user = AuthUser {
        user_id: row.id,
        username: row.username,
        role,
        employee_id: row.employee_id,
    };
    let tokens = issue_tokens(pool.get_ref(), &config, &auth_user).await?;

    debug!(user_id = auth_user.user_id, "Refresh token rotated");
    Ok(HttpResponse::Ok().json(tokens))
}

/// Revokes the presented refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    tag = "Auth",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Some(claims) = refresh_claims(&req, &config) {
        if let Err(e) = db::users::revoke_refresh_token(pool.get_ref(), &claims.jti).await {
            error!(error = %e, "Failed to revoke refresh token");
        }
    }

    HttpResponse::NoContent().finish()
}
