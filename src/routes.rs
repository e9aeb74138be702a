use crate::{
    api::{dashboard, department, employee, user, vacation},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiters. Build once and clone into every worker so that all
/// workers share the same quota.
#[derive(Clone)]
pub struct RateLimiters {
    login: Arc<Limiter>,
    refresh: Arc<Limiter>,
    protected: Arc<Limiter>,
}

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Option<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let limiter = |name: &str, per_min: u32| {
            build_limiter(per_min)
                .map(Arc::new)
                .ok_or_else(|| format!("invalid {name} rate limit: {per_min}/min"))
        };
        Ok(Self {
            login: limiter("login", config.rate_login_per_min)?,
            refresh: limiter("refresh", config.rate_refresh_per_min)?,
            protected: limiter("protected", config.rate_protected_per_min)?,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    // /users/{id}/role
                    .service(web::resource("/{id}/role").route(web::put().to(user::change_role))),
            )
            .service(
                web::scope("/employees")
                    .service(web::resource("").route(web::get().to(employee::list_employees)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee)),
                    )
                    .service(
                        web::resource("/{id}/deactivate")
                            .route(web::post().to(employee::deactivate_employee)),
                    )
                    .service(
                        web::resource("/{id}/balance").route(web::get().to(employee::get_balance)),
                    ),
            )
            .service(web::resource("/me/balance").route(web::get().to(employee::my_balance)))
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::post().to(department::create_department))
                            .route(web::get().to(department::list_departments)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department)),
                    ),
            )
            .service(
                web::scope("/vacations")
                    // /vacations
                    .service(
                        web::resource("")
                            .route(web::post().to(vacation::create_vacation))
                            .route(web::get().to(vacation::list_vacations)),
                    )
                    // /vacations/{id}
                    .service(web::resource("/{id}").route(web::get().to(vacation::get_vacation)))
                    // /vacations/{id}/supervisor
                    .service(
                        web::resource("/{id}/supervisor")
                            .route(web::put().to(vacation::supervisor_decision)),
                    )
                    // /vacations/{id}/hr
                    .service(
                        web::resource("/{id}/hr").route(web::put().to(vacation::hr_decision)),
                    )
                    // /vacations/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::post().to(vacation::cancel_vacation)),
                    ),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard))),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new access_token and refresh_token; the old refresh_token is revoked

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_is_clamped() {
        assert!(build_limiter(0).is_some());
        assert!(build_limiter(100_000).is_some());
    }
}
