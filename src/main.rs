use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use tracing::{info, warn};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hr_vacations::config::Config;
use hr_vacations::db::init_db;
use hr_vacations::docs::ApiDoc;
use hr_vacations::routes::{self, RateLimiters};
use hr_vacations::telemetry;
use hr_vacations::utils::username_cache;

#[get("/")]
async fn index() -> impl Responder {
    "HR vacations service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    let _guard = telemetry::init_file_logging(&config);

    info!(addr = %config.server_addr, "Server starting...");

    let pool = init_db(&config)
        .await
        .context("failed to initialize database")?;

    let limiters = RateLimiters::from_config(&config).map_err(anyhow::Error::msg)?;

    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        // Warm up last 30 days of recent users in batches of 250
        if let Err(e) = username_cache::warmup_username_cache(&pool_for_cache_warmup, 30, 250).await {
            warn!(error = %e, "Failed to warm up username cache");
        }
    });

    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config = config.clone();
        let limiters = limiters.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(move |cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
