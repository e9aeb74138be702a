//! Pool setup and the queries shared by the HTTP handlers and the batch CLI.

pub mod departments;
pub mod employees;
pub mod users;
pub mod vacations;

use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::config::Config;

pub async fn connect(database_url: &str, max_connections: u32) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Connects and, when enabled, applies the embedded migrations.
pub async fn init_db(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    let pool = connect(&config.database_url, config.db_max_connections).await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
