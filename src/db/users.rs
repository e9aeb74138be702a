use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use sqlx::{MySqlConnection, MySqlPool};

use crate::model::role::Role;
use crate::model::user::{UserCredentials, UserRow};

pub async fn fetch_credentials(
    pool: &MySqlPool,
    username: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, username, password, role_id, employee_id, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &MySqlPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn insert(
    conn: &mut MySqlConnection,
    username: &str,
    password_hash: &str,
    role: Role,
    employee_id: u64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (username, password, role_id, employee_id) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role.id())
    .bind(employee_id)
    .execute(conn)
    .await?;
    Ok(result.last_insert_id())
}

pub async fn list(pool: &MySqlPool, role: Option<Role>) -> Result<Vec<UserRow>, sqlx::Error> {
    let mut sql = String::from(
        "SELECT id, username, role_id, employee_id, is_active, last_login_at FROM users",
    );
    if role.is_some() {
        sql.push_str(" WHERE role_id = ?");
    }
    sql.push_str(" ORDER BY username");

    let mut q = sqlx::query_as::<_, UserRow>(&sql);
    if let Some(role) = role {
        q = q.bind(role.id());
    }
    q.fetch_all(pool).await
}

pub async fn fetch(pool: &MySqlPool, id: u64) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, username, role_id, employee_id, is_active, last_login_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_role(pool: &MySqlPool, id: u64, role: Role) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET role_id = ? WHERE id = ?")
        .bind(role.id())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn touch_last_login(pool: &MySqlPool, id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = UTC_TIMESTAMP() WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Usernames that logged in during the last `days` days, most recent first.
pub async fn recent_usernames(pool: &MySqlPool, days: u32) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT username
        FROM users
        WHERE last_login_at >= UTC_TIMESTAMP() - INTERVAL ? DAY
        ORDER BY last_login_at DESC
        "#,
    )
    .bind(days)
    .fetch(pool)
    .try_collect()
    .await
}

pub async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    jti: &str,
    expires_at: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO refresh_tokens (user_id, jti, expires_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revokes a live refresh token. Returns `false` if it was unknown or
/// already revoked, so each token can be exchanged once.
pub async fn revoke_refresh_token(pool: &MySqlPool, jti: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE")
        .bind(jti)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
