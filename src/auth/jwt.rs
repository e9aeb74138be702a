use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::auth::AuthUser;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn claims_for(user: &AuthUser, token_type: TokenType, ttl: usize) -> Claims {
    Claims {
        user_id: user.user_id,
        sub: user.username.clone(),
        role: user.role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
        employee_id: user.employee_id,
    }
}

pub fn generate_access_token(user: &AuthUser, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = claims_for(user, TokenType::Access, ttl);
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Returns the encoded token together with its claims; the `jti` and `exp`
/// are stored so the token can be revoked.
pub fn generate_refresh_token(
    user: &AuthUser,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = claims_for(user, TokenType::Refresh, ttl);
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
