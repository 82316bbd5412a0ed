use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;
use time::OffsetDateTime;

use crate::app::error::{missing_reference, unique_violation, ServiceError, ServiceResult};
use crate::domain::user::User;
use crate::infra::db::Db;

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const SESSION_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    db: Db,
}

impl AuthService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn signup(&self, username: &str, password: &str) -> ServiceResult<User> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let row = sqlx::query(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(_) => ServiceError::conflict("a user with this username already exists"),
            None => ServiceError::Storage(err),
        })?;

        let user = User {
            id: row.get("id"),
            username: row.get("username"),
            created_at: row.get("created_at"),
        };
        tracing::info!(user_id = user.id, "user created");

        Ok(user)
    }

    /// Verifies credentials and opens a session. `None` for an unknown
    /// username or a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Option<Session>> {
        let row = sqlx::query("SELECT id, password_hash FROM users WHERE username = $1")
            .bind(username.trim())
            .fetch_optional(self.db.pool())
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let user_id: i64 = row.get("id");
        let password_hash: String = row.get("password_hash");
        if !verify_password(password, &password_hash)? {
            return Ok(None);
        }

        let session = self.open_session(user_id).await?;
        Ok(Some(session))
    }

    /// Issues a fresh session token. Only the token's digest is stored.
    pub async fn open_session(&self, user_id: i64) -> ServiceResult<Session> {
        let token = generate_token();
        let created_at: OffsetDateTime = sqlx::query_scalar(
            "INSERT INTO sessions (token_hash, user_id) VALUES ($1, $2) RETURNING created_at",
        )
        .bind(hash_token(&token))
        .bind(user_id)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| missing_reference(err, &[("user_id", "user")]))?;

        Ok(Session {
            token,
            user_id,
            created_at,
        })
    }

    pub async fn resolve_session(&self, token: &str) -> ServiceResult<Option<i64>> {
        if token.is_empty() {
            return Ok(None);
        }
        let user_id = sqlx::query_scalar("SELECT user_id FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user_id)
    }

    pub async fn logout(&self, token: &str) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(hash_token(token))
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn validate_username(username: &str) -> ServiceResult<()> {
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(ServiceError::validation(format!(
            "username must be between {} and {} characters",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ServiceError::validation(
            "username may only contain letters, digits, '_' and '-'",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.trim().len() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation("password must be at least 8 characters"));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(ServiceError::validation("password must be at most 128 characters"));
    }
    Ok(())
}

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> ServiceResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
