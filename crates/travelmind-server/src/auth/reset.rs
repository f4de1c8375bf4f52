use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};

pub const RESET_TOKEN_LEN: usize = 32;
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Issues a reset token for `email` if such an account exists. Any previous
/// token for the account stops working. Returns `None` for unknown emails so
/// the caller can answer identically either way.
pub fn issue_reset_token(pool: &DbPool, email: &str) -> AppResult<Option<String>> {
    let conn = pool.get()?;
    let token = generate_token();
    let expires_at = db::format_timestamp(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS));

    let updated = conn.execute(
        "UPDATE users SET reset_token_hash = ?1, reset_token_expiry = ?2 WHERE email = ?3",
        rusqlite::params![digest(&token), expires_at, email.trim()],
    )?;

    Ok((updated == 1).then_some(token))
}

/// Looks up the account a still-valid token belongs to.
pub fn find_reset_user(pool: &DbPool, token: &str) -> AppResult<String> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT id FROM users WHERE reset_token_hash = ?1 AND reset_token_expiry > ?2",
        rusqlite::params![digest(token), db::now()],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::InvalidToken,
        _ => AppError::Database(e),
    })
}

/// Replaces the password and clears the token in one conditional statement,
/// so a token can be spent at most once even under concurrent submissions.
/// Returns the id of the account whose password changed.
pub fn consume_reset_token(pool: &DbPool, token: &str, new_password_hash: &str) -> AppResult<String> {
    let user_id = find_reset_user(pool, token)?;
    let conn = pool.get()?;
    let now = db::now();

    let updated = conn.execute(
        "UPDATE users
         SET password_hash = ?1, reset_token_hash = NULL, reset_token_expiry = NULL, updated_at = ?2
         WHERE id = ?3 AND reset_token_hash = ?4 AND reset_token_expiry > ?2",
        rusqlite::params![new_password_hash, now, user_id, digest(token)],
    )?;

    if updated == 0 {
        return Err(AppError::InvalidToken);
    }
    Ok(user_id)
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}
