use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{Session, User};

pub const SESSION_COOKIE: &str = "travelmind_session";

const REMEMBER_DAYS: i64 = 30;
const DEFAULT_HOURS: i64 = 24;

pub fn create_session(pool: &DbPool, user_id: &str, remember: bool) -> AppResult<Session> {
    let conn = pool.get()?;
    let id = Uuid::new_v4().to_string();
    let token = generate_token();
    let lifetime = if remember {
        Duration::days(REMEMBER_DAYS)
    } else {
        Duration::hours(DEFAULT_HOURS)
    };
    let created_at = db::now();
    let expires_at = db::format_timestamp(Utc::now() + lifetime);

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, remember, expires_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![id, user_id, token, remember, expires_at, created_at],
    )?;

    tracing::debug!(user_id, remember, "Session created");

    Ok(Session {
        id,
        user_id: user_id.to_string(),
        token,
        remember,
        expires_at,
        created_at,
    })
}

pub fn validate_session(pool: &DbPool, token: &str) -> AppResult<(Session, User)> {
    let conn = pool.get()?;
    let now = db::now();

    let mut stmt = conn.prepare(
        "SELECT s.id, s.user_id, s.token, s.remember, s.expires_at, s.created_at,
                u.id, u.email, u.first_name, u.last_name, u.password_hash, u.phone, u.timezone,
                u.preferred_currency, u.preferences, u.is_active, u.created_at, u.updated_at, u.last_login
         FROM sessions s
         JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > ?2 AND u.is_active = 1",
    )?;

    let result = stmt.query_row(rusqlite::params![token, now], |row| {
        let session = Session {
            id: row.get(0)?,
            user_id: row.get(1)?,
            token: row.get(2)?,
            remember: row.get(3)?,
            expires_at: row.get(4)?,
            created_at: row.get(5)?,
        };
        let user = User::from_row_at(row, 6)?;
        Ok((session, user))
    });

    match result {
        Ok(pair) => Ok(pair),
        Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::Unauthorized),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// Resolves the caller from the session cookie, if any. Used by public pages
/// that only change behavior for signed-in users.
pub fn current_user(pool: &DbPool, jar: &CookieJar) -> AppResult<Option<User>> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };
    match validate_session(pool, cookie.value()) {
        Ok((_, user)) => Ok(Some(user)),
        Err(AppError::Unauthorized) => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn delete_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![token])?;
    Ok(())
}

pub fn purge_expired(pool: &DbPool) -> AppResult<usize> {
    let conn = pool.get()?;
    let removed = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        rusqlite::params![db::now()],
    )?;
    Ok(removed)
}

pub fn delete_user_sessions(pool: &DbPool, user_id: &str) -> AppResult<usize> {
    let conn = pool.get()?;
    let removed = conn.execute("DELETE FROM sessions WHERE user_id = ?1", rusqlite::params![user_id])?;
    Ok(removed)
}

pub fn build_session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);
    if session.remember {
        cookie = cookie.max_age(time::Duration::days(REMEMBER_DAYS));
    }
    cookie.build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE)
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build()
}

fn generate_token() -> String {
    use base64::Engine;
    let mut bytes = [0u8; 32];
    use rand::RngCore;
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
