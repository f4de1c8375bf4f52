use rusqlite::TransactionBehavior;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::password::{self, MIN_PASSWORD_LEN};
use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::User;

pub const EMAIL_TAKEN: &str = "Email already registered";

pub const DEMO_EMAIL: &str = "demo@travelmind.ai";
pub const DEMO_PASSWORD: &str = "password123";

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub terms_accepted: bool,
}

impl Registration {
    /// Every problem with the submission that can be found without storage.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let missing: Vec<&str> = [
            ("first_name", self.first_name.trim().is_empty()),
            ("last_name", self.last_name.trim().is_empty()),
            ("email", self.email.trim().is_empty()),
            ("password", self.password.is_empty()),
            ("confirm_password", self.confirm_password.is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();
        if !missing.is_empty() {
            problems.push(format!("Missing required fields: {}", missing.join(", ")));
        }

        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            problems.push("Invalid email address".to_string());
        }
        if self.password != self.confirm_password {
            problems.push("Passwords do not match".to_string());
        }
        if !self.password.is_empty() && password::is_too_short(&self.password) {
            problems.push(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            ));
        }
        if !self.terms_accepted {
            problems.push("You must accept the terms and conditions".to_string());
        }

        problems
    }
}

pub fn register(pool: &DbPool, form: &Registration) -> AppResult<User> {
    let mut problems = form.problems();
    let email = form.email.trim();

    if !email.is_empty() && find_by_email(pool, email)?.is_some() {
        problems.push(EMAIL_TAKEN.to_string());
    }
    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }

    let password_hash = password::hash_password(&form.password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = db::now();

    let conn = pool.get()?;
    let result = conn.execute(
        "INSERT INTO users (id, email, password_hash, first_name, last_name, terms_accepted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)",
        rusqlite::params![
            user_id,
            email,
            password_hash,
            form.first_name.trim(),
            form.last_name.trim(),
            now
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::validation(EMAIL_TAKEN));
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    tracing::info!(user_id, "User registered");
    find_by_id(pool, &user_id)?
        .ok_or_else(|| AppError::Internal("Registered user vanished".to_string()))
}

/// Checks credentials. Unknown emails and wrong passwords are
/// indistinguishable to the caller, including in timing.
pub fn authenticate(pool: &DbPool, email: &str, plaintext: &str) -> AppResult<User> {
    let Some(user) = find_by_email(pool, email.trim())? else {
        password::verify_dummy(plaintext);
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify_password(plaintext, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AppError::AccountInactive);
    }
    Ok(user)
}

pub fn record_login(pool: &DbPool, user_id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        rusqlite::params![db::now(), user_id],
    )?;
    Ok(())
}

pub fn find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<User>> {
    find_one(pool, "email", email)
}

pub fn find_by_id(pool: &DbPool, id: &str) -> AppResult<Option<User>> {
    find_one(pool, "id", id)
}

fn find_one(pool: &DbPool, column: &'static str, value: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let sql = format!("SELECT {} FROM users WHERE {column} = ?1", User::COLUMNS);
    match conn.query_row(&sql, rusqlite::params![value], User::from_row) {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}

/// A profile edit. `None` keeps the stored value; `preferences` is merged
/// key by key into the stored map.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub timezone: Option<String>,
    pub preferred_currency: Option<String>,
    pub preferences: Option<Map<String, Value>>,
}

impl ProfileUpdate {
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if matches!(&self.first_name, Some(v) if v.trim().is_empty()) {
            problems.push("First name cannot be empty".to_string());
        }
        if matches!(&self.last_name, Some(v) if v.trim().is_empty()) {
            problems.push("Last name cannot be empty".to_string());
        }
        if matches!(&self.email, Some(v) if !v.contains('@')) {
            problems.push("Invalid email address".to_string());
        }
        if matches!(&self.timezone, Some(v) if v.trim().is_empty() || v.len() > 64) {
            problems.push("Invalid timezone".to_string());
        }
        if let Some(currency) = &self.preferred_currency {
            let currency = currency.trim();
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
                problems.push("Currency must be a 3-letter code".to_string());
            }
        }
        problems
    }

    fn apply(self, user: &mut User) {
        if let Some(v) = self.first_name {
            user.first_name = v.trim().to_string();
        }
        if let Some(v) = self.last_name {
            user.last_name = v.trim().to_string();
        }
        if let Some(v) = self.email {
            user.email = v.trim().to_string();
        }
        if let Some(v) = self.phone {
            let v = v.trim();
            user.phone = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = self.timezone {
            user.timezone = v.trim().to_string();
        }
        if let Some(v) = self.preferred_currency {
            user.preferred_currency = v.trim().to_ascii_uppercase();
        }
        if let Some(prefs) = self.preferences {
            user.preferences.extend(prefs);
        }
    }
}

/// Applies `update` to the stored row, not to the caller's copy, so
/// overlapping edits each keep the other's preference keys. The read and the
/// write share one immediate transaction.
pub fn update_profile(pool: &DbPool, user: &User, update: ProfileUpdate) -> AppResult<User> {
    let problems = update.problems();
    if !problems.is_empty() {
        return Err(AppError::Validation(problems));
    }

    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut updated = match tx.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        rusqlite::params![user.id],
        User::from_row,
    ) {
        Ok(stored) => stored,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            return Err(AppError::NotFound("User not found".into()))
        }
        Err(e) => return Err(AppError::Database(e)),
    };
    update.apply(&mut updated);
    updated.updated_at = db::now();

    let preferences = Value::Object(updated.preferences.clone()).to_string();
    let result = tx.execute(
        "UPDATE users
         SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4, timezone = ?5,
             preferred_currency = ?6, preferences = ?7, updated_at = ?8
         WHERE id = ?9",
        rusqlite::params![
            updated.first_name,
            updated.last_name,
            updated.email,
            updated.phone,
            updated.timezone,
            updated.preferred_currency,
            preferences,
            updated.updated_at,
            updated.id
        ],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    }
    tx.commit()?;

    Ok(updated)
}

/// Inserts the demo account unless it already exists.
pub fn seed_demo_user(pool: &DbPool) -> AppResult<bool> {
    if find_by_email(pool, DEMO_EMAIL)?.is_some() {
        return Ok(false);
    }

    let password_hash = password::hash_password(DEMO_PASSWORD)?;
    let preferences = json!({
        "budget_range": "$1000-$3000",
        "travel_style": ["Adventure", "Culture"],
    })
    .to_string();
    let now = db::now();

    let conn = pool.get()?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO users (id, email, password_hash, first_name, last_name, preferences, terms_accepted_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'John', 'Doe', ?4, ?5, ?5, ?5)",
        rusqlite::params![Uuid::new_v4().to_string(), DEMO_EMAIL, password_hash, preferences, now],
    )?;
    Ok(inserted == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "password123".to_string(),
            confirm_password: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            terms_accepted: true,
        }
    }

    #[test]
    fn problems_lists_every_failure() {
        let form = Registration {
            email: "ada@example.com".into(),
            password: "short".into(),
            confirm_password: "other".into(),
            first_name: "Ada".into(),
            last_name: "".into(),
            terms_accepted: false,
        };
        let problems = form.problems();
        assert_eq!(
            problems,
            vec![
                "Missing required fields: last_name",
                "Passwords do not match",
                "Password must be at least 8 characters long",
                "You must accept the terms and conditions",
            ]
        );
        assert!(registration("ada@example.com").problems().is_empty());
    }

    #[test]
    fn register_then_authenticate() {
        let (_dir, pool) = db::test_pool();
        let user = register(&pool, &registration("ada@example.com")).unwrap();
        assert_ne!(user.password_hash, "password123");

        let found = authenticate(&pool, "ada@example.com", "password123").unwrap();
        assert_eq!(found.id, user.id);
        assert!(matches!(
            authenticate(&pool, "ada@example.com", "password124"),
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&pool, "nobody@example.com", "password123"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let (_dir, pool) = db::test_pool();
        register(&pool, &registration("ada@example.com")).unwrap();

        for email in ["ada@example.com", "ADA@example.com"] {
            match register(&pool, &registration(email)) {
                Err(AppError::Validation(problems)) => {
                    assert_eq!(problems, vec![EMAIL_TAKEN.to_string()])
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn inactive_accounts_cannot_sign_in() {
        let (_dir, pool) = db::test_pool();
        let user = register(&pool, &registration("ada@example.com")).unwrap();
        pool.get()
            .unwrap()
            .execute("UPDATE users SET is_active = 0 WHERE id = ?1", [&user.id])
            .unwrap();

        assert!(matches!(
            authenticate(&pool, "ada@example.com", "password123"),
            Err(AppError::AccountInactive)
        ));
        // Wrong password still reads as generic failure.
        assert!(matches!(
            authenticate(&pool, "ada@example.com", "nope-nope-nope"),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn update_profile_merges_preferences() {
        let (_dir, pool) = db::test_pool();
        let user = register(&pool, &registration("ada@example.com")).unwrap();

        let mut prefs = Map::new();
        prefs.insert("travel_style".into(), json!(["Culture"]));
        let updated = update_profile(
            &pool,
            &user,
            ProfileUpdate {
                first_name: Some("Augusta".into()),
                preferred_currency: Some("eur".into()),
                preferences: Some(prefs),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.first_name, "Augusta");
        assert_eq!(updated.preferred_currency, "EUR");

        let mut more = Map::new();
        more.insert("budget_range".into(), json!("$500-$1000"));
        let updated = update_profile(
            &pool,
            &updated,
            ProfileUpdate { preferences: Some(more), ..Default::default() },
        )
        .unwrap();

        let stored = find_by_id(&pool, &user.id).unwrap().unwrap();
        assert_eq!(stored.first_name, "Augusta");
        assert_eq!(stored.last_name, "Lovelace");
        assert_eq!(stored.preferences["travel_style"], json!(["Culture"]));
        assert_eq!(stored.preferences["budget_range"], json!("$500-$1000"));
        assert_eq!(stored.preferences, updated.preferences);
    }

    #[test]
    fn stale_user_copy_does_not_drop_earlier_preferences() {
        let (_dir, pool) = db::test_pool();
        let snapshot = register(&pool, &registration("ada@example.com")).unwrap();

        let mut budget = Map::new();
        budget.insert("budget_range".into(), json!("$1000-$3000"));
        update_profile(
            &pool,
            &snapshot,
            ProfileUpdate { preferences: Some(budget), ..Default::default() },
        )
        .unwrap();

        // Same pre-update copy, as a second overlapping request would hold.
        let mut style = Map::new();
        style.insert("travel_style".into(), json!(["Culture"]));
        let updated = update_profile(
            &pool,
            &snapshot,
            ProfileUpdate {
                preferences: Some(style),
                last_name: Some("Byron".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let stored = find_by_id(&pool, &snapshot.id).unwrap().unwrap();
        assert_eq!(stored.preferences["budget_range"], json!("$1000-$3000"));
        assert_eq!(stored.preferences["travel_style"], json!(["Culture"]));
        assert_eq!(stored.last_name, "Byron");
        assert_eq!(updated.preferences, stored.preferences);
    }

    #[test]
    fn update_profile_rejects_taken_email_and_bad_fields() {
        let (_dir, pool) = db::test_pool();
        register(&pool, &registration("ada@example.com")).unwrap();
        let grace = register(&pool, &registration("grace@example.com")).unwrap();

        let err = update_profile(
            &pool,
            &grace,
            ProfileUpdate { email: Some("ada@example.com".into()), ..Default::default() },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = update_profile(
            &pool,
            &grace,
            ProfileUpdate {
                first_name: Some("  ".into()),
                preferred_currency: Some("dollars".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        match err {
            AppError::Validation(problems) => assert_eq!(problems.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn demo_seed_is_idempotent() {
        let (_dir, pool) = db::test_pool();
        assert!(seed_demo_user(&pool).unwrap());
        assert!(!seed_demo_user(&pool).unwrap());

        let demo = authenticate(&pool, DEMO_EMAIL, DEMO_PASSWORD).unwrap();
        assert_eq!(demo.first_name, "John");
        assert_eq!(demo.preferences["budget_range"], json!("$1000-$3000"));
    }
}
