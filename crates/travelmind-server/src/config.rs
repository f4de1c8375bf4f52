use std::env;

use anyhow::Context;

const DEV_SESSION_SECRET: &str = "change-me-to-a-random-32-char-string";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub sqlite_path: String,
    pub session_secret: String,
    pub cors_origin: String,
    pub secure_cookies: bool,
    pub app_url: String,
    pub seed_demo_user: bool,
    pub rate_limit: bool,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            sqlite_path: env::var("SQLITE_PATH")
                .unwrap_or_else(|_| "./data/travelmind.db".to_string()),
            session_secret: env::var("SESSION_SECRET")
                .unwrap_or_else(|_| DEV_SESSION_SECRET.to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            secure_cookies: flag("SECURE_COOKIES", false)?,
            app_url: env::var("APP_URL").unwrap_or_else(|_| "http://localhost:4000".to_string()),
            seed_demo_user: flag("SEED_DEMO_USER", true)?,
            rate_limit: flag("RATE_LIMIT", true)?,
            log_json: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }

    /// Deterministic configuration for tests: no rate limiting, no demo seed.
    pub fn for_tests(sqlite_path: impl Into<String>) -> Self {
        Self {
            server_port: 0,
            sqlite_path: sqlite_path.into(),
            session_secret: "test-secret-test-secret-test-secret".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            secure_cookies: false,
            app_url: "http://localhost:4000".to_string(),
            seed_demo_user: false,
            rate_limit: false,
            log_json: false,
        }
    }
}

fn flag(name: &str, default: bool) -> anyhow::Result<bool> {
    match env::var(name) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("{name} must be true or false")),
        Err(_) => Ok(default),
    }
}
