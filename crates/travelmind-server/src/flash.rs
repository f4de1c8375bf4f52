//! One-shot notices carried to the next rendered page in a signed cookie.
//!
//! The cookie value is `base64url(json) "." hex(hmac_sha256(json))`. Values
//! that fail verification are dropped silently.

use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub const FLASH_COOKIE: &str = "travelmind_flash";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: Level::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }
}

/// Queues `flash` behind any notices already pending in `jar`.
pub fn push(jar: CookieJar, secret: &str, flash: Flash) -> CookieJar {
    let mut pending = read(&jar, secret);
    pending.push(flash);
    jar.add(build_cookie(secret, &pending))
}

/// Removes and returns every pending notice.
pub fn take(jar: CookieJar, secret: &str) -> (CookieJar, Vec<Flash>) {
    let pending = read(&jar, secret);
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, pending);
    }
    let removal = Cookie::build(FLASH_COOKIE)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    (jar.add(removal), pending)
}

fn read(jar: &CookieJar, secret: &str) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| decode(secret, c.value()))
        .unwrap_or_default()
}

fn build_cookie(secret: &str, flashes: &[Flash]) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, encode(secret, flashes)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

fn encode(secret: &str, flashes: &[Flash]) -> String {
    let json = serde_json::to_vec(flashes).unwrap_or_else(|_| b"[]".to_vec());
    let mut mac = mac(secret);
    mac.update(&json);
    let signature = hex::encode(mac.finalize().into_bytes());
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json);
    format!("{payload}.{signature}")
}

fn decode(secret: &str, value: &str) -> Option<Vec<Flash>> {
    let (payload, signature) = value.split_once('.')?;
    let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = mac(secret);
    mac.update(&json);
    if mac.verify_slice(&signature).is_err() {
        tracing::warn!("Discarding flash cookie with a bad signature");
        return None;
    }

    serde_json::from_slice(&json).ok()
}
