use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    auth::session::{SessionKeys, now_unix},
    error::AppError,
};

pub const FLASH_COOKIE: &str = "library_flash";
const FLASH_TTL_SECS: usize = 5 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    /// CSS modifier used by the page templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

/// A one-shot notice shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Danger, message)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FlashClaims {
    flashes: Vec<Flash>,
    exp: usize,
}

/// Queues flashes for the next page, keeping any that are still pending.
pub fn push(
    jar: CookieJar,
    keys: &SessionKeys,
    flashes: Vec<Flash>,
) -> Result<CookieJar, AppError> {
    if flashes.is_empty() {
        return Ok(jar);
    }

    let mut pending = pending(&jar, keys);
    pending.extend(flashes);

    let token = keys.sign(&FlashClaims {
        flashes: pending,
        exp: now_unix() + FLASH_TTL_SECS,
    })?;
    Ok(jar.add(keys.cookie(FLASH_COOKIE, token)))
}

/// Drains the pending flashes; a tampered or expired cookie yields none.
pub fn take(jar: CookieJar, keys: &SessionKeys) -> (CookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let flashes = pending(&jar, keys);
    (jar.remove(keys.cookie(FLASH_COOKIE, String::new())), flashes)
}

fn pending(jar: &CookieJar, keys: &SessionKeys) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| keys.verify::<FlashClaims>(cookie.value()).ok())
        .map(|claims| claims.flashes)
        .unwrap_or_default()
}
