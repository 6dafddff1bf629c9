use anyhow::{Result, bail};
use validator::ValidateEmail;

use super::{AppConfig, defaults::MIN_SESSION_SECRET_LEN};
use crate::auth::password::MIN_PASSWORD_LEN;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.session_secret.trim().len() < MIN_SESSION_SECRET_LEN {
            errors.push(format!(
                "auth.session_secret must be at least {MIN_SESSION_SECRET_LEN} characters"
            ));
        }

        if auth.session_ttl_secs == 0 {
            errors.push("auth.session_ttl_secs must be > 0".to_string());
        }

        let admin_email = auth.admin_email.trim();
        if admin_email.is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        } else if !admin_email.validate_email() {
            errors.push(format!("auth.admin_email is not a valid email: {admin_email}"));
        }

        if auth.admin_password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!(
                "auth.admin_password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
