use std::time::{SystemTime, UNIX_EPOCH};

use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{config::AuthConfig, error::AppError};

pub const SESSION_COOKIE: &str = "library_session";

/// Signs the session cookie (and any other short-lived cookie payload) with HS256.
#[derive(Clone)]
pub struct SessionKeys {
    enc: EncodingKey,
    dec: DecodingKey,
    ttl_secs: usize,
    secure_cookies: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String, // user id
    pub exp: usize,
    pub iat: usize,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_secs: usize, secure_cookies: bool) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
            ttl_secs,
            secure_cookies,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(
            cfg.session_secret.as_bytes(),
            cfg.session_ttl_secs as usize,
            cfg.secure_cookies,
        )
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".into());

        encode(&header, claims, &self.enc)
            .map_err(|err| AppError::internal(format!("Token encoding failed: {err}")))
    }

    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<T>(token, &self.dec, &validation)?;
        Ok(data.claims)
    }

    pub fn session_claims(&self, user_id: &Uuid) -> SessionClaims {
        let iat = now_unix();
        SessionClaims {
            sub: user_id.to_string(),
            iat,
            exp: iat + self.ttl_secs,
        }
    }

    /// Resolves a session cookie value to the user id it was issued for.
    pub fn user_id(&self, token: &str) -> Option<Uuid> {
        let claims = self.verify::<SessionClaims>(token).ok()?;
        Uuid::parse_str(&claims.sub).ok()
    }

    pub fn login_cookie(&self, user_id: &Uuid) -> Result<Cookie<'static>, AppError> {
        let token = self.sign(&self.session_claims(user_id))?;
        Ok(self.cookie(SESSION_COOKIE, token))
    }

    pub fn logout_cookie(&self) -> Cookie<'static> {
        self.cookie(SESSION_COOKIE, String::new())
    }

    pub fn cookie(&self, name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }
}

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as usize)
        .unwrap_or_default()
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::unauthorized(format!("Invalid or expired token: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{SESSION_COOKIE, SessionClaims, SessionKeys, now_unix};

    fn keys() -> SessionKeys {
        SessionKeys::new(b"unit-test-session-secret", 600, false)
    }

    #[test]
    fn session_cookie_resolves_to_issuing_user() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let cookie = keys.login_cookie(&user_id).expect("cookie should encode");

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(keys.user_id(cookie.value()), Some(user_id));
    }

    #[test]
    fn claims_expire_after_configured_ttl() {
        let claims = keys().session_claims(&Uuid::new_v4());
        assert_eq!(claims.exp.saturating_sub(claims.iat), 600);
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = SessionKeys::new(b"some-other-session-secret", 600, false);
        let token = other
            .sign(&other.session_claims(&Uuid::new_v4()))
            .expect("token should encode");

        assert_eq!(keys().user_id(&token), None);
    }

    #[test]
    fn expired_and_malformed_tokens_are_rejected() {
        let keys = keys();
        let expired = keys
            .sign(&SessionClaims {
                sub: Uuid::new_v4().to_string(),
                iat: 1,
                exp: now_unix().saturating_sub(3600),
            })
            .expect("token should encode");

        assert_eq!(keys.user_id(&expired), None);
        assert_eq!(keys.user_id("not-a-token"), None);
        assert_eq!(keys.user_id(""), None);
    }
}
