use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    db::entities::user,
    error::AppError,
    flash::{self, Flash},
    state::AppState,
};

use super::session::SESSION_COOKIE;

const LOGIN_REQUIRED: &str = "You must be logged in to open this page.";

/// The signed-in user, if any. Resolved once per request and cached in the
/// request extensions.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

/// Guard for pages that need a signed-in user; anonymous requests are sent to
/// the login page with the requested path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<MaybeUser>().cloned() {
            return Ok(resolved);
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let user_id = jar
            .get(SESSION_COOKIE)
            .and_then(|cookie| state.session.user_id(cookie.value()));

        let user = match user_id {
            Some(id) => state.accounts.load_user(&id).await?,
            None => None,
        };

        let resolved = MaybeUser(user);
        parts.extensions.insert(resolved.clone());
        Ok(resolved)
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match user {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                tracing::debug!(path = %parts.uri.path(), "anonymous request to protected page");
                Err(unauthorized(parts, state))
            }
        }
    }
}

fn unauthorized(parts: &Parts, state: &AppState) -> Response {
    let jar = CookieJar::from_headers(&parts.headers);
    match flash::push(jar, &state.session, vec![Flash::info(LOGIN_REQUIRED)]) {
        Ok(jar) => (jar, Redirect::to(&login_url(parts.uri.path()))).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Login page URL carrying `next` as the continuation target.
pub fn login_url(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/user_login?{query}"),
        Err(_) => "/user_login".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::login_url;

    #[test]
    fn login_url_encodes_requested_path() {
        assert_eq!(login_url("/user_loan"), "/user_login?next=%2Fuser_loan");
        assert_eq!(login_url("/a b"), "/user_login?next=%2Fa+b");
    }
}
