use askama::Template;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::{
    db::entities::user,
    error::AppError,
    flash::{self, Flash},
    routes::PROJECT_NAME,
    state::AppState,
};

pub const HOME: &str = "/";

/// Bindings shared by every page: navigation state and the notices to show.
pub struct PageContext {
    pub project_name: &'static str,
    pub user: Option<user::Model>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Drains pending flashes from the jar and appends `extra` after them.
    pub fn load(
        jar: CookieJar,
        state: &AppState,
        user: Option<user::Model>,
        extra: Vec<Flash>,
    ) -> (CookieJar, Self) {
        let (jar, mut flashes) = flash::take(jar, &state.session);
        flashes.extend(extra);
        (
            jar,
            Self {
                project_name: PROJECT_NAME,
                user,
                flashes,
            },
        )
    }
}

pub fn render<T: Template>(jar: CookieJar, template: &T) -> Result<Response, AppError> {
    let body = template.render()?;
    Ok((jar, Html(body)).into_response())
}

/// 303 redirect that carries `flashes` to the next rendered page.
pub fn redirect(
    jar: CookieJar,
    state: &AppState,
    flashes: Vec<Flash>,
    to: &str,
) -> Result<Response, AppError> {
    let jar = flash::push(jar, &state.session, flashes)?;
    Ok((jar, Redirect::to(to)).into_response())
}

/// Only local absolute paths are accepted as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => HOME,
    }
}
