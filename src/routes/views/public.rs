use std::sync::Arc;

use askama::Template;
use axum::{Router, extract::State, response::Response, routing::get};
use axum_extra::extract::CookieJar;

use super::page::{PageContext, render};
use crate::{auth::MaybeUser, error::AppError, state::AppState};

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    page: PageContext,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(index))
}

async fn index(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, page) = PageContext::load(jar, &state, user, Vec::new());
    render(jar, &IndexTemplate { page })
}
