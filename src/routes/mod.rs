use std::sync::Arc;

use axum::{Router, http::StatusCode, response::Response};

use crate::{error::error_page, state::AppState};

pub mod middleware;
pub mod views;

pub use middleware::catch_panic_layer;

pub const PROJECT_NAME: &str = "Library";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(views::router())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "The page you requested does not exist.")
}
