use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod account;
pub mod auth;
pub mod page;
pub mod public;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(public::router())
        .merge(auth::router())
        .merge(account::router())
}
