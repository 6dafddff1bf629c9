use std::sync::Arc;

use crate::{
    auth::SessionKeys,
    config::AuthConfig,
    services::{AccountRepository, AccountService},
};

pub struct AppState {
    pub accounts: AccountService,
    pub session: SessionKeys,
}

impl AppState {
    pub fn new(auth: &AuthConfig, repo: Arc<dyn AccountRepository>) -> Arc<Self> {
        Arc::new(Self {
            session: SessionKeys::from_config(auth),
            accounts: AccountService::new(repo),
        })
    }
}
