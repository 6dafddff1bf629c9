//! In-memory storage and router builders shared by unit and integration tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::{
    auth::{UserStatus, password::hash_password},
    config::AuthConfig,
    db::{
        dao::{DaoLayerError, DaoResult, NewUser, ProfileChanges},
        entities::user,
    },
    routes::{catch_panic_layer, router},
    services::{AccountRepository, LoanRecord},
    state::AppState,
};

pub const TEST_SESSION_SECRET: &str = "integration-test-session-secret";

#[derive(Default)]
struct Store {
    users: Vec<user::Model>,
    loans: Vec<(Uuid, LoanRecord)>,
}

/// `AccountRepository` over plain vectors; loans keep insertion order.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    store: Mutex<Store>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a user named after the local part of `email`.
    pub fn insert_user(&self, email: &str, password: &str, status: UserStatus) -> user::Model {
        let name = email.split('@').next().unwrap_or(email).to_string();
        let user = user::Model {
            id: Uuid::new_v4(),
            first_name: name,
            last_name: "Tester".to_string(),
            email: email.to_string(),
            phone_number: "555-0100".to_string(),
            password_hash: hash_password(password).expect("test password should hash"),
            status: status.as_str().to_string(),
            created_on: chrono::Utc::now().fixed_offset(),
            last_login: None,
        };
        self.store().users.push(user.clone());
        user
    }

    pub fn add_loan(
        &self,
        user_id: &Uuid,
        title: &str,
        loan_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> LoanRecord {
        let record = LoanRecord {
            id: Uuid::new_v4(),
            book_title: title.to_string(),
            loan_date,
            return_date,
        };
        self.store().loans.push((*user_id, record.clone()));
        record
    }

    pub fn user(&self, id: &Uuid) -> Option<user::Model> {
        self.store().users.iter().find(|user| user.id == *id).cloned()
    }

    pub fn users(&self) -> Vec<user::Model> {
        self.store().users.clone()
    }

    pub fn loans_of(&self, user_id: &Uuid) -> Vec<LoanRecord> {
        self.store()
            .loans
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, loan)| loan.clone())
            .collect()
    }

    fn modify_user(
        &self,
        id: &Uuid,
        apply: impl FnOnce(&mut user::Model),
    ) -> DaoResult<user::Model> {
        let mut store = self.store();
        let user = store
            .users
            .iter_mut()
            .find(|user| user.id == *id)
            .ok_or(DaoLayerError::NotFound {
                entity: "user",
                id: *id,
            })?;
        apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_user_by_id(&self, id: &Uuid) -> DaoResult<Option<user::Model>> {
        Ok(self.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        Ok(self
            .store()
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let user = user::Model {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            phone_number: new_user.phone_number,
            password_hash: new_user.password_hash,
            status: new_user.status.as_str().to_string(),
            created_on: new_user.created_on,
            last_login: None,
        };
        self.store().users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: &Uuid,
        changes: ProfileChanges,
    ) -> DaoResult<user::Model> {
        self.modify_user(id, |user| {
            user.first_name = changes.first_name;
            user.last_name = changes.last_name;
            user.email = changes.email;
            user.phone_number = changes.phone_number;
        })
    }

    async fn set_password_hash(&self, id: &Uuid, password_hash: &str) -> DaoResult<()> {
        self.modify_user(id, |user| user.password_hash = password_hash.to_string())
            .map(|_| ())
    }

    async fn set_last_login(&self, id: &Uuid, at: &DateTime<FixedOffset>) -> DaoResult<()> {
        self.modify_user(id, |user| user.last_login = Some(*at))
            .map(|_| ())
    }

    async fn count_admins(&self) -> DaoResult<u64> {
        Ok(self
            .store()
            .users
            .iter()
            .filter(|user| user.is_admin())
            .count() as u64)
    }

    async fn find_open_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>> {
        let mut loans: Vec<LoanRecord> = self
            .loans_of(user_id)
            .into_iter()
            .filter(LoanRecord::is_open)
            .collect();
        loans.sort_by_key(|loan| loan.loan_date);
        Ok(loans)
    }

    async fn find_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>> {
        Ok(self.loans_of(user_id))
    }

    async fn delete_user(&self, id: &Uuid) -> DaoResult<()> {
        let mut store = self.store();
        let before = store.users.len();
        store.users.retain(|user| user.id != *id);
        if store.users.len() == before {
            return Err(DaoLayerError::NotFound {
                entity: "user",
                id: *id,
            });
        }
        store.loans.retain(|(owner, _)| owner != id);
        Ok(())
    }
}

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        session_secret: TEST_SESSION_SECRET.to_string(),
        session_ttl_secs: 3600,
        secure_cookies: false,
        admin_email: "admin@library.test".to_string(),
        admin_password: "admin-password".to_string(),
    }
}

pub fn test_state(repo: Arc<InMemoryAccountRepository>) -> Arc<AppState> {
    AppState::new(&test_auth_config(), repo)
}

/// Full router, panic layer included, over the given repository.
pub fn test_router(repo: Arc<InMemoryAccountRepository>) -> Router {
    router(test_state(repo)).layer(catch_panic_layer())
}
