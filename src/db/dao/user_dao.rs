use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::auth::UserStatus;
use crate::db::entities::prelude::{Loan, User};
use crate::db::entities::{loan, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    pub status: UserStatus,
    pub created_on: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            email: Set(new_user.email),
            phone_number: Set(new_user.phone_number),
            password_hash: Set(new_user.password_hash),
            status: Set(new_user.status.as_str().to_string()),
            created_on: Set(new_user.created_on),
            last_login: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn update_profile(
        &self,
        id: &Uuid,
        changes: ProfileChanges,
    ) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            active.first_name = Set(changes.first_name);
            active.last_name = Set(changes.last_name);
            active.email = Set(changes.email);
            active.phone_number = Set(changes.phone_number);
        })
        .await
    }

    pub async fn set_password_hash(&self, id: &Uuid, password_hash: &str) -> DaoResult<()> {
        let password_hash = password_hash.to_string();
        self.update(*id, move |active| {
            active.password_hash = Set(password_hash);
        })
        .await
        .map(|_| ())
    }

    pub async fn set_last_login(&self, id: &Uuid, at: &DateTime<FixedOffset>) -> DaoResult<()> {
        let at = *at;
        self.update(*id, move |active| {
            active.last_login = Set(Some(at));
        })
        .await
        .map(|_| ())
    }

    pub async fn count_by_status(&self, status: UserStatus) -> DaoResult<u64> {
        User::find()
            .filter(user::Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Removes the user and their loan history in a single transaction.
    pub async fn delete_with_loans(&self, id: &Uuid) -> DaoResult<()> {
        let txn = self.db.begin().await.map_err(DaoLayerError::Db)?;

        Loan::delete_many()
            .filter(loan::Column::UserId.eq(*id))
            .exec(&txn)
            .await
            .map_err(DaoLayerError::Db)?;

        let result = User::delete_by_id(*id)
            .exec(&txn)
            .await
            .map_err(DaoLayerError::Db)?;
        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: std::any::type_name::<User>(),
                id: *id,
            });
        }

        txn.commit().await.map_err(DaoLayerError::Db)
    }
}
