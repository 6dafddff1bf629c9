use sea_orm::entity::prelude::*;

use crate::{auth::UserStatus, db::dao::HasIdActiveModel};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone_number: String,
    pub password_hash: String,
    #[sea_orm(indexed)]
    pub status: String,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_on: DateTimeWithTimeZone,
    pub last_login: Option<DateTimeWithTimeZone>,
    #[sea_orm(has_many)]
    pub loans: HasMany<super::loan::Entity>,
}

impl Model {
    pub fn user_status(&self) -> UserStatus {
        UserStatus::from_stored(&self.status)
    }

    pub fn is_admin(&self) -> bool {
        self.user_status() == UserStatus::Admin
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl HasIdActiveModel for ActiveModel {
    fn set_id(&mut self, id: Uuid) {
        self.id = sea_orm::ActiveValue::Set(id);
    }
}
