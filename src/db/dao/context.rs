use sea_orm::DatabaseConnection;

use super::{BookDao, DaoBase, LoanDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn loan(&self) -> LoanDao {
        DaoBase::new(&self.db)
    }

    pub fn book(&self) -> BookDao {
        DaoBase::new(&self.db)
    }
}
