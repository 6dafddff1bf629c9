use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::NullOrdering, Order,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::loan;
use crate::db::entities::prelude::Loan;

#[derive(Clone)]
pub struct LoanDao {
    db: DatabaseConnection,
}

impl DaoBase for LoanDao {
    type Entity = Loan;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LoanDao {
    /// Loans still out, oldest first.
    pub async fn open_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<loan::Model>> {
        Loan::find()
            .filter(loan::Column::UserId.eq(*user_id))
            .filter(loan::Column::ReturnDate.is_null())
            .order_by_asc(loan::Column::LoanDate)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// Every loan of the user: open ones first, then by return and loan date, newest first.
    pub async fn history_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<loan::Model>> {
        Loan::find()
            .filter(loan::Column::UserId.eq(*user_id))
            .order_by_with_nulls(loan::Column::ReturnDate, Order::Desc, NullOrdering::First)
            .order_by_desc(loan::Column::LoanDate)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }
}
