use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use uuid::Uuid;

use crate::{
    auth::UserStatus,
    db::{
        dao::{DaoBase, DaoContext, DaoLayerError, DaoResult, NewUser, ProfileChanges},
        entities::{loan, user},
    },
};

/// A loan joined with the title of the lent book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanRecord {
    pub id: Uuid,
    pub book_title: String,
    pub loan_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl LoanRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    pub fn loan_date_display(&self) -> String {
        self.loan_date.format("%Y-%m-%d").to_string()
    }

    pub fn return_date_display(&self) -> String {
        self.return_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Typed queries the account pages need; the only seam between handlers and storage.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_user_by_id(&self, id: &Uuid) -> DaoResult<Option<user::Model>>;

    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<user::Model>>;

    async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model>;

    async fn update_profile(&self, id: &Uuid, changes: ProfileChanges)
    -> DaoResult<user::Model>;

    async fn set_password_hash(&self, id: &Uuid, password_hash: &str) -> DaoResult<()>;

    async fn set_last_login(&self, id: &Uuid, at: &DateTime<FixedOffset>) -> DaoResult<()>;

    async fn count_admins(&self) -> DaoResult<u64>;

    /// Loans with no return date, oldest loan first.
    async fn find_open_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>>;

    /// Every loan of the user, in no guaranteed order.
    async fn find_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>>;

    /// Deletes the user together with their loan history.
    async fn delete_user(&self, id: &Uuid) -> DaoResult<()>;
}

#[derive(Clone)]
pub struct SeaOrmAccountRepository {
    daos: DaoContext,
}

impl SeaOrmAccountRepository {
    pub fn new(daos: DaoContext) -> Self {
        Self { daos }
    }

    async fn with_titles(&self, loans: Vec<loan::Model>) -> DaoResult<Vec<LoanRecord>> {
        let book_ids: Vec<Uuid> = loans.iter().map(|loan| loan.book_id).collect();
        let titles = self.daos.book().titles_by_ids(&book_ids).await?;

        Ok(loans
            .into_iter()
            .map(|loan| LoanRecord {
                id: loan.id,
                book_title: titles.get(&loan.book_id).cloned().unwrap_or_default(),
                loan_date: loan.loan_date,
                return_date: loan.return_date,
            })
            .collect())
    }
}

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn find_user_by_id(&self, id: &Uuid) -> DaoResult<Option<user::Model>> {
        match self.daos.user().find_by_id(*id).await {
            Ok(user) => Ok(Some(user)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        self.daos.user().find_by_email(email).await
    }

    async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        self.daos.user().create_user(new_user).await
    }

    async fn update_profile(
        &self,
        id: &Uuid,
        changes: ProfileChanges,
    ) -> DaoResult<user::Model> {
        self.daos.user().update_profile(id, changes).await
    }

    async fn set_password_hash(&self, id: &Uuid, password_hash: &str) -> DaoResult<()> {
        self.daos.user().set_password_hash(id, password_hash).await
    }

    async fn set_last_login(&self, id: &Uuid, at: &DateTime<FixedOffset>) -> DaoResult<()> {
        self.daos.user().set_last_login(id, at).await
    }

    async fn count_admins(&self) -> DaoResult<u64> {
        self.daos.user().count_by_status(UserStatus::Admin).await
    }

    async fn find_open_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>> {
        let loans = self.daos.loan().open_for_user(user_id).await?;
        self.with_titles(loans).await
    }

    async fn find_loans_for_user(&self, user_id: &Uuid) -> DaoResult<Vec<LoanRecord>> {
        let loans = self.daos.loan().history_for_user(user_id).await?;
        self.with_titles(loans).await
    }

    async fn delete_user(&self, id: &Uuid) -> DaoResult<()> {
        self.daos.user().delete_with_loans(id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{AccountRepository, LoanRecord, SeaOrmAccountRepository};
    use crate::db::{
        dao::DaoContext,
        entities::{book, loan, user},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date should be valid")
    }

    #[tokio::test]
    async fn missing_user_id_resolves_to_none() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let repo = SeaOrmAccountRepository::new(DaoContext::new(&db));

        let found = repo
            .find_user_by_id(&Uuid::new_v4())
            .await
            .expect("lookup should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn open_loans_carry_book_titles() {
        let user_id = Uuid::new_v4();
        let book_id = Uuid::new_v4();
        let loan_id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[loan::Model {
                id: loan_id,
                user_id,
                book_id,
                loan_date: date(2024, 3, 1),
                return_date: None,
            }]])
            .append_query_results([[book::Model {
                id: book_id,
                title: "The Left Hand of Darkness".to_string(),
                author: "Ursula K. Le Guin".to_string(),
            }]])
            .into_connection();
        let repo = SeaOrmAccountRepository::new(DaoContext::new(&db));

        let loans = repo
            .find_open_loans_for_user(&user_id)
            .await
            .expect("query should succeed");
        assert_eq!(
            loans,
            vec![LoanRecord {
                id: loan_id,
                book_title: "The Left Hand of Darkness".to_string(),
                loan_date: date(2024, 3, 1),
                return_date: None,
            }]
        );
    }

    #[test]
    fn record_dates_render_as_iso() {
        let record = LoanRecord {
            id: Uuid::nil(),
            book_title: String::new(),
            loan_date: date(2024, 1, 5),
            return_date: None,
        };
        assert!(record.is_open());
        assert_eq!(record.loan_date_display(), "2024-01-05");
        assert_eq!(record.return_date_display(), "");
    }
}
