use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::book;
use crate::db::entities::prelude::Book;

#[derive(Clone)]
pub struct BookDao {
    db: DatabaseConnection,
}

impl DaoBase for BookDao {
    type Entity = Book;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl BookDao {
    pub async fn titles_by_ids(&self, ids: &[Uuid]) -> DaoResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let books = Book::find()
            .filter(book::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(DaoLayerError::Db)?;

        Ok(books.into_iter().map(|book| (book.id, book.title)).collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::db::entities::book;

    use super::BookDao;
    use crate::db::dao::DaoBase;

    #[tokio::test]
    async fn titles_by_ids_skips_query_for_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = BookDao::new(&db);

        let titles = dao.titles_by_ids(&[]).await.expect("no query should run");
        assert!(titles.is_empty());
    }

    #[tokio::test]
    async fn titles_by_ids_indexes_titles_by_book_id() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[book::Model {
                id,
                title: "Solaris".to_string(),
                author: "Stanisław Lem".to_string(),
            }]])
            .into_connection();
        let dao = BookDao::new(&db);

        let titles = dao.titles_by_ids(&[id]).await.expect("query should succeed");
        assert_eq!(titles.get(&id).map(String::as_str), Some("Solaris"));
    }
}
