pub mod base;
pub mod base_traits;
pub mod book_dao;
mod context;
pub mod error;
pub mod loan_dao;
pub mod user_dao;

pub use base::DaoBase;
pub use base_traits::HasIdActiveModel;
pub use book_dao::BookDao;
pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use loan_dao::LoanDao;
pub use user_dao::{NewUser, ProfileChanges, UserDao};
