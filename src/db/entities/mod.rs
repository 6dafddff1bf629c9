#[allow(unused_imports)]
pub mod prelude {
    pub use super::book::Entity as Book;
    pub use super::loan::Entity as Loan;
    pub use super::user::Entity as User;
}

pub mod book;
pub mod loan;
pub mod user;
