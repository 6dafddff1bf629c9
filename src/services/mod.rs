pub mod account_service;
pub mod bootstrap;
pub mod repository;

pub use account_service::{AccountService, DeleteOutcome, FormOutcome};
pub use repository::{AccountRepository, LoanRecord, SeaOrmAccountRepository};
