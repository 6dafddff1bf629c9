pub mod identity;
pub mod password;
pub mod session;
mod types;

pub use identity::{CurrentUser, MaybeUser};
pub use session::SessionKeys;
pub use types::UserStatus;
