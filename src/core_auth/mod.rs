pub mod core_auth;
pub mod error;
pub mod helper;

pub use core_auth::{Auth, PasswdAuth, PasswdEntry, SimpleAuth};
pub use error::AuthError;
