//! Data models

pub mod flags;
pub mod transaction;
pub mod user;

pub use flags::*;
pub use transaction::*;
pub use user::*;
