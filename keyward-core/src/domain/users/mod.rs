pub mod auth;
pub mod user;
pub mod value_objects;

pub use user::{NewUserIdentity, UserIdentity};
