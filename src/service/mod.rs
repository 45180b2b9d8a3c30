//! Service module
//!
//! Use-case orchestration on top of the user store.
//! Each operation composes the change-tracking aggregate with the versioned store.

mod error;
mod params;
mod users;


pub use error::ServiceError;
pub use params::{CreateUserParams, UpdateUserParams};
pub use users::UserService;
