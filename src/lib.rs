//! versioned_users Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod publisher;
pub mod service;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Meta, OperationContext, User, UserField};
pub use error::{AppError, AppResult};
pub use service::{CreateUserParams, ServiceError, UpdateUserParams, UserService};
pub use store::{PgUserStore, StoreError, UserFilter, UserStore};
