//! Domain module
//!
//! Change-tracking aggregates and request context.

pub mod context;
pub mod meta;
pub mod user;

pub use context::OperationContext;
pub use meta::Meta;
pub use user::{UnknownUserField, User, UserField};
