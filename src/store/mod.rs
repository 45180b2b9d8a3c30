//! User Store module
//!
//! Persistence layer for versioned user aggregates.
//! Handles optimistic concurrency, soft delete and filtered listing on PostgreSQL.

mod error;
pub mod filter;
mod repository;

pub use error::StoreError;
pub use filter::{FilterClause, FilterError, UserFilter};
pub use repository::{PgUserStore, UserStore};
