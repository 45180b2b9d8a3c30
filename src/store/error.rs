//! User Store Errors
//!
//! Error types for versioned store operations.

/// Errors that can occur in the user store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No visible (non-disabled) row with this id
    #[error("User not found: {0}")]
    NotFound(i64),

    /// Optimistic concurrency conflict
    #[error("Version conflict for user {id}: expected version {expected}, found {actual}")]
    VersionConflict { id: i64, expected: u32, actual: u32 },

    /// Row lock held by another transaction (NOWAIT)
    #[error("User {0} is locked by a concurrent write")]
    Locked(i64),

    /// Unique constraint violated on insert or update
    #[error("Duplicate key violates constraint {constraint}")]
    DuplicateKey { constraint: String },

    /// Operation deadline elapsed; the transaction was rolled back
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    /// Database error
    #[error("{operation} failed: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Row could not be mapped onto a user
    #[error("Invalid user row: {0}")]
    InvalidRow(String),
}

/// SQLSTATE raised by `FOR UPDATE NOWAIT` when the row is already locked
const LOCK_NOT_AVAILABLE: &str = "55P03";

impl StoreError {
    /// Classify a driver error raised while running `operation`.
    ///
    /// Unique violations and lock contention become domain errors; anything
    /// else is wrapped with the operation name.
    pub fn from_sqlx(operation: &'static str, id: i64, error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &error {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateKey {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
            if db_err.code().as_deref() == Some(LOCK_NOT_AVAILABLE) {
                return StoreError::Locked(id);
            }
        }

        StoreError::Database {
            operation,
            source: error,
        }
    }

    /// Check if this error is a write conflict (retry of the whole
    /// read-modify-write cycle may help)
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::Locked(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let conflict = StoreError::VersionConflict {
            id: 1,
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_conflict());

        assert!(StoreError::Locked(1).is_conflict());
        assert!(!StoreError::NotFound(1).is_conflict());
    }

    #[test]
    fn test_non_database_sqlx_error_is_wrapped_with_operation() {
        let err = StoreError::from_sqlx("store user", 4, sqlx::Error::PoolTimedOut);

        assert!(!err.is_conflict());
        assert!(err.to_string().starts_with("store user failed"));
        assert!(matches!(
            err,
            StoreError::Database {
                operation: "store user",
                ..
            }
        ));
    }

    #[test]
    fn test_version_conflict_message_names_both_versions() {
        let err = StoreError::VersionConflict {
            id: 5,
            expected: 1,
            actual: 2,
        };

        assert_eq!(
            err.to_string(),
            "Version conflict for user 5: expected version 1, found 2"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = StoreError::Timeout { operation: "get user" };
        assert_eq!(err.to_string(), "get user timed out");
        assert!(!err.is_conflict());
    }
}
