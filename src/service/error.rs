//! Service Error Types
//!
//! Semantic results of user use cases, independent of transport.

use crate::store::{FilterError, StoreError};

/// Errors returned by [`super::UserService`]
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("User not found: {0}")]
    NotFound(i64),

    /// Expected version did not match, or the row was locked by a
    /// concurrent writer
    #[error("Version conflict on user {0}")]
    VersionConflict(i64),

    #[error("Duplicate user: {0}")]
    DuplicateKey(String),

    /// Update requested without any field delta
    #[error("No changes")]
    NoChanges,

    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    #[error("{operation} failed: {source}")]
    Infrastructure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    /// Translate a store error raised during `operation`
    pub fn from_store(operation: &'static str, error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            StoreError::VersionConflict { id, .. } | StoreError::Locked(id) => {
                ServiceError::VersionConflict(id)
            }
            StoreError::DuplicateKey { constraint } => ServiceError::DuplicateKey(constraint),
            source => ServiceError::Infrastructure { operation, source },
        }
    }

    /// Check if this is a client error (caller's input)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::NoChanges | Self::InvalidFilter(_)
        )
    }

    /// Check if this is a conflict error (retrying the read-modify-write
    /// cycle may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::VersionConflict(_) | Self::DuplicateKey(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflicts_become_version_conflict() {
        let err = ServiceError::from_store(
            "update user",
            StoreError::VersionConflict {
                id: 9,
                expected: 1,
                actual: 2,
            },
        );
        assert!(matches!(err, ServiceError::VersionConflict(9)));
        assert!(err.is_conflict_error());

        let err = ServiceError::from_store("update user", StoreError::Locked(9));
        assert!(matches!(err, ServiceError::VersionConflict(9)));
    }

    #[test]
    fn test_duplicate_key_keeps_constraint() {
        let err = ServiceError::from_store(
            "create user",
            StoreError::DuplicateKey {
                constraint: "users_nickname_key".to_string(),
            },
        );

        assert!(matches!(err, ServiceError::DuplicateKey(ref c) if c == "users_nickname_key"));
    }

    #[test]
    fn test_infrastructure_error_carries_operation() {
        let err = ServiceError::from_store(
            "list users",
            StoreError::Timeout {
                operation: "list users",
            },
        );

        assert!(matches!(
            err,
            ServiceError::Infrastructure {
                operation: "list users",
                ..
            }
        ));
        assert!(!err.is_client_error());
        assert!(!err.is_conflict_error());
    }
}
