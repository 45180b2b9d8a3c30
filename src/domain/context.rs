//! Operation Context
//!
//! Per-request metadata: correlation ID for tracing and an optional deadline
//! after which storage work is abandoned and rolled back.

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// Context for an operation, passed to every store call.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    /// Correlation ID for request tracing
    pub correlation_id: Option<Uuid>,

    /// Instant after which the operation must abort
    pub deadline: Option<Instant>,
}

impl OperationContext {
    /// Create a new empty context (no deadline)
    pub fn new() -> Self {
        Self {
            correlation_id: None,
            deadline: None,
        }
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Set the deadline to `timeout` from now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Whether the deadline has already passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();

        let context = OperationContext::new().with_correlation_id(correlation_id);

        assert_eq!(context.correlation_id, Some(correlation_id));
        assert!(context.deadline.is_none());
        assert!(!context.is_expired());
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = OperationContext::new();
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        let id2 = context.ensure_correlation_id();
        assert_eq!(id, id2);
    }

    #[tokio::test]
    async fn test_deadline_expiry() {
        let context = OperationContext::new().with_deadline(Instant::now());
        assert!(context.is_expired());

        let context = OperationContext::new().with_timeout(Duration::from_secs(60));
        assert!(!context.is_expired());
    }
}
