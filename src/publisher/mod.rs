//! User change publishing
//!
//! Best-effort notification of created and updated users. Publishing happens
//! after the write is committed; a failure is reported to the caller but
//! never undoes the write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::User;

/// Serialized form of a user on the message bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub email: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub version: u32,
}

impl From<&User> for UserMessage {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            nickname: user.nickname().to_string(),
            email: user.email().to_string(),
            country: user.country().to_string(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
            active: !user.is_disabled(),
            version: user.version(),
        }
    }
}

/// Publisher errors
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Publisher channel closed")]
    ChannelClosed,
}

/// Destination for user change notifications
#[async_trait]
pub trait UserPublisher: Send + Sync {
    async fn publish(&self, user: &User) -> Result<(), PublishError>;
}

/// Writes each message as JSON to the log under a topic name
#[derive(Debug, Clone)]
pub struct TracingPublisher {
    topic: String,
}

impl TracingPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl UserPublisher for TracingPublisher {
    async fn publish(&self, user: &User) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&UserMessage::from(user))?;

        tracing::info!(
            topic = %self.topic,
            user_id = user.id(),
            version = user.version(),
            payload = %payload,
            "Published user message"
        );

        Ok(())
    }
}

/// Forwards messages to an in-process consumer
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<UserMessage>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its bounded channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<UserMessage>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl UserPublisher for ChannelPublisher {
    async fn publish(&self, user: &User) -> Result<(), PublishError> {
        self.sender
            .send(UserMessage::from(user))
            .await
            .map_err(|_| PublishError::ChannelClosed)
    }
}
