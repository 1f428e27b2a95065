//! Channel trait and message types shared by every chat transport.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;

/// A chat message received from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Unique id assigned on receipt, used to correlate logs.
    pub id: Uuid,
    /// Name of the channel the message arrived on.
    pub channel: String,
    /// Stable id of the sender on that channel.
    pub user_id: String,
    /// Display name of the sender, if the channel knows one.
    pub user_name: Option<String>,
    pub content: String,
    /// Whether the sender is itself a bot.
    pub is_bot: bool,
    pub received_at: DateTime<Utc>,
    /// Channel-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            user_id: user_id.into(),
            user_name: None,
            content: content.into(),
            is_bot: false,
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn from_bot(mut self, is_bot: bool) -> Self {
        self.is_bot = is_bot;
        self
    }

    /// How to address the sender in a reply.
    ///
    /// Prefers an `@username` handle from metadata, then the display name,
    /// then the raw user id.
    pub fn mention(&self) -> String {
        if let Some(handle) = self.metadata.get("username").and_then(|v| v.as_str())
            && !handle.is_empty()
        {
            return format!("@{handle}");
        }
        self.user_name
            .clone()
            .unwrap_or_else(|| self.user_id.clone())
    }
}

/// A reply to send back on the channel a message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Stream of inbound messages produced by [`Channel::start`].
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply to `msg` on the same conversation.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
