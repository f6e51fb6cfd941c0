//! Chat platform seam
//!
//! The escalation subsystem never talks to the network directly. Everything
//! it needs from the chat platform (interaction replies, follow-ups, direct
//! messages, identity lookup) goes through [`ChatPlatform`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interaction::Interaction;
use crate::message::OutboundMessage;

/// Platform user identifier (a snowflake on Discord).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mention markup that pings the user when allowed.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved platform identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformUser {
    pub id: UserId,
    pub username: String,
    pub global_name: Option<String>,
}

impl PlatformUser {
    /// Global display name when set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// Reply to an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionResponse {
    /// Immediate reply carrying content.
    Message(OutboundMessage),
    /// Placeholder acknowledgment, replaced later by a follow-up.
    Deferred { ephemeral: bool },
    /// Replace the message the component interaction came from.
    UpdateMessage(OutboundMessage),
}

/// Errors returned by platform calls
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("platform api returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to decode platform response: {0}")]
    Decode(String),

    #[error("platform call timed out after {0:?}")]
    Timeout(Duration),
}

/// Operations consumed from the chat platform client.
///
/// Every call is a single best-effort attempt; implementations should not
/// retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send the initial response to an interaction.
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<(), PlatformError>;

    /// Delete the initial (usually deferred) response to an interaction.
    async fn delete_original_response(&self, interaction: &Interaction)
        -> Result<(), PlatformError>;

    /// Send a follow-up message to an already acknowledged interaction.
    async fn create_followup(
        &self,
        interaction: &Interaction,
        message: OutboundMessage,
    ) -> Result<(), PlatformError>;

    /// Open (or fetch) the direct-message channel with a user.
    async fn open_direct_channel(&self, user: &UserId) -> Result<ChannelId, PlatformError>;

    /// Post a message into a channel.
    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), PlatformError>;

    /// Look up a user's identity.
    async fn resolve_user(&self, user: &UserId) -> Result<PlatformUser, PlatformError>;
}

/// Shared reference to a platform client
pub type SharedPlatform = Arc<dyn ChatPlatform>;
