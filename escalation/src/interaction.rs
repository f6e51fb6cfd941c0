//! Inbound interaction model
//!
//! The subset of a platform interaction event the escalation subsystem
//! reads: who triggered it, where, with which payload, and the credentials
//! needed to answer it.

use serde_json::Value;

use crate::platform::{ChannelId, UserId};

/// A user attached to an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionUser {
    pub id: UserId,
    pub username: String,
}

/// The message a component interaction originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionMessage {
    pub id: String,
    pub content: String,
}

/// What the interaction carries.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionData {
    /// A slash command invocation.
    ApplicationCommand { name: String, options: Value },
    /// A button press or select-menu choice.
    MessageComponent {
        custom_id: String,
        values: Vec<String>,
    },
}

/// One inbound interaction event.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    /// Short-lived token used to answer this interaction.
    pub token: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<ChannelId>,
    /// User behind the guild member, for interactions inside a guild.
    pub member: Option<InteractionUser>,
    /// User for interactions in direct messages.
    pub user: Option<InteractionUser>,
    pub message: Option<InteractionMessage>,
    pub data: InteractionData,
}

impl Interaction {
    /// The invoking user; the guild member wins over the bare user.
    pub fn author(&self) -> Option<&InteractionUser> {
        self.member.as_ref().or(self.user.as_ref())
    }

    /// Command name or component custom id, whichever applies.
    pub fn route_key(&self) -> &str {
        match &self.data {
            InteractionData::ApplicationCommand { name, .. } => name,
            InteractionData::MessageComponent { custom_id, .. } => custom_id,
        }
    }

    /// Selected values, for component interactions only.
    pub fn component_values(&self) -> Option<&[String]> {
        match &self.data {
            InteractionData::MessageComponent { values, .. } => Some(values),
            InteractionData::ApplicationCommand { .. } => None,
        }
    }

    pub fn is_component(&self) -> bool {
        matches!(self.data, InteractionData::MessageComponent { .. })
    }
}
