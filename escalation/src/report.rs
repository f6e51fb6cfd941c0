//! Error reports awaiting the user's escalation decision.
//!
//! An [`ErrorReport`] is built once, when the failure happens, and never
//! changes afterwards. It holds everything the operator message needs, so
//! resolution does not depend on the original interaction still being
//! around.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{CommandFailure, EscalationError, EscalationResult};
use crate::interaction::{Interaction, InteractionData};
use crate::message::{truncate_chars, Embed, OutboundMessage, EMBED_FIELD_VALUE_LIMIT};
use crate::platform::{ChannelId, UserId};
use crate::ticket::TicketId;

/// Shown in place of the user's identity on anonymous reports.
pub const ANONYMOUS_MARKER: &str = "anonymous";

const REPORT_TITLE: &str = "Error Report";
const FIELD_USER: &str = "Afflicted User";
const FIELD_COMMAND: &str = "Issued Command";
const FIELD_ERROR: &str = "Error";
// Room for the code fences and language tag around a field body.
const FENCE_OVERHEAD: usize = 16;

/// Who triggered the failing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
}

impl Author {
    pub fn mention(&self) -> String {
        self.id.mention()
    }
}

/// The command payload as the user issued it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    ApplicationCommand { name: String, options: Value },
    MessageComponent { custom_id: String, values: Vec<String> },
}

impl CommandPayload {
    /// Pretty-printed JSON for the operator.
    pub fn render_pretty(&self) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to render command payload");
                r#"{"error": "could not render command payload"}"#.to_string()
            }
        }
    }
}

impl From<&InteractionData> for CommandPayload {
    fn from(data: &InteractionData) -> Self {
        match data {
            InteractionData::ApplicationCommand { name, options } => Self::ApplicationCommand {
                name: name.clone(),
                options: options.clone(),
            },
            InteractionData::MessageComponent { custom_id, values } => Self::MessageComponent {
                custom_id: custom_id.clone(),
                values: values.clone(),
            },
        }
    }
}

/// Immutable copy of the originating request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSnapshot {
    pub author: Author,
    pub guild_id: Option<String>,
    pub channel_id: Option<ChannelId>,
    pub interaction_id: String,
    pub payload: CommandPayload,
}

impl RequestSnapshot {
    /// Capture the parts of `interaction` a report needs.
    ///
    /// Fails when the interaction has no author attached.
    pub fn capture(interaction: &Interaction) -> EscalationResult<Self> {
        let author = interaction
            .author()
            .ok_or_else(|| EscalationError::MissingAuthor {
                interaction_id: interaction.id.clone(),
            })?;

        Ok(Self {
            author: Author {
                id: author.id.clone(),
                username: author.username.clone(),
            },
            guild_id: interaction.guild_id.clone(),
            channel_id: interaction.channel_id.clone(),
            interaction_id: interaction.id.clone(),
            payload: CommandPayload::from(&interaction.data),
        })
    }
}

/// The failure being reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDescription {
    pub message: String,
    /// `file:line` where the failure was raised.
    pub location: String,
}

impl From<&CommandFailure> for FailureDescription {
    fn from(failure: &CommandFailure) -> Self {
        Self {
            message: failure.user_text().to_string(),
            location: failure.location(),
        }
    }
}

/// One pending error report.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    ticket: TicketId,
    request: RequestSnapshot,
    failure: FailureDescription,
    created_at: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(ticket: TicketId, request: RequestSnapshot, failure: FailureDescription) -> Self {
        Self {
            ticket,
            request,
            failure,
            created_at: Utc::now(),
        }
    }

    pub fn ticket(&self) -> TicketId {
        self.ticket
    }

    pub fn request(&self) -> &RequestSnapshot {
        &self.request
    }

    pub fn failure(&self) -> &FailureDescription {
        &self.failure
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Private message delivered to the operator.
    ///
    /// Anonymous reports replace the user's mention with
    /// [`ANONYMOUS_MARKER`]; nothing else identifies the user.
    pub fn operator_message(&self, anonymous: bool) -> OutboundMessage {
        let afflicted = if anonymous {
            ANONYMOUS_MARKER.to_string()
        } else {
            self.request.author.mention()
        };
        let budget = EMBED_FIELD_VALUE_LIMIT - FENCE_OVERHEAD;
        let command = truncate_chars(&self.request.payload.render_pretty(), budget);
        let error = truncate_chars(
            &format!("{} {}", self.failure.location, self.failure.message),
            budget,
        );

        let embed = Embed::new()
            .title(REPORT_TITLE)
            .field(FIELD_USER, afflicted)
            .field(FIELD_COMMAND, format!("```json\n{command}\n```"))
            .field(FIELD_ERROR, format!("```\n{error}\n```"))
            .truncate();

        // The embed never pings anyone, attributed or not.
        OutboundMessage::default()
            .with_embed(embed)
            .allow_user_mentions(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionUser;
    use crate::ticket::{RandomTicketIds, TicketIdGenerator};
    use serde_json::json;

    fn interaction() -> Interaction {
        Interaction {
            id: "9001".to_string(),
            application_id: "app".to_string(),
            token: "tok".to_string(),
            guild_id: Some("guild".to_string()),
            channel_id: Some(ChannelId::new("chan")),
            member: Some(InteractionUser {
                id: UserId::new("555"),
                username: "dicey".to_string(),
            }),
            user: None,
            message: None,
            data: InteractionData::ApplicationCommand {
                name: "dalle".to_string(),
                options: json!([{"name": "prompt", "value": "a cat in a hat"}]),
            },
        }
    }

    fn report() -> ErrorReport {
        let request = RequestSnapshot::capture(&interaction()).unwrap();
        let failure = FailureDescription {
            message: "image service returned 502".to_string(),
            location: "src/dalle.rs:88".to_string(),
        };
        ErrorReport::new(RandomTicketIds.next_id(), request, failure)
    }

    fn field<'a>(message: &'a OutboundMessage, name: &str) -> &'a str {
        message.embeds[0]
            .fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
            .unwrap()
    }

    #[test]
    fn test_created_at_is_set_on_construction() {
        let before = Utc::now();
        let report = report();
        let after = Utc::now();
        assert!(report.created_at() >= before);
        assert!(report.created_at() <= after);
    }

    #[test]
    fn test_capture_requires_author() {
        let mut i = interaction();
        i.member = None;
        let err = RequestSnapshot::capture(&i).unwrap_err();
        assert!(matches!(err, EscalationError::MissingAuthor { .. }));
    }

    #[test]
    fn test_capture_copies_request() {
        let snapshot = RequestSnapshot::capture(&interaction()).unwrap();
        assert_eq!(snapshot.author.id, UserId::new("555"));
        assert_eq!(snapshot.interaction_id, "9001");
        assert_eq!(snapshot.channel_id, Some(ChannelId::new("chan")));
        assert!(matches!(
            snapshot.payload,
            CommandPayload::ApplicationCommand { ref name, .. } if name == "dalle"
        ));
    }

    #[test]
    fn test_attributed_message_mentions_author() {
        let message = report().operator_message(false);
        assert_eq!(message.embeds[0].title.as_deref(), Some("Error Report"));
        assert_eq!(field(&message, "Afflicted User"), "<@555>");
        assert!(field(&message, "Issued Command").contains("a cat in a hat"));
        assert!(field(&message, "Error").contains("src/dalle.rs:88 image service returned 502"));
        assert_eq!(message.allowed_user_mentions, Some(Vec::new()));
    }

    #[test]
    fn test_anonymous_message_hides_author() {
        let message = report().operator_message(true);
        assert_eq!(field(&message, "Afflicted User"), ANONYMOUS_MARKER);
        for f in &message.embeds[0].fields {
            assert!(!f.value.contains("555"));
            assert!(!f.value.contains("dicey"));
        }
    }

    #[test]
    fn test_long_failure_keeps_closing_fence() {
        let mut r = report();
        r.failure.message = "x".repeat(5000);
        let message = r.operator_message(false);
        let error = field(&message, "Error");
        assert!(error.ends_with("\n```"));
        assert!(error.chars().count() <= EMBED_FIELD_VALUE_LIMIT);
    }
}
