//! Failure interceptor
//!
//! Entry points command handlers call when they fail. Which one depends on
//! whether a deferred placeholder was already sent for the interaction:
//!
//! ```text
//! respond   ── nothing sent yet ──► initial ephemeral response
//! follow_up ── placeholder sent ──► delete placeholder, ephemeral follow-up
//! ```
//!
//! With `escalate` set and an operator configured, the message carries an
//! escalation prompt bound to a freshly stored ticket. Without an operator
//! the plain failure text is shown instead, exactly as if `escalate` were
//! false. Platform call failures are logged and never retried.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::CommandFailure;
use crate::interaction::Interaction;
use crate::message::OutboundMessage;
use crate::platform::{InteractionResponse, PlatformError, SharedPlatform, UserId};
use crate::prompt::EscalationPromptBuilder;
use crate::report::{ErrorReport, FailureDescription, RequestSnapshot};
use crate::store::SharedReportStore;
use crate::ticket::{SharedTicketIdGenerator, TicketId};

/// Generic notice shown above the escalation prompt.
pub const ESCALATION_NOTICE: &str = "Something went wrong while processing your command. 😔";

/// Shared reference to a FailureInterceptor
pub type SharedFailureInterceptor = Arc<FailureInterceptor>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Initial,
    FollowUp,
}

pub struct FailureInterceptor {
    platform: SharedPlatform,
    store: SharedReportStore,
    ids: SharedTicketIdGenerator,
    prompts: EscalationPromptBuilder,
    operator: Option<UserId>,
}

impl FailureInterceptor {
    pub fn new(
        platform: SharedPlatform,
        store: SharedReportStore,
        ids: SharedTicketIdGenerator,
        operator: Option<UserId>,
    ) -> Self {
        let prompts = EscalationPromptBuilder::new(platform.clone(), operator.clone());
        Self {
            platform,
            store,
            ids,
            prompts,
            operator,
        }
    }

    /// Create a shared reference to this interceptor
    pub fn shared(self) -> SharedFailureInterceptor {
        Arc::new(self)
    }

    /// Report a failure when no response has been sent yet.
    pub async fn respond(&self, interaction: &Interaction, failure: &CommandFailure, escalate: bool) {
        self.report(interaction, failure, escalate, Channel::Initial)
            .await;
    }

    /// Report a failure after a deferred placeholder was sent.
    pub async fn follow_up(
        &self,
        interaction: &Interaction,
        failure: &CommandFailure,
        escalate: bool,
    ) {
        if let Err(e) = self.platform.delete_original_response(interaction).await {
            warn!(
                interaction = %interaction.id,
                error = %e,
                "failed to delete deferred response"
            );
        }
        self.report(interaction, failure, escalate, Channel::FollowUp)
            .await;
    }

    /// Returns the opened ticket, if any.
    async fn report(
        &self,
        interaction: &Interaction,
        failure: &CommandFailure,
        escalate: bool,
        channel: Channel,
    ) -> Option<TicketId> {
        if failure.message().trim().is_empty() {
            warn!(
                interaction = %interaction.id,
                "empty failure text, using generic error"
            );
        }

        if !escalate {
            self.send_plain(interaction, failure, channel).await;
            return None;
        }
        if self.operator.is_none() {
            warn!(
                interaction = %interaction.id,
                "no operator configured, cannot offer an error report"
            );
            self.send_plain(interaction, failure, channel).await;
            return None;
        }

        let request = match RequestSnapshot::capture(interaction) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "cannot build error report");
                return None;
            }
        };

        let ticket = self.ids.next_id();
        let components = match self.prompts.build(ticket).await {
            Ok(components) => components,
            Err(e) => {
                error!(ticket = %ticket, error = %e, "cannot build escalation prompt");
                self.send_plain(interaction, failure, channel).await;
                return None;
            }
        };

        self.store.put(
            ticket,
            ErrorReport::new(ticket, request, FailureDescription::from(failure)),
        );

        let message = OutboundMessage::ephemeral(ESCALATION_NOTICE).with_components(components);
        if let Err(e) = self.send(interaction, message, channel).await {
            // Nobody can ever select a prompt that was never shown.
            self.store.remove(&ticket);
            error!(ticket = %ticket, error = %e, "failed to send escalation prompt");
            return None;
        }

        info!(
            ticket = %ticket,
            kind = %failure.kind(),
            command = interaction.route_key(),
            "offered error report escalation"
        );
        Some(ticket)
    }

    async fn send_plain(&self, interaction: &Interaction, failure: &CommandFailure, channel: Channel) {
        let message = OutboundMessage::ephemeral(failure.user_text());
        if let Err(e) = self.send(interaction, message, channel).await {
            error!(
                interaction = %interaction.id,
                error = %e,
                "failed to send error response"
            );
        }
    }

    async fn send(
        &self,
        interaction: &Interaction,
        message: OutboundMessage,
        channel: Channel,
    ) -> Result<(), PlatformError> {
        match channel {
            Channel::Initial => {
                self.platform
                    .respond(interaction, InteractionResponse::Message(message))
                    .await
            }
            Channel::FollowUp => self.platform.create_followup(interaction, message).await,
        }
    }
}
