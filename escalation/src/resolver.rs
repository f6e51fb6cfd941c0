//! Escalation resolver
//!
//! Handles the user's choice on an escalation prompt:
//!
//! ```text
//! selected value ──decode──► selection ──claim──► report
//!                                                   │
//!                         DM to operator ◄──────────┘
//!                           │ ok                 │ err
//!                           ▼                    ▼
//!                 confirmation control     restore report, Delivery error
//! ```
//!
//! Claiming removes the ticket atomically before delivery starts, so two
//! concurrent selections of the same prompt deliver at most once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::error::{EscalationError, EscalationResult};
use crate::interaction::Interaction;
use crate::message::OutboundMessage;
use crate::platform::{InteractionResponse, PlatformError, SharedPlatform, UserId};
use crate::prompt::EscalationPromptBuilder;
use crate::report::ErrorReport;
use crate::router::ComponentHandler;
use crate::selection::EscalationSelection;
use crate::store::SharedReportStore;
use crate::ticket::TicketId;

/// Why a selection was dropped without delivering anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The interaction carried no selected value.
    MissingValue,
    /// The selected value is not an escalation selection.
    Undecodable,
    /// The ticket was never issued, already delivered, or is being
    /// delivered right now.
    UnknownTicket,
    /// No operator is configured; the ticket stays open.
    NoOperator,
}

/// Outcome of resolving one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Delivered { ticket: TicketId, anonymous: bool },
    Ignored(IgnoreReason),
}

pub struct EscalationResolver {
    platform: SharedPlatform,
    store: SharedReportStore,
    operator: Option<UserId>,
    delivery_timeout: Option<Duration>,
}

impl EscalationResolver {
    pub fn new(platform: SharedPlatform, store: SharedReportStore, operator: Option<UserId>) -> Self {
        Self {
            platform,
            store,
            operator,
            delivery_timeout: None,
        }
    }

    pub fn with_delivery_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Resolve the selection carried by `interaction`.
    ///
    /// Only a failed delivery is an error; the ticket is then still open and
    /// the user may select again.
    pub async fn resolve(&self, interaction: &Interaction) -> EscalationResult<Resolution> {
        let Some(raw) = interaction
            .component_values()
            .and_then(|values| values.first())
        else {
            warn!(interaction = %interaction.id, "escalation selection carried no value");
            return Ok(Resolution::Ignored(IgnoreReason::MissingValue));
        };

        let selection = match EscalationSelection::decode(raw) {
            Ok(selection) => selection,
            Err(e) => {
                warn!(interaction = %interaction.id, error = %e, "undecodable escalation selection");
                return Ok(Resolution::Ignored(IgnoreReason::Undecodable));
            }
        };
        let ticket = selection.ticket;

        let Some(report) = self.store.claim(&ticket) else {
            info!(ticket = %ticket, "selection for unknown or already handled ticket");
            return Ok(Resolution::Ignored(IgnoreReason::UnknownTicket));
        };

        let Some(operator) = self.operator.clone() else {
            warn!(ticket = %ticket, "selection received but no operator is configured");
            self.store.restore(report);
            return Ok(Resolution::Ignored(IgnoreReason::NoOperator));
        };

        if let Err(source) = self.deliver(&operator, &report, selection.anonymous).await {
            self.store.restore(report);
            return Err(EscalationError::Delivery { ticket, source });
        }
        info!(
            ticket = %ticket,
            anonymous = selection.anonymous,
            reported_at = %report.created_at(),
            "error report delivered"
        );

        self.confirm(interaction, &operator, selection.anonymous)
            .await;

        Ok(Resolution::Delivered {
            ticket,
            anonymous: selection.anonymous,
        })
    }

    /// Open the operator channel and send the report, bounded as a whole by
    /// the delivery timeout.
    ///
    /// A timeout can fire after the platform accepted the message, in which
    /// case a retry delivers the report a second time.
    async fn deliver(
        &self,
        operator: &UserId,
        report: &ErrorReport,
        anonymous: bool,
    ) -> Result<(), PlatformError> {
        let delivery = self.send_report(operator, report, anonymous);
        match self.delivery_timeout {
            Some(limit) => tokio::time::timeout(limit, delivery)
                .await
                .map_err(|_| PlatformError::Timeout(limit))?,
            None => delivery.await,
        }
    }

    async fn send_report(
        &self,
        operator: &UserId,
        report: &ErrorReport,
        anonymous: bool,
    ) -> Result<(), PlatformError> {
        let message = report.operator_message(anonymous);
        let channel = self.platform.open_direct_channel(operator).await?;
        debug!(ticket = %report.ticket(), channel = %channel, "operator channel opened");
        self.platform.send_channel_message(&channel, message).await
    }

    /// Swap the prompt for the disabled confirmation control.
    async fn confirm(&self, interaction: &Interaction, operator: &UserId, anonymous: bool) {
        let previous = interaction
            .message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let content = format!(
            "{previous}\nThanks for submitting an error report! {} has been notified of the problem.",
            operator.mention()
        );
        let message = OutboundMessage::new(content)
            .with_components(EscalationPromptBuilder::confirmation(anonymous))
            .allow_user_mentions(vec![operator.clone()]);

        if let Err(e) = self
            .platform
            .respond(interaction, InteractionResponse::UpdateMessage(message))
            .await
        {
            error!(
                interaction = %interaction.id,
                error = %e,
                "report delivered but prompt could not be updated"
            );
        }
    }
}

#[async_trait]
impl ComponentHandler for EscalationResolver {
    async fn handle(&self, interaction: &Interaction) -> anyhow::Result<()> {
        self.resolve(interaction).await?;
        Ok(())
    }
}

/// Resolver behind a shared reference, as registered on the router.
pub type SharedEscalationResolver = Arc<EscalationResolver>;
