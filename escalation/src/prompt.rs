//! Escalation prompt
//!
//! The interactive control shown next to a failure: a select menu with one
//! anonymous and one attributed option, both bound to the same ticket.
//! After delivery the menu is replaced by a disabled confirmation button.

use tracing::warn;

use crate::message::{Button, ButtonStyle, Component, SelectMenu, SelectOption};
use crate::platform::{SharedPlatform, UserId};
use crate::selection::{EscalationSelection, SelectionError};
use crate::ticket::TicketId;

/// Custom id the escalation select menu is routed by.
pub const SELECT_ERROR_REPORT: &str = "select_error_report";

/// Custom id of the confirmation button; nothing is registered for it.
pub const SUBMITTED_BUTTON_ID: &str = "no_handler";

/// Operator label used when no name can be resolved.
pub const FALLBACK_OPERATOR_NAME: &str = "the bot owner";

const PLACEHOLDER: &str = "Would you like to send an error report?";

pub struct EscalationPromptBuilder {
    platform: SharedPlatform,
    operator: Option<UserId>,
}

impl EscalationPromptBuilder {
    pub fn new(platform: SharedPlatform, operator: Option<UserId>) -> Self {
        Self { platform, operator }
    }

    /// Display name of the operator, or [`FALLBACK_OPERATOR_NAME`].
    pub async fn operator_name(&self) -> String {
        let Some(operator) = &self.operator else {
            return FALLBACK_OPERATOR_NAME.to_string();
        };
        match self.platform.resolve_user(operator).await {
            Ok(user) => user.display_name().to_string(),
            Err(e) => {
                warn!(operator = %operator, error = %e, "could not resolve operator name");
                FALLBACK_OPERATOR_NAME.to_string()
            }
        }
    }

    /// Build the two-option select menu for `ticket`.
    pub async fn build(&self, ticket: TicketId) -> Result<Vec<Component>, SelectionError> {
        let operator = self.operator_name().await;
        let anonymous = SelectOption {
            label: "Send Anonymous Error Report".to_string(),
            description: format!("Send an anonymous error report to {operator}."),
            value: EscalationSelection::new(ticket, true).encode()?,
            emoji: Some("📮".to_string()),
            default: false,
        };
        let attributed = SelectOption {
            label: "Send Error Report".to_string(),
            description: format!("Send an error report to {operator}."),
            value: EscalationSelection::new(ticket, false).encode()?,
            emoji: Some("🗳️".to_string()),
            default: false,
        };

        Ok(vec![Component::ActionRow(vec![Component::SelectMenu(
            SelectMenu {
                custom_id: SELECT_ERROR_REPORT.to_string(),
                placeholder: PLACEHOLDER.to_string(),
                options: vec![anonymous, attributed],
            },
        )])])
    }

    /// Disabled button that replaces the menu once the report is delivered.
    pub fn confirmation(anonymous: bool) -> Vec<Component> {
        let prefix = if anonymous { "Anonymous " } else { "" };
        vec![Component::ActionRow(vec![Component::Button(Button {
            custom_id: SUBMITTED_BUTTON_ID.to_string(),
            label: format!("{prefix}Error Report Submitted"),
            style: ButtonStyle::Secondary,
            disabled: true,
        })])]
    }
}
