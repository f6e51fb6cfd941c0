//! Deferred-interaction error escalation for the Kard chat bot.
//!
//! When a command handler fails, the bot can offer the invoking user a
//! one-time choice to forward the failure to the configured operator,
//! either attributed or anonymously. This crate provides:
//!
//! - [`PendingReportStore`]: concurrency-safe map of open tickets to reports
//! - [`TicketIdGenerator`]: random 128-bit ticket identifiers
//! - [`EscalationPromptBuilder`]: the two-option select menu bound to a ticket
//! - [`FailureInterceptor`]: entry points command handlers call on failure
//! - [`EscalationResolver`]: handles the user's selection and delivers the report
//! - [`ComponentRouter`] / [`InteractionDispatcher`]: startup-registered routing
//!
//! # Flow
//!
//! ```text
//! handler fails ──► FailureInterceptor::respond / follow_up
//!                     │ escalate && operator configured
//!                     ▼
//!                   ticket + report ──► PendingReportStore
//!                   prompt (select menu) ──► user
//!
//! user selects ──► ComponentRouter ──► EscalationResolver::resolve
//!                     │ claim ticket (atomic remove)
//!                     ▼
//!                   DM to operator ──► confirmation control
//! ```
//!
//! The chat platform itself is consumed through [`ChatPlatform`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod interaction;
pub mod interceptor;
pub mod message;
pub mod platform;
pub mod prompt;
pub mod report;
pub mod resolver;
pub mod router;
pub mod selection;
pub mod service;
pub mod store;
pub mod ticket;

pub use config::EscalationConfig;
pub use dispatch::{CommandContext, CommandHandler, DispatchOutcome, InteractionDispatcher};
pub use error::{CommandFailure, EscalationError, EscalationResult, FailureKind};
pub use interaction::{Interaction, InteractionData, InteractionMessage, InteractionUser};
pub use interceptor::{FailureInterceptor, SharedFailureInterceptor};
pub use message::{Button, ButtonStyle, Component, Embed, EmbedField, OutboundMessage, SelectMenu, SelectOption};
pub use platform::{
    ChannelId, ChatPlatform, InteractionResponse, PlatformError, PlatformUser, SharedPlatform,
    UserId,
};
pub use prompt::{EscalationPromptBuilder, SELECT_ERROR_REPORT};
pub use report::{Author, CommandPayload, ErrorReport, FailureDescription, RequestSnapshot};
pub use resolver::{EscalationResolver, IgnoreReason, Resolution, SharedEscalationResolver};
pub use router::{ComponentHandler, ComponentRouter, RouteError};
pub use selection::{EscalationSelection, SelectionError};
pub use service::EscalationService;
pub use store::{PendingReportStore, SharedReportStore};
pub use ticket::{RandomTicketIds, SharedTicketIdGenerator, TicketId, TicketIdGenerator};
