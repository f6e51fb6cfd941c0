//! Error types for the escalation subsystem
//!
//! Two families live here:
//! - [`CommandFailure`]: what a command handler hands to the interceptor.
//!   Its [`FailureKind`] decides whether an escalation prompt is offered.
//! - [`EscalationError`]: failures of the subsystem itself. Only delivery
//!   failures ever reach the resolver's caller; everything else is logged.

use std::fmt;
use std::panic::Location;

use thiserror::Error;

use crate::platform::PlatformError;
use crate::ticket::TicketId;

/// Shown to the user when a failure carries no text of its own.
pub const GENERIC_ERROR_TEXT: &str = "an error occurred. :'(";

/// Result type for escalation operations
pub type EscalationResult<T> = Result<T, EscalationError>;

/// Classification of a command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Bug or unexpected state inside the bot.
    Internal,
    /// An external API the command proxies to failed.
    Upstream,
    /// A dependency is temporarily unavailable (rate limit, maintenance).
    Unavailable,
    /// The user supplied arguments the command cannot work with.
    InvalidInput,
    /// The request was refused by a content or usage policy.
    PolicyViolation,
    /// Anything not classified by the handler.
    Unknown,
}

impl FailureKind {
    /// Whether the operator would want to hear about this failure.
    ///
    /// User-facing failures (bad input, policy refusals, temporary
    /// unavailability) are shown as plain errors.
    pub fn requires_escalation(self) -> bool {
        matches!(self, Self::Internal | Self::Upstream | Self::Unknown)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Upstream => write!(f, "upstream"),
            Self::Unavailable => write!(f, "unavailable"),
            Self::InvalidInput => write!(f, "invalid_input"),
            Self::PolicyViolation => write!(f, "policy_violation"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A failure raised by a command handler.
///
/// Constructors are `#[track_caller]`, so the recorded location is the
/// handler line that built the failure, not this module.
#[derive(Debug, Clone)]
pub struct CommandFailure {
    kind: FailureKind,
    message: String,
    location: &'static Location<'static>,
}

impl CommandFailure {
    #[track_caller]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    #[track_caller]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Upstream, message)
    }

    #[track_caller]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable, message)
    }

    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    #[track_caller]
    pub fn policy_violation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::PolicyViolation, message)
    }

    /// Wrap any error, keeping its `Display` text as the failure message.
    #[track_caller]
    pub fn from_error<E>(kind: FailureKind, error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Self::new(kind, error.to_string())
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn requires_escalation(&self) -> bool {
        self.kind.requires_escalation()
    }

    /// The raw message, possibly empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text to show the user; falls back to [`GENERIC_ERROR_TEXT`].
    pub fn user_text(&self) -> &str {
        if self.message.trim().is_empty() {
            GENERIC_ERROR_TEXT
        } else {
            &self.message
        }
    }

    /// `file:line` of the code that raised the failure.
    pub fn location(&self) -> String {
        format!("{}:{}", self.location.file(), self.location.line())
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_text())
    }
}

impl std::error::Error for CommandFailure {}

/// Errors produced by the escalation subsystem itself
#[derive(Debug, Error)]
pub enum EscalationError {
    /// The interaction has neither a guild member nor a user attached.
    #[error("interaction {interaction_id} has no member or user attached")]
    MissingAuthor { interaction_id: String },

    /// The report could not be handed to the operator.
    #[error("failed to deliver error report {ticket} to the operator: {source}")]
    Delivery {
        ticket: TicketId,
        #[source]
        source: PlatformError,
    },
}
