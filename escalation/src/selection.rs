//! Escalation selection payload
//!
//! The value carried through the platform's select-menu option and handed
//! back when the user picks it. Compact JSON:
//!
//! ```json
//! {"error-uuid":"4f0c…","anonymous":true}
//! ```
//!
//! `anonymous` is omitted when false and defaults to false when absent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::TicketId;

/// Longest option value the platform accepts.
pub const MAX_SELECTION_VALUE_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("malformed selection value: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("encoded selection is {len} characters, limit is 100")]
    TooLong { len: usize },
}

/// The user's choice for one ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationSelection {
    #[serde(rename = "error-uuid")]
    pub ticket: TicketId,
    #[serde(default, skip_serializing_if = "is_false")]
    pub anonymous: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl EscalationSelection {
    pub fn new(ticket: TicketId, anonymous: bool) -> Self {
        Self { ticket, anonymous }
    }

    pub fn encode(&self) -> Result<String, SelectionError> {
        let encoded = serde_json::to_string(self)?;
        let len = encoded.chars().count();
        if len > MAX_SELECTION_VALUE_LEN {
            return Err(SelectionError::TooLong { len });
        }
        Ok(encoded)
    }

    pub fn decode(raw: &str) -> Result<Self, SelectionError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{RandomTicketIds, TicketIdGenerator};

    #[test]
    fn test_attributed_selection_omits_flag() {
        let ticket = RandomTicketIds.next_id();
        let encoded = EscalationSelection::new(ticket, false).encode().unwrap();
        assert_eq!(encoded, format!(r#"{{"error-uuid":"{ticket}"}}"#));
        assert!(encoded.len() <= MAX_SELECTION_VALUE_LEN);
    }

    #[test]
    fn test_anonymous_selection_survives_transport() {
        let ticket = RandomTicketIds.next_id();
        let encoded = EscalationSelection::new(ticket, true).encode().unwrap();
        assert!(encoded.contains(r#""anonymous":true"#));

        let decoded = EscalationSelection::decode(&encoded).unwrap();
        assert_eq!(decoded.ticket, ticket);
        assert!(decoded.anonymous);
    }

    #[test]
    fn test_decode_missing_flag_defaults_to_attributed() {
        let raw = r#"{"error-uuid":"6f1b2c6e-6a1e-4d0b-9c61-3b8f7e0a2d11"}"#;
        let decoded = EscalationSelection::decode(raw).unwrap();
        assert!(!decoded.anonymous);
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        for raw in [
            "",
            "not json",
            r#"{"anonymous":true}"#,
            r#"{"error-uuid":"nope","anonymous":true}"#,
        ] {
            assert!(
                matches!(
                    EscalationSelection::decode(raw),
                    Err(SelectionError::Malformed(_))
                ),
                "expected malformed for {raw:?}"
            );
        }
    }
}
