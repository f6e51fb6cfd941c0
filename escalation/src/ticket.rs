//! Ticket identifiers for pending error reports

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one pending error report.
///
/// A random v4 UUID: unique with overwhelming probability for the life of
/// the process, so generation needs no coordination with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TicketId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Source of fresh ticket identifiers.
pub trait TicketIdGenerator: Send + Sync {
    fn next_id(&self) -> TicketId;
}

/// Shared reference to a ticket ID generator
pub type SharedTicketIdGenerator = Arc<dyn TicketIdGenerator>;

/// Default generator backed by `Uuid::new_v4`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTicketIds;

impl TicketIdGenerator for RandomTicketIds {
    fn next_id(&self) -> TicketId {
        TicketId(Uuid::new_v4())
    }
}
