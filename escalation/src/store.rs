//! Pending report store
//!
//! Concurrency-safe map of open tickets to their reports. Every operation
//! touches a single key and is atomic with respect to all others, so
//! callers never lock anything themselves. There is no ordering guarantee
//! across distinct keys.
//!
//! The store lives exactly as long as the service instance that owns it.
//! Nothing is persisted: a restart forgets every open ticket, and a ticket
//! nobody selects stays here until then.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::report::ErrorReport;
use crate::ticket::TicketId;

/// Shared reference to a PendingReportStore
pub type SharedReportStore = Arc<PendingReportStore>;

#[derive(Debug, Default)]
pub struct PendingReportStore {
    reports: DashMap<TicketId, Arc<ErrorReport>>,
}

impl PendingReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedReportStore {
        Arc::new(self)
    }

    /// Insert or overwrite the report for `ticket`.
    pub fn put(&self, ticket: TicketId, report: ErrorReport) {
        self.reports.insert(ticket, Arc::new(report));
        debug!(ticket = %ticket, pending = self.reports.len(), "error report stored");
    }

    /// Look up a report without removing it.
    pub fn get(&self, ticket: &TicketId) -> Option<Arc<ErrorReport>> {
        // Clone out of the shard guard: callers hold reports across awaits.
        self.reports.get(ticket).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a report. Removing an absent ticket is a no-op.
    pub fn remove(&self, ticket: &TicketId) {
        self.reports.remove(ticket);
    }

    /// Atomically remove and return a report.
    ///
    /// Of any number of concurrent claims for the same ticket, exactly one
    /// gets `Some`.
    pub fn claim(&self, ticket: &TicketId) -> Option<Arc<ErrorReport>> {
        self.reports.remove(ticket).map(|(_, report)| report)
    }

    /// Put a previously claimed report back under its own ticket.
    pub fn restore(&self, report: Arc<ErrorReport>) {
        let ticket = report.ticket();
        self.reports.insert(ticket, report);
        debug!(ticket = %ticket, "error report restored");
    }

    pub fn contains(&self, ticket: &TicketId) -> bool {
        self.reports.contains_key(ticket)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Interaction, InteractionData, InteractionUser};
    use crate::platform::UserId;
    use crate::report::{FailureDescription, RequestSnapshot};
    use crate::ticket::{RandomTicketIds, TicketIdGenerator};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report(ticket: TicketId) -> ErrorReport {
        let interaction = Interaction {
            id: "1".to_string(),
            application_id: "app".to_string(),
            token: "tok".to_string(),
            guild_id: None,
            channel_id: None,
            member: None,
            user: Some(InteractionUser {
                id: UserId::new("7"),
                username: "seven".to_string(),
            }),
            message: None,
            data: InteractionData::ApplicationCommand {
                name: "uwu".to_string(),
                options: serde_json::Value::Null,
            },
        };
        ErrorReport::new(
            ticket,
            RequestSnapshot::capture(&interaction).unwrap(),
            FailureDescription {
                message: "boom".to_string(),
                location: "src/uwu.rs:1".to_string(),
            },
        )
    }

    #[test]
    fn test_put_then_get() {
        let store = PendingReportStore::new();
        let ticket = RandomTicketIds.next_id();
        let r = report(ticket);
        store.put(ticket, r.clone());

        let found = store.get(&ticket).expect("report should be present");
        assert_eq!(*found, r);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let store = PendingReportStore::new();
        let ticket = RandomTicketIds.next_id();
        store.put(ticket, report(ticket));
        store.put(ticket, report(ticket));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_present_and_absent() {
        let store = PendingReportStore::new();
        let present = RandomTicketIds.next_id();
        let absent = RandomTicketIds.next_id();
        store.put(present, report(present));

        store.remove(&present);
        store.remove(&absent);
        store.remove(&present);

        assert!(store.get(&present).is_none());
        assert!(store.get(&absent).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_claim_then_restore() {
        let store = PendingReportStore::new();
        let ticket = RandomTicketIds.next_id();
        store.put(ticket, report(ticket));

        let claimed = store.claim(&ticket).unwrap();
        assert!(!store.contains(&ticket));
        assert!(store.claim(&ticket).is_none());

        store.restore(claimed);
        assert!(store.contains(&ticket));
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        for _ in 0..50 {
            let store = PendingReportStore::new();
            let ticket = RandomTicketIds.next_id();
            store.put(ticket, report(ticket));
            let winners = AtomicUsize::new(0);

            std::thread::scope(|s| {
                for _ in 0..8 {
                    s.spawn(|| {
                        if store.claim(&ticket).is_some() {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
            });

            assert_eq!(winners.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_distinct_tickets_do_not_interfere() {
        let store = PendingReportStore::new();
        let tickets: Vec<TicketId> = (0..64).map(|_| RandomTicketIds.next_id()).collect();

        std::thread::scope(|s| {
            for ticket in &tickets {
                let store = &store;
                s.spawn(move || {
                    store.put(*ticket, report(*ticket));
                    assert!(store.get(ticket).is_some());
                    assert!(store.claim(ticket).is_some());
                    assert!(store.get(ticket).is_none());
                });
            }
        });

        assert!(store.is_empty());
    }
}
