//! Escalation service
//!
//! Wires the store, ticket generator, interceptor and resolver of one bot
//! instance together. Everything shares the same store; nothing here is
//! global, so independent instances (tests, multiple bots) never see each
//! other's tickets.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::EscalationConfig;
use crate::interceptor::{FailureInterceptor, SharedFailureInterceptor};
use crate::platform::SharedPlatform;
use crate::prompt::SELECT_ERROR_REPORT;
use crate::resolver::{EscalationResolver, SharedEscalationResolver};
use crate::router::{ComponentRouter, RouteError};
use crate::store::{PendingReportStore, SharedReportStore};
use crate::ticket::{RandomTicketIds, SharedTicketIdGenerator};

pub struct EscalationService {
    store: SharedReportStore,
    interceptor: SharedFailureInterceptor,
    resolver: SharedEscalationResolver,
}

impl EscalationService {
    pub fn new(platform: SharedPlatform, config: EscalationConfig) -> Self {
        Self::with_ids(platform, config, Arc::new(RandomTicketIds))
    }

    /// Like [`EscalationService::new`] with a custom ticket generator.
    pub fn with_ids(
        platform: SharedPlatform,
        config: EscalationConfig,
        ids: SharedTicketIdGenerator,
    ) -> Self {
        match &config.operator {
            Some(operator) => info!(operator = %operator, "error report escalation enabled"),
            None => warn!("no operator configured, error reports cannot be escalated"),
        }

        let store = PendingReportStore::new().shared();
        let interceptor = FailureInterceptor::new(
            platform.clone(),
            store.clone(),
            ids,
            config.operator.clone(),
        )
        .shared();
        let resolver = Arc::new(
            EscalationResolver::new(platform, store.clone(), config.operator)
                .with_delivery_timeout(config.delivery_timeout),
        );

        Self {
            store,
            interceptor,
            resolver,
        }
    }

    pub fn store(&self) -> &SharedReportStore {
        &self.store
    }

    pub fn interceptor(&self) -> SharedFailureInterceptor {
        Arc::clone(&self.interceptor)
    }

    pub fn resolver(&self) -> SharedEscalationResolver {
        Arc::clone(&self.resolver)
    }

    /// Register the resolver for the escalation select menu.
    pub fn register(&self, router: &mut ComponentRouter) -> Result<(), RouteError> {
        router.register(SELECT_ERROR_REPORT, self.resolver())
    }
}
