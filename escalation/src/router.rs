//! Component routing table
//!
//! Maps component custom ids to their handlers. The table is filled once at
//! startup and only read afterwards, so it needs no locking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::interaction::Interaction;

/// Handles interactions from one kind of message component.
#[async_trait]
pub trait ComponentHandler: Send + Sync {
    async fn handle(&self, interaction: &Interaction) -> anyhow::Result<()>;
}

/// Routing errors
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("a handler is already registered for {key}")]
    Duplicate { key: String },

    #[error("no handler registered for component {0}")]
    UnknownComponent(String),

    #[error("interaction is not a message component")]
    NotAComponent,

    #[error("component {custom_id} handler failed: {error:#}")]
    Handler {
        custom_id: String,
        error: anyhow::Error,
    },
}

#[derive(Default)]
pub struct ComponentRouter {
    handlers: HashMap<String, Arc<dyn ComponentHandler>>,
}

impl ComponentRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `custom_id`.
    pub fn register(
        &mut self,
        custom_id: impl Into<String>,
        handler: Arc<dyn ComponentHandler>,
    ) -> Result<(), RouteError> {
        let key = custom_id.into();
        if self.handlers.contains_key(&key) {
            return Err(RouteError::Duplicate { key });
        }
        debug!(custom_id = %key, "component handler registered");
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn contains(&self, custom_id: &str) -> bool {
        self.handlers.contains_key(custom_id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler registered for the interaction's custom id.
    pub async fn dispatch(&self, interaction: &Interaction) -> Result<(), RouteError> {
        if !interaction.is_component() {
            return Err(RouteError::NotAComponent);
        }
        let custom_id = interaction.route_key();
        let handler = self
            .handlers
            .get(custom_id)
            .ok_or_else(|| RouteError::UnknownComponent(custom_id.to_string()))?;

        handler
            .handle(interaction)
            .await
            .map_err(|error| RouteError::Handler {
                custom_id: custom_id.to_string(),
                error,
            })
    }
}
