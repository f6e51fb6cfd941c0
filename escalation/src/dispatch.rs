//! Interaction dispatcher
//!
//! Routes inbound interactions to command or component handlers and turns
//! every way a handler can fail into a user-visible response:
//!
//! - a returned [`CommandFailure`] goes to the interceptor, escalating when
//!   its kind asks for it
//! - a panic is reported as an internal failure; the process keeps running
//! - an interaction nobody registered for is answered with an escalating
//!   `interaction failed: <name>`
//!
//! Handlers run on their own tokio task so a panic unwinds only that task.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::error::CommandFailure;
use crate::interaction::{Interaction, InteractionData};
use crate::interceptor::SharedFailureInterceptor;
use crate::platform::{InteractionResponse, PlatformError, SharedPlatform};
use crate::router::{ComponentRouter, RouteError};

/// A slash command implementation.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: &CommandContext) -> Result<(), CommandFailure>;
}

/// Per-interaction state handed to a [`CommandHandler`].
pub struct CommandContext {
    interaction: Interaction,
    platform: SharedPlatform,
    deferred: AtomicBool,
}

impl CommandContext {
    pub fn new(interaction: Interaction, platform: SharedPlatform) -> Self {
        Self {
            interaction,
            platform,
            deferred: AtomicBool::new(false),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn platform(&self) -> &SharedPlatform {
        &self.platform
    }

    /// Acknowledge the interaction with a placeholder.
    ///
    /// Failures after this point are reported as follow-ups. Only the first
    /// of any number of calls, concurrent or not, sends the placeholder.
    pub async fn defer(&self, ephemeral: bool) -> Result<(), PlatformError> {
        if self
            .deferred
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        let sent = self
            .platform
            .respond(&self.interaction, InteractionResponse::Deferred { ephemeral })
            .await;
        if sent.is_err() {
            self.deferred.store(false, Ordering::Release);
        }
        sent
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::Acquire)
    }
}

/// How one dispatched interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// The handler returned an error; it has been reported.
    Failed,
    /// The handler panicked; it has been reported as an internal failure.
    Panicked,
    /// No handler is registered for the interaction.
    Unrouted,
}

pub struct InteractionDispatcher {
    commands: HashMap<String, Arc<dyn CommandHandler>>,
    components: Arc<ComponentRouter>,
    interceptor: SharedFailureInterceptor,
    platform: SharedPlatform,
}

impl InteractionDispatcher {
    pub fn new(
        platform: SharedPlatform,
        interceptor: SharedFailureInterceptor,
        components: ComponentRouter,
    ) -> Self {
        Self {
            commands: HashMap::new(),
            components: Arc::new(components),
            interceptor,
            platform,
        }
    }

    pub fn register_command(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RouteError> {
        let key = name.into();
        if self.commands.contains_key(&key) {
            return Err(RouteError::Duplicate { key });
        }
        debug!(command = %key, "command handler registered");
        self.commands.insert(key, handler);
        Ok(())
    }

    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        match &interaction.data {
            InteractionData::ApplicationCommand { .. } => self.run_command(interaction).await,
            InteractionData::MessageComponent { .. } => self.run_component(interaction).await,
        }
    }

    async fn run_command(&self, interaction: Interaction) -> DispatchOutcome {
        let name = interaction.route_key().to_string();
        let Some(handler) = self.commands.get(&name).cloned() else {
            return self.unrouted(&interaction, &name).await;
        };

        let ctx = Arc::new(CommandContext::new(interaction, self.platform.clone()));
        let task_ctx = Arc::clone(&ctx);
        let joined = tokio::spawn(async move { handler.run(&task_ctx).await }).await;

        let (failure, outcome) = match joined {
            Ok(Ok(())) => return DispatchOutcome::Handled,
            Ok(Err(failure)) => (failure, DispatchOutcome::Failed),
            Err(e) if e.is_panic() => {
                let reason = panic_message(e.into_panic());
                error!(command = %name, panic = %reason, "command handler panicked");
                (
                    CommandFailure::internal(format!("command {name} panicked: {reason}")),
                    DispatchOutcome::Panicked,
                )
            }
            Err(e) => {
                warn!(command = %name, error = %e, "command handler was cancelled");
                return DispatchOutcome::Failed;
            }
        };

        let escalate = failure.requires_escalation();
        if ctx.is_deferred() {
            self.interceptor
                .follow_up(ctx.interaction(), &failure, escalate)
                .await;
        } else {
            self.interceptor
                .respond(ctx.interaction(), &failure, escalate)
                .await;
        }
        outcome
    }

    async fn run_component(&self, interaction: Interaction) -> DispatchOutcome {
        let custom_id = interaction.route_key().to_string();
        if !self.components.contains(&custom_id) {
            return self.unrouted(&interaction, &custom_id).await;
        }

        let router = Arc::clone(&self.components);
        let task_interaction = interaction.clone();
        let joined = tokio::spawn(async move { router.dispatch(&task_interaction).await }).await;

        match joined {
            Ok(Ok(())) => DispatchOutcome::Handled,
            Ok(Err(RouteError::UnknownComponent(_))) => {
                self.unrouted(&interaction, &custom_id).await
            }
            Ok(Err(e)) => {
                error!(custom_id = %custom_id, error = %e, "component handler failed");
                DispatchOutcome::Failed
            }
            Err(e) if e.is_panic() => {
                let reason = panic_message(e.into_panic());
                error!(custom_id = %custom_id, panic = %reason, "component handler panicked");
                let failure =
                    CommandFailure::internal(format!("component {custom_id} panicked: {reason}"));
                self.interceptor.respond(&interaction, &failure, true).await;
                DispatchOutcome::Panicked
            }
            Err(e) => {
                warn!(custom_id = %custom_id, error = %e, "component handler was cancelled");
                DispatchOutcome::Failed
            }
        }
    }

    async fn unrouted(&self, interaction: &Interaction, name: &str) -> DispatchOutcome {
        warn!(route = %name, "no handler registered for interaction");
        let failure = CommandFailure::internal(format!("interaction failed: {name}"));
        self.interceptor.respond(interaction, &failure, true).await;
        DispatchOutcome::Unrouted
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::InteractionUser;
    use crate::platform::MockChatPlatform;

    fn interaction() -> Interaction {
        Interaction {
            id: "1".to_string(),
            application_id: "app".to_string(),
            token: "tok".to_string(),
            guild_id: None,
            channel_id: None,
            member: None,
            user: Some(InteractionUser {
                id: crate::platform::UserId::new("5"),
                username: "u".to_string(),
            }),
            message: None,
            data: InteractionData::ApplicationCommand {
                name: "dalle".to_string(),
                options: serde_json::Value::Null,
            },
        }
    }

    #[tokio::test]
    async fn test_failed_defer_can_be_retried() {
        let mut platform = MockChatPlatform::new();
        let mut seq = mockall::Sequence::new();
        platform
            .expect_respond()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(PlatformError::Transport("reset".to_string())));
        platform
            .expect_respond()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        let ctx = CommandContext::new(interaction(), Arc::new(platform));

        assert!(ctx.defer(true).await.is_err());
        assert!(!ctx.is_deferred());
        ctx.defer(true).await.unwrap();
        assert!(ctx.is_deferred());
        ctx.defer(true).await.unwrap();
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static str")), "static str");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
    }
}
