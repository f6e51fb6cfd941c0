//! Gateway relay input
//!
//! Reads newline-delimited interaction objects (as forwarded by a gateway
//! relay) and dispatches each on its own task. Stops on EOF or Ctrl-C, then
//! waits for in-flight interactions to finish.

use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use escalation::{DispatchOutcome, InteractionDispatcher};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::discord::parse_interaction;

/// Counters for one relay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub dispatched: usize,
    pub skipped: usize,
    pub malformed: usize,
    pub failed: usize,
}

pub async fn run<R>(reader: R, dispatcher: Arc<InteractionDispatcher>) -> Result<RelayStats>
where
    R: AsyncBufRead + Unpin,
{
    run_until(reader, dispatcher, tokio::signal::ctrl_c()).await
}

/// Relay until EOF or until `shutdown` resolves with `Ok`.
///
/// If `shutdown` fails the relay keeps reading until EOF.
pub async fn run_until<R, S>(
    reader: R,
    dispatcher: Arc<InteractionDispatcher>,
    shutdown: S,
) -> Result<RelayStats>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = io::Result<()>>,
{
    let mut lines = reader.lines();
    let mut tasks = JoinSet::new();
    let mut stats = RelayStats::default();
    tokio::pin!(shutdown);
    let mut listening = true;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read relay input")?,
            signal = &mut shutdown, if listening => match signal {
                Ok(()) => {
                    info!("interrupt received, stopping relay");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "cannot listen for interrupts, relaying until input closes");
                    listening = false;
                    continue;
                }
            },
        };
        let Some(line) = line else {
            debug!("relay input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_interaction(&line) {
            Ok(Some(interaction)) => {
                stats.dispatched += 1;
                let dispatcher = Arc::clone(&dispatcher);
                tasks.spawn(async move { dispatcher.dispatch(interaction).await });
            }
            Ok(None) => {
                stats.skipped += 1;
                debug!("skipping unsupported interaction type");
            }
            Err(e) => {
                stats.malformed += 1;
                warn!(error = %format!("{e:#}"), "skipping malformed interaction");
            }
        }

        // Reap finished tasks so the set does not grow unbounded.
        while let Some(joined) = tasks.try_join_next() {
            record(&mut stats, joined);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        record(&mut stats, joined);
    }
    Ok(stats)
}

fn record(stats: &mut RelayStats, joined: Result<DispatchOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(DispatchOutcome::Handled) => {}
        Ok(outcome) => {
            stats.failed += 1;
            debug!(?outcome, "interaction did not complete normally");
        }
        Err(e) => {
            stats.failed += 1;
            error!(error = %e, "dispatch task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use escalation::{
        ChannelId, ChatPlatform, CommandContext, CommandFailure, CommandHandler, ComponentRouter,
        EscalationConfig, EscalationService, Interaction, InteractionResponse, OutboundMessage,
        PlatformError, PlatformUser, UserId,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct Responses(Mutex<Vec<InteractionResponse>>);

    #[async_trait]
    impl ChatPlatform for Responses {
        async fn respond(
            &self,
            _interaction: &Interaction,
            response: InteractionResponse,
        ) -> Result<(), PlatformError> {
            self.0.lock().unwrap().push(response);
            Ok(())
        }

        async fn delete_original_response(&self, _: &Interaction) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn create_followup(
            &self,
            _: &Interaction,
            _: OutboundMessage,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn open_direct_channel(&self, user: &UserId) -> Result<ChannelId, PlatformError> {
            Ok(ChannelId::new(user.as_str()))
        }

        async fn send_channel_message(
            &self,
            _: &ChannelId,
            _: OutboundMessage,
        ) -> Result<(), PlatformError> {
            Ok(())
        }

        async fn resolve_user(&self, user: &UserId) -> Result<PlatformUser, PlatformError> {
            Ok(PlatformUser {
                id: user.clone(),
                username: "owner".to_string(),
                global_name: None,
            })
        }
    }

    struct Pong;

    #[async_trait]
    impl CommandHandler for Pong {
        async fn run(&self, ctx: &CommandContext) -> Result<(), CommandFailure> {
            ctx.platform()
                .respond(
                    ctx.interaction(),
                    InteractionResponse::Message(OutboundMessage::new("pong")),
                )
                .await
                .map_err(|e| CommandFailure::upstream(e.to_string()))
        }
    }

    fn dispatcher(platform: &Arc<Responses>) -> Arc<InteractionDispatcher> {
        let service = EscalationService::new(platform.clone(), EscalationConfig::default());
        let mut router = ComponentRouter::new();
        service.register(&mut router).unwrap();
        let mut dispatcher =
            InteractionDispatcher::new(platform.clone(), service.interceptor(), router);
        dispatcher.register_command("ping", Arc::new(Pong)).unwrap();
        Arc::new(dispatcher)
    }

    fn command_line(id: &str, name: &str) -> String {
        format!(
            r#"{{"id":"{id}","application_id":"a","type":2,"token":"t","user":{{"id":"5","username":"u"}},"data":{{"name":"{name}"}}}}"#
        )
    }

    #[tokio::test]
    async fn test_relay_counts_lines() {
        let platform = Arc::new(Responses::default());
        let input = [
            command_line("1", "ping"),
            String::new(),
            r#"{"id":"2","application_id":"a","type":1,"token":"t"}"#.to_string(),
            "not json".to_string(),
            command_line("3", "missing"),
        ]
        .join("\n");

        let stats = run(input.as_bytes(), dispatcher(&platform)).await.unwrap();

        assert_eq!(
            stats,
            RelayStats {
                dispatched: 2,
                skipped: 1,
                malformed: 1,
                failed: 1,
            }
        );
        let responses = platform.0.lock().unwrap();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().any(|r| matches!(r,
            InteractionResponse::Message(m) if m.content == "interaction failed: missing")));
    }

    #[tokio::test]
    async fn test_failed_interrupt_listener_keeps_relaying() {
        let platform = Arc::new(Responses::default());
        let input = [command_line("1", "ping"), command_line("2", "ping")].join("\n");
        let shutdown = async { Err::<(), _>(io::Error::other("no signal handler")) };

        let stats = run_until(input.as_bytes(), dispatcher(&platform), shutdown)
            .await
            .unwrap();

        assert_eq!(stats.dispatched, 2);
        assert_eq!(stats.failed, 0);
        assert_eq!(platform.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_interrupt_stops_open_input() {
        let platform = Arc::new(Responses::default());
        // Keep the writer alive so the input never reaches EOF.
        let (_writer, reader) = tokio::io::duplex(64);

        let stats = run_until(
            tokio::io::BufReader::new(reader),
            dispatcher(&platform),
            async { Ok::<(), io::Error>(()) },
        )
        .await
        .unwrap();

        assert_eq!(stats, RelayStats::default());
    }

    #[tokio::test]
    async fn test_empty_input_stops_cleanly() {
        let platform = Arc::new(Responses::default());
        let stats = run(&b""[..], dispatcher(&platform)).await.unwrap();
        assert_eq!(stats, RelayStats::default());
    }
}
