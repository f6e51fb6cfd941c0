mod config;
mod discord;
mod relay;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use config::BotConfig;
use discord::DiscordClient;
use escalation::{ComponentRouter, EscalationService, InteractionDispatcher, SharedPlatform};
use tokio::io::BufReader;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the setup file
    #[arg(long, default_value = "config/setup.json")]
    config: PathBuf,

    /// Log filter used when RUST_LOG is unset (overrides default-log-level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = BotConfig::load(&args.config)?;
    let level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()),
        )
        .init();

    info!(
        application = %config.application_id,
        api = %config.api_base,
        "kardbot starting"
    );

    let platform: SharedPlatform = Arc::new(DiscordClient::new(
        &config.api_base,
        &config.token,
        config.request_timeout,
    )?);
    let service = EscalationService::new(platform.clone(), config.escalation());

    let mut router = ComponentRouter::new();
    service
        .register(&mut router)
        .context("failed to register escalation handler")?;
    // Command handlers live outside this crate; until they are registered
    // every command is answered as an unknown interaction.
    let dispatcher = Arc::new(InteractionDispatcher::new(
        platform,
        service.interceptor(),
        router,
    ));

    let stats = relay::run(BufReader::new(tokio::io::stdin()), dispatcher).await?;
    info!(
        dispatched = stats.dispatched,
        skipped = stats.skipped,
        malformed = stats.malformed,
        failed = stats.failed,
        pending_reports = service.store().len(),
        "kardbot stopped"
    );

    Ok(())
}
