use anyhow::{bail, Context, Result};
use escalation::EscalationConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const TOKEN_VAR: &str = "KARDBOT_TOKEN";
pub const APP_ID_VAR: &str = "KARDBOT_APP_ID";
pub const OWNER_ID_VAR: &str = "KARDBOT_OWNER_ID";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Contents of `config/setup.json`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SetupFile {
    default_log_level: Option<String>,
    api_base: Option<String>,
    request_timeout_ms: Option<u64>,
    delivery_timeout_ms: Option<u64>,
}

/// Runtime configuration of the bot.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub application_id: String,
    /// Operator receiving error reports; `None` disables escalation.
    pub owner_id: Option<String>,
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub delivery_timeout: Option<Duration>,
}

impl BotConfig {
    /// Load the setup file (a missing file means defaults) and the
    /// `KARDBOT_*` environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let setup = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SetupFile::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        Self::from_sources(setup, |key| std::env::var(key).ok())
    }

    fn from_sources(setup: SetupFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let token = var(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} must be set"))?;
        let application_id = var(APP_ID_VAR).with_context(|| format!("{APP_ID_VAR} must be set"))?;
        let owner_id = var(OWNER_ID_VAR);

        if owner_id.as_deref() == Some(application_id.as_str()) {
            bail!("{OWNER_ID_VAR} must not be the bot's own application id");
        }

        Ok(Self {
            token,
            application_id,
            owner_id,
            log_level: setup
                .default_log_level
                .filter(|level| !level.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            api_base: setup.api_base.unwrap_or_else(|| DEFAULT_API_BASE.into()),
            request_timeout: Duration::from_millis(
                setup.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ),
            delivery_timeout: setup.delivery_timeout_ms.map(Duration::from_millis),
        })
    }

    pub fn escalation(&self) -> EscalationConfig {
        EscalationConfig::from_operator_id(self.owner_id.as_deref())
            .with_delivery_timeout(self.delivery_timeout)
    }
}
