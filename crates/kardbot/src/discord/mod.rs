//! Discord REST client implementing [`ChatPlatform`].
//!
//! Every call is a single attempt. Non-success statuses surface as
//! [`PlatformError::Api`] with the response body clipped for logging.

mod payload;

pub use payload::parse_interaction;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use escalation::{
    ChannelId, ChatPlatform, Interaction, InteractionResponse, OutboundMessage, PlatformError,
    PlatformUser, UserId,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use payload::{callback_json, message_json, RawChannel, RawUser};

const ERROR_BODY_LIMIT: usize = 800;

#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    api_base: String,
    request_timeout: Duration,
}

impl DiscordClient {
    pub fn new(api_base: &str, token: &str, request_timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(concat!(
                "DiscordBot (kardbot, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            )),
        );
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bot {}", token.trim()))
            .context("bot token is not a valid header value")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .context("failed to create discord api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn send(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PlatformError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            debug!(operation, status = status.as_u16(), "discord call succeeded");
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::Api {
            status: status.as_u16(),
            body: truncate_for_error(&body, ERROR_BODY_LIMIT),
        })
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PlatformError> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Decode(format!("{operation}: {e}")))
    }

    fn transport_error(&self, error: reqwest::Error) -> PlatformError {
        if error.is_timeout() {
            PlatformError::Timeout(self.request_timeout)
        } else {
            PlatformError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/interactions/{}/{}/callback",
            interaction.id, interaction.token
        ));
        self.send(
            "interaction callback",
            self.http.post(url).json(&callback_json(&response)),
        )
        .await?;
        Ok(())
    }

    async fn delete_original_response(&self, interaction: &Interaction) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/webhooks/{}/{}/messages/@original",
            interaction.application_id, interaction.token
        ));
        self.send("delete original response", self.http.delete(url))
            .await?;
        Ok(())
    }

    async fn create_followup(
        &self,
        interaction: &Interaction,
        message: OutboundMessage,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!(
            "/webhooks/{}/{}",
            interaction.application_id, interaction.token
        ));
        self.send(
            "create followup",
            self.http.post(url).json(&message_json(&message)),
        )
        .await?;
        Ok(())
    }

    async fn open_direct_channel(&self, user: &UserId) -> Result<ChannelId, PlatformError> {
        let channel: RawChannel = self
            .request_json(
                "open dm channel",
                self.http
                    .post(self.url("/users/@me/channels"))
                    .json(&json!({ "recipient_id": user.as_str() })),
            )
            .await?;
        Ok(ChannelId::new(channel.id))
    }

    async fn send_channel_message(
        &self,
        channel: &ChannelId,
        message: OutboundMessage,
    ) -> Result<(), PlatformError> {
        let url = self.url(&format!("/channels/{channel}/messages"));
        let _: Value = self
            .request_json(
                "create message",
                self.http.post(url).json(&message_json(&message)),
            )
            .await?;
        Ok(())
    }

    async fn resolve_user(&self, user: &UserId) -> Result<PlatformUser, PlatformError> {
        let raw: RawUser = self
            .request_json("get user", self.http.get(self.url(&format!("/users/{user}"))))
            .await?;
        Ok(PlatformUser::from(raw))
    }
}

fn truncate_for_error(body: &str, max: usize) -> String {
    if body.chars().count() <= max {
        return body.to_string();
    }
    let clipped: String = body.chars().take(max).collect();
    format!("{clipped}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_error() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdef", 3), "abc...");
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let client =
            DiscordClient::new("https://discord.com/api/v10/", "token", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.url("/users/@me/channels"),
            "https://discord.com/api/v10/users/@me/channels"
        );
    }

    #[test]
    fn test_token_with_newline_is_rejected() {
        assert!(DiscordClient::new("https://x", "bad\ntoken", Duration::from_secs(1)).is_err());
    }
}
