//! Discord JSON mapping.
//!
//! Inbound: raw interaction objects into [`Interaction`]. Outbound: messages,
//! components and interaction callbacks into API request bodies.

use anyhow::{Context, Result};
use escalation::{
    ButtonStyle, ChannelId, Component, Embed, Interaction, InteractionData, InteractionMessage,
    InteractionResponse, InteractionUser, OutboundMessage, PlatformUser, UserId,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

const INTERACTION_APPLICATION_COMMAND: u8 = 2;
const INTERACTION_MESSAGE_COMPONENT: u8 = 3;

const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
const CALLBACK_DEFERRED_CHANNEL_MESSAGE: u8 = 5;
const CALLBACK_UPDATE_MESSAGE: u8 = 7;

const FLAG_EPHEMERAL: u64 = 1 << 6;

const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;
const COMPONENT_STRING_SELECT: u8 = 3;

#[derive(Debug, Deserialize)]
struct RawInteraction {
    id: String,
    application_id: String,
    #[serde(rename = "type")]
    kind: u8,
    token: String,
    guild_id: Option<String>,
    channel_id: Option<String>,
    member: Option<RawMember>,
    user: Option<RawUser>,
    message: Option<RawMessage>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawUser {
    id: String,
    username: String,
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct RawCommandData {
    name: String,
    #[serde(default)]
    options: Value,
}

#[derive(Debug, Deserialize)]
struct RawComponentData {
    custom_id: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawChannel {
    pub(super) id: String,
}

impl From<RawUser> for InteractionUser {
    fn from(user: RawUser) -> Self {
        Self {
            id: UserId::new(user.id),
            username: user.username,
        }
    }
}

impl From<RawUser> for PlatformUser {
    fn from(user: RawUser) -> Self {
        Self {
            id: UserId::new(user.id),
            username: user.username,
            global_name: user.global_name,
        }
    }
}

/// Parse one interaction object.
///
/// Returns `Ok(None)` for interaction types the bot does not handle (pings,
/// autocomplete, modal submits).
pub fn parse_interaction(raw: &str) -> Result<Option<Interaction>> {
    let raw: RawInteraction = serde_json::from_str(raw).context("invalid interaction json")?;

    let data = match raw.kind {
        INTERACTION_APPLICATION_COMMAND => {
            let data: RawCommandData =
                serde_json::from_value(raw.data).context("invalid application command data")?;
            InteractionData::ApplicationCommand {
                name: data.name,
                options: data.options,
            }
        }
        INTERACTION_MESSAGE_COMPONENT => {
            let data: RawComponentData =
                serde_json::from_value(raw.data).context("invalid message component data")?;
            InteractionData::MessageComponent {
                custom_id: data.custom_id,
                values: data.values,
            }
        }
        _ => return Ok(None),
    };

    Ok(Some(Interaction {
        id: raw.id,
        application_id: raw.application_id,
        token: raw.token,
        guild_id: raw.guild_id,
        channel_id: raw.channel_id.map(ChannelId::new),
        member: raw.member.and_then(|m| m.user).map(InteractionUser::from),
        user: raw.user.map(InteractionUser::from),
        message: raw.message.map(|m| InteractionMessage {
            id: m.id,
            content: m.content,
        }),
        data,
    }))
}

/// Request body for `POST /interactions/{id}/{token}/callback`.
pub fn callback_json(response: &InteractionResponse) -> Value {
    match response {
        InteractionResponse::Message(message) => json!({
            "type": CALLBACK_CHANNEL_MESSAGE,
            "data": message_json(message),
        }),
        InteractionResponse::Deferred { ephemeral } => {
            let mut data = Map::new();
            if *ephemeral {
                data.insert("flags".into(), json!(FLAG_EPHEMERAL));
            }
            json!({
                "type": CALLBACK_DEFERRED_CHANNEL_MESSAGE,
                "data": data,
            })
        }
        InteractionResponse::UpdateMessage(message) => json!({
            "type": CALLBACK_UPDATE_MESSAGE,
            "data": message_json(message),
        }),
    }
}

/// Message body shared by callbacks, follow-ups and channel messages.
pub fn message_json(message: &OutboundMessage) -> Value {
    let mut body = Map::new();
    body.insert("content".into(), json!(message.content));
    if message.ephemeral {
        body.insert("flags".into(), json!(FLAG_EPHEMERAL));
    }
    // Always sent so an update replaces the previous controls.
    body.insert(
        "components".into(),
        Value::Array(message.components.iter().map(component_json).collect()),
    );
    if !message.embeds.is_empty() {
        body.insert(
            "embeds".into(),
            Value::Array(message.embeds.iter().map(embed_json).collect()),
        );
    }
    if let Some(users) = &message.allowed_user_mentions {
        body.insert(
            "allowed_mentions".into(),
            json!({
                "parse": [],
                "users": users.iter().map(UserId::as_str).collect::<Vec<_>>(),
            }),
        );
    }
    Value::Object(body)
}

fn component_json(component: &Component) -> Value {
    match component {
        Component::ActionRow(children) => json!({
            "type": COMPONENT_ACTION_ROW,
            "components": children.iter().map(component_json).collect::<Vec<_>>(),
        }),
        Component::Button(button) => json!({
            "type": COMPONENT_BUTTON,
            "style": button_style(button.style),
            "label": button.label,
            "custom_id": button.custom_id,
            "disabled": button.disabled,
        }),
        Component::SelectMenu(menu) => json!({
            "type": COMPONENT_STRING_SELECT,
            "custom_id": menu.custom_id,
            "placeholder": menu.placeholder,
            "options": menu.options.iter().map(|option| {
                let mut value = json!({
                    "label": option.label,
                    "description": option.description,
                    "value": option.value,
                    "default": option.default,
                });
                if let Some(emoji) = &option.emoji {
                    value["emoji"] = json!({ "name": emoji });
                }
                value
            }).collect::<Vec<_>>(),
        }),
    }
}

fn button_style(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

fn embed_json(embed: &Embed) -> Value {
    let mut body = Map::new();
    if let Some(title) = &embed.title {
        body.insert("title".into(), json!(title));
    }
    body.insert(
        "fields".into(),
        Value::Array(
            embed
                .fields
                .iter()
                .map(|f| json!({ "name": f.name, "value": f.value, "inline": f.inline }))
                .collect(),
        ),
    );
    Value::Object(body)
}
