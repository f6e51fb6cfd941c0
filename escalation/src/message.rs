//! Outbound message model: content, interactive components and embeds.
//!
//! Platform-neutral; the platform client maps these onto its own wire
//! format.

use crate::platform::UserId;

pub const EMBED_TITLE_LIMIT: usize = 256;
pub const EMBED_FIELD_NAME_LIMIT: usize = 256;
pub const EMBED_FIELD_VALUE_LIMIT: usize = 1024;
pub const EMBED_FIELD_COUNT_LIMIT: usize = 25;
pub const EMBED_TOTAL_LIMIT: usize = 6000;

/// A message the bot sends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutboundMessage {
    pub content: String,
    /// Visible only to the invoking user.
    pub ephemeral: bool,
    pub components: Vec<Component>,
    pub embeds: Vec<Embed>,
    /// `None` leaves mention parsing to the platform default; `Some` restricts
    /// pings to exactly these users.
    pub allowed_user_mentions: Option<Vec<UserId>>,
}

impl OutboundMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            ephemeral: true,
            ..Self::new(content)
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn allow_user_mentions(mut self, users: Vec<UserId>) -> Self {
        self.allowed_user_mentions = Some(users);
        self
    }

    /// Values of every select option in this message, in order.
    pub fn select_option_values(&self) -> Vec<&str> {
        let mut values = Vec::new();
        for component in &self.components {
            component.collect_option_values(&mut values);
        }
        values
    }
}

/// Interactive message component.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    ActionRow(Vec<Component>),
    SelectMenu(SelectMenu),
    Button(Button),
}

impl Component {
    fn collect_option_values<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::ActionRow(children) => {
                for child in children {
                    child.collect_option_values(out);
                }
            }
            Self::SelectMenu(menu) => {
                out.extend(menu.options.iter().map(|option| option.value.as_str()));
            }
            Self::Button(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectMenu {
    pub custom_id: String,
    pub placeholder: String,
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub description: String,
    /// Opaque value returned to the bot when the option is chosen.
    pub value: String,
    pub emoji: Option<String>,
    pub default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

/// Rich embed with a title and named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embed {
    pub title: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    /// Total characters counted against [`EMBED_TOTAL_LIMIT`].
    pub fn char_count(&self) -> usize {
        let title = self.title.as_deref().map_or(0, |t| t.chars().count());
        title
            + self
                .fields
                .iter()
                .map(|f| f.name.chars().count() + f.value.chars().count())
                .sum::<usize>()
    }

    /// Clip the embed to the platform limits.
    ///
    /// Per-item limits apply first; fields that no longer fit in the total
    /// budget are shortened and then dropped.
    pub fn truncate(mut self) -> Self {
        if let Some(title) = self.title.take() {
            self.title = Some(truncate_chars(&title, EMBED_TITLE_LIMIT));
        }
        self.fields.truncate(EMBED_FIELD_COUNT_LIMIT);

        let mut budget =
            EMBED_TOTAL_LIMIT - self.title.as_deref().map_or(0, |t| t.chars().count());
        let mut kept = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let name = truncate_chars(&field.name, EMBED_FIELD_NAME_LIMIT.min(budget));
            budget -= name.chars().count();
            let value = truncate_chars(&field.value, EMBED_FIELD_VALUE_LIMIT.min(budget));
            budget -= value.chars().count();
            if name.is_empty() || value.is_empty() {
                break;
            }
            kept.push(EmbedField {
                name,
                value,
                inline: field.inline,
            });
        }
        self.fields = kept;
        self
    }
}

/// Clip `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
