//! Outgoing message payloads.
//!
//! A [`ReplyPayload`] is what the framework hands to a gateway: optional text,
//! any number of embeds, and the visibility flags the platform understands.
//! [`EmbedData`] is the loose form command authors fill in; it becomes an
//! [`Embed`] once it passes the platform limits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EmbedError;
use crate::user::{ChannelId, MessageId};

const TITLE_LIMIT: usize = 256;
const DESCRIPTION_LIMIT: usize = 4096;
const FOOTER_LIMIT: usize = 2048;
const AUTHOR_LIMIT: usize = 256;
const MAX_COLOR: u32 = 0x00FF_FFFF;

// =============================================================================
// Embed Parts
// =============================================================================

/// Footer line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    pub icon_url: Option<String>,
}

impl EmbedFooter {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon_url: None,
        }
    }

    pub fn with_icon(mut self, url: impl Into<String>) -> Self {
        self.icon_url = Some(url.into());
        self
    }
}

/// Author line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

impl EmbedAuthor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            icon_url: None,
        }
    }
}

// =============================================================================
// Embed
// =============================================================================

/// Loose embed description supplied by command code.
///
/// Every field is optional. Validation happens in [`EmbedData::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedData {
    pub url: Option<String>,
    pub title: Option<String>,
    pub color: Option<u32>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub footer: Option<EmbedFooter>,
    pub author: Option<EmbedAuthor>,
}

impl EmbedData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn footer(mut self, footer: EmbedFooter) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn author(mut self, author: EmbedAuthor) -> Self {
        self.author = Some(author);
        self
    }

    /// Validates the data against platform limits and stamps it.
    pub fn build(self, timestamp: DateTime<Utc>) -> Result<Embed, EmbedError> {
        if let Some(color) = self.color
            && color > MAX_COLOR
        {
            return Err(EmbedError::InvalidColor(color));
        }
        check_len("title", self.title.as_deref(), TITLE_LIMIT)?;
        check_len("description", self.description.as_deref(), DESCRIPTION_LIMIT)?;
        check_len(
            "footer",
            self.footer.as_ref().map(|f| f.text.as_str()),
            FOOTER_LIMIT,
        )?;
        check_len(
            "author",
            self.author.as_ref().map(|a| a.name.as_str()),
            AUTHOR_LIMIT,
        )?;

        Ok(Embed {
            data: self,
            timestamp: Some(timestamp),
        })
    }
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), EmbedError> {
    match value.map(|v| v.chars().count()) {
        Some(len) if len > max => Err(EmbedError::FieldTooLong { field, len, max }),
        _ => Ok(()),
    }
}

/// A validated embed ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(flatten)]
    data: EmbedData,
    timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    /// The embed fields.
    pub fn data(&self) -> &EmbedData {
        &self.data
    }

    /// Time the embed was stamped at.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }
}

// =============================================================================
// Reply Payload
// =============================================================================

/// A message to send in response to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    /// Visible only to the requesting user. Ignored for plain messages.
    pub ephemeral: bool,
    /// Ask the platform to return the sent message.
    pub fetch_reply: bool,
}

impl ReplyPayload {
    /// A text-only payload.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A payload carrying one embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    pub fn fetch_reply(mut self, fetch_reply: bool) -> Self {
        self.fetch_reply = fetch_reply;
        self
    }
}

/// What the platform returned for a delivered message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentReply {
    /// Present when the platform returned the message.
    pub message_id: Option<MessageId>,
    pub channel_id: Option<ChannelId>,
}

impl SentReply {
    /// An acknowledgement without a fetched message.
    pub fn acknowledged() -> Self {
        Self::default()
    }

    /// A fetched message.
    pub fn fetched(message_id: MessageId, channel_id: ChannelId) -> Self {
        Self {
            message_id: Some(message_id),
            channel_id: Some(channel_id),
        }
    }
}
