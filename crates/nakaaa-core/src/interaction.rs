//! Request contexts.
//!
//! A command is triggered either by a plain text message that starts with the
//! configured prefix, or by a structured slash interaction. Both carry the
//! requesting user and permission information, but they reply differently:
//! messages post into their channel, interactions follow the platform's
//! acknowledge/defer/edit state machine. [`InteractionContext`] is the tagged
//! union the dispatcher passes around.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::payload::{ReplyPayload, SentReply};
use crate::permission::Permissions;
use crate::user::{ChannelId, MessageId, RequestingUser};

// =============================================================================
// Text Message
// =============================================================================

/// A plain text message received from a channel.
#[async_trait]
pub trait TextMessage: Send + Sync + 'static {
    /// Platform message identifier.
    fn id(&self) -> MessageId;

    /// Channel the message was posted in.
    fn channel_id(&self) -> ChannelId;

    /// Author of the message.
    fn author(&self) -> &RequestingUser;

    /// Raw text content.
    fn content(&self) -> &str;

    /// Permissions of the author in the message's channel.
    fn member_permissions(&self) -> Permissions;

    /// Permissions of the bot in the message's channel.
    fn bot_permissions(&self) -> Permissions;

    /// Whether the bot may post new messages in the channel.
    fn can_send_in_channel(&self) -> bool {
        self.bot_permissions().satisfies(Permissions::SEND_MESSAGES)
    }

    /// Posts a new message into the channel.
    async fn send_to_channel(&self, payload: &ReplyPayload) -> TransportResult<SentReply>;

    /// Replies to this message directly.
    async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply>;
}

// =============================================================================
// Command Interaction
// =============================================================================

/// A structured command invocation.
///
/// Implementations own the acknowledgement state: after a successful
/// [`reply`](Self::reply) `is_replied` becomes `true`, after a successful
/// [`defer_reply`](Self::defer_reply) `is_deferred` becomes `true`.
#[async_trait]
pub trait CommandInteraction: Send + Sync + 'static {
    /// Platform interaction identifier.
    fn id(&self) -> &str;

    /// Name of the invoked command.
    fn command_name(&self) -> &str;

    /// Option values in declaration order.
    fn options(&self) -> Vec<String>;

    /// Channel the command was invoked in, if any.
    fn channel_id(&self) -> Option<ChannelId>;

    /// Invoking user.
    fn user(&self) -> &RequestingUser;

    /// Permissions of the invoking user.
    fn member_permissions(&self) -> Permissions;

    /// Permissions of the bot where the command was invoked.
    fn bot_permissions(&self) -> Permissions;

    /// Whether a deferred acknowledgement was sent.
    fn is_deferred(&self) -> bool;

    /// Whether an initial response was sent.
    fn is_replied(&self) -> bool;

    /// Sends the initial response.
    async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply>;

    /// Acknowledges the interaction without content.
    async fn defer_reply(&self, ephemeral: bool) -> TransportResult<SentReply>;

    /// Replaces the content of the initial response.
    async fn edit_reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply>;
}

// =============================================================================
// Interaction Context
// =============================================================================

/// Which kind of request a context carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Message,
    Interaction,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Interaction => "interaction",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The request a command is answering.
#[derive(Clone)]
pub enum InteractionContext {
    Message(Arc<dyn TextMessage>),
    Interaction(Arc<dyn CommandInteraction>),
}

impl InteractionContext {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::Message(_) => InteractionKind::Message,
            Self::Interaction(_) => InteractionKind::Interaction,
        }
    }

    pub fn requesting_user(&self) -> &RequestingUser {
        match self {
            Self::Message(message) => message.author(),
            Self::Interaction(interaction) => interaction.user(),
        }
    }

    pub fn user_permissions(&self) -> Permissions {
        match self {
            Self::Message(message) => message.member_permissions(),
            Self::Interaction(interaction) => interaction.member_permissions(),
        }
    }

    pub fn bot_permissions(&self) -> Permissions {
        match self {
            Self::Message(message) => message.bot_permissions(),
            Self::Interaction(interaction) => interaction.bot_permissions(),
        }
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::Message(message) => Some(message.channel_id()),
            Self::Interaction(interaction) => interaction.channel_id(),
        }
    }

    /// Always `false` for messages.
    pub fn is_deferred(&self) -> bool {
        match self {
            Self::Message(_) => false,
            Self::Interaction(interaction) => interaction.is_deferred(),
        }
    }

    /// Always `false` for messages.
    pub fn is_replied(&self) -> bool {
        match self {
            Self::Message(_) => false,
            Self::Interaction(interaction) => interaction.is_replied(),
        }
    }

    /// Replies directly, without any state-dependent routing.
    pub async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        match self {
            Self::Message(message) => message.reply(payload).await,
            Self::Interaction(interaction) => interaction.reply(payload).await,
        }
    }
}

impl fmt::Debug for InteractionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f
                .debug_struct("Message")
                .field("id", &message.id())
                .field("author", &message.author().username)
                .finish(),
            Self::Interaction(interaction) => f
                .debug_struct("Interaction")
                .field("id", &interaction.id())
                .field("command", &interaction.command_name())
                .finish(),
        }
    }
}

impl From<Arc<dyn TextMessage>> for InteractionContext {
    fn from(message: Arc<dyn TextMessage>) -> Self {
        Self::Message(message)
    }
}

impl From<Arc<dyn CommandInteraction>> for InteractionContext {
    fn from(interaction: Arc<dyn CommandInteraction>) -> Self {
        Self::Interaction(interaction)
    }
}
