//! # nakaaa Core
//!
//! Platform-neutral foundation of the nakaaa bot runtime.
//!
//! This crate defines the vocabulary shared by gateways and the framework:
//!
//! - [`Gateway`] / [`EventSink`]: how platform events enter the process
//! - [`GatewayEvent`]: a named event with a typed payload
//! - [`InteractionContext`]: a text message or a slash interaction
//! - [`ReplyPayload`] / [`EmbedData`]: what goes back out
//! - [`Permissions`]: permission sets checked before a command runs
//!
//! Nothing here knows about commands or cooldowns; that lives in
//! `nakaaa-framework`.

pub mod error;
pub mod event;
pub mod gateway;
pub mod interaction;
pub mod payload;
pub mod permission;
pub mod user;

pub use error::{EmbedError, TransportError, TransportResult};
pub use event::{EventPayload, GatewayEvent, ReadyInfo, names as event_names};
pub use gateway::{BoxedEventSink, BoxedGateway, EventSink, Gateway};
pub use interaction::{CommandInteraction, InteractionContext, InteractionKind, TextMessage};
pub use payload::{Embed, EmbedAuthor, EmbedData, EmbedFooter, ReplyPayload, SentReply};
pub use permission::Permissions;
pub use user::{ChannelId, DEFAULT_AVATAR_URL, MessageId, RequestingUser, UserId};

// Re-export async_trait for gateway implementations
pub use async_trait::async_trait;
