//! Gateway events.
//!
//! The platform pushes named events (`ready`, `messageCreate`,
//! `interactionCreate`, ...). The framework subscribes listeners by event name,
//! so every [`GatewayEvent`] carries its name next to a typed payload. Events
//! the framework does not model are kept as raw JSON.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::interaction::{CommandInteraction, InteractionContext, TextMessage};
use crate::user::RequestingUser;

/// Well-known gateway event names.
pub mod names {
    pub const READY: &str = "ready";
    pub const MESSAGE_CREATE: &str = "messageCreate";
    pub const INTERACTION_CREATE: &str = "interactionCreate";
}

/// Session information sent once the gateway is ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyInfo {
    /// The bot's own account.
    pub user: RequestingUser,
    /// Number of guilds visible to the session.
    pub guild_count: usize,
}

/// Typed event payload.
#[derive(Clone)]
pub enum EventPayload {
    Ready(ReadyInfo),
    MessageCreate(Arc<dyn TextMessage>),
    InteractionCreate(Arc<dyn CommandInteraction>),
    Raw(serde_json::Value),
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(info) => f.debug_tuple("Ready").field(info).finish(),
            Self::MessageCreate(message) => f
                .debug_tuple("MessageCreate")
                .field(&InteractionContext::Message(message.clone()))
                .finish(),
            Self::InteractionCreate(interaction) => f
                .debug_tuple("InteractionCreate")
                .field(&InteractionContext::Interaction(interaction.clone()))
                .finish(),
            Self::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
        }
    }
}

/// A named event delivered by a gateway.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    name: String,
    payload: EventPayload,
}

impl GatewayEvent {
    pub fn new(name: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    pub fn ready(info: ReadyInfo) -> Self {
        Self::new(names::READY, EventPayload::Ready(info))
    }

    pub fn message_create(message: Arc<dyn TextMessage>) -> Self {
        Self::new(names::MESSAGE_CREATE, EventPayload::MessageCreate(message))
    }

    pub fn interaction_create(interaction: Arc<dyn CommandInteraction>) -> Self {
        Self::new(
            names::INTERACTION_CREATE,
            EventPayload::InteractionCreate(interaction),
        )
    }

    pub fn raw(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::new(name, EventPayload::Raw(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn into_payload(self) -> EventPayload {
        self.payload
    }
}
