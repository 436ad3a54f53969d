//! # nakaaa
//!
//! A command-dispatch framework for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  events  ┌────────────┐  name  ┌───────────────┐  gate  ┌──────────┐
//! │ Gateway  │────────▶│ BotContext │──────▶│ event listener │──────▶│ command  │──▶ ReplyMediator
//! │(platform)│         │  (sink)    │       │ (subscription) │       │ (tables) │
//! └──────────┘         └────────────┘       └───────────────┘       └──────────┘
//! ```
//!
//! - **Runtime**: loads configuration, installs logging, runs startup handlers
//!   and connects the gateway
//! - **Handlers**: named startup routines (`event`, `command`, your own)
//! - **Events**: one listener per event name
//! - **Commands**: prefix and slash tables behind a permission and cooldown gate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nakaaa::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = NakaaaRuntime::new();
//!     runtime
//!         .register_prefix_command(Arc::new(
//!             CommandDescriptor::builder("ping").cooldown(5).run(|ctx, interaction, _, _| async move {
//!                 ctx.replies().send_text(&interaction, "Pong!", false).await;
//!                 Ok(())
//!             }),
//!         ))
//!         .await;
//!     runtime.run(Arc::new(MyGateway::default())).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `nakaaa.toml` configuration files
//! - `yaml-config`: `nakaaa.yaml` configuration files
//! - `json-log`: JSON log lines

pub use nakaaa_core as core;
pub use nakaaa_framework as framework;
pub use nakaaa_runtime as runtime;

// Handlers contributed through `#[distributed_slice]` need the same linkme.
pub use nakaaa_framework::linkme;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use nakaaa::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime
    pub use nakaaa_runtime::{NakaaaConfig, NakaaaRuntime};

    // Gateway contracts
    pub use nakaaa_core::{
        BoxedEventSink, CommandInteraction, EventSink, Gateway, GatewayEvent, InteractionContext,
        TextMessage, TransportError, TransportResult, async_trait,
    };

    // Payloads and permissions
    pub use nakaaa_core::{
        EmbedAuthor, EmbedData, EmbedFooter, Permissions, ReplyPayload, RequestingUser, SentReply,
    };

    // Dispatch core
    pub use nakaaa_framework::{
        BotContext, BoxError, CommandDescriptor, CommandKind, Delivery, EventDescriptor,
        HandlerDescriptor, event_fn, footer,
    };
}
