//! Built-in routing events and startup handlers.
//!
//! The `event` handler loads every event definition in the context's
//! [`Catalog`](crate::context::Catalog); the `command` handler loads both
//! command tables. The routing events below are what turn gateway traffic
//! into command invocations.

use std::sync::Arc;

use futures::future::BoxFuture;
use linkme::distributed_slice;
use tracing::{debug, info};

use crate::command::{CommandKind, load_commands};
use crate::context::BotContext;
use crate::dispatch::{CommandInvocation, dispatch_command, parse_prefixed};
use crate::error::BoxError;
use crate::event::{EventDescriptor, event_fn, load_events};
use crate::handler::{HANDLERS, HandlerDescriptor};
use nakaaa_core::{EventPayload, GatewayEvent, InteractionContext, event_names};

// =============================================================================
// Routing Events
// =============================================================================

/// The `ready`, `messageCreate` and `interactionCreate` listeners.
pub fn routing_events() -> Vec<EventDescriptor> {
    vec![
        EventDescriptor::new(event_names::READY, event_fn(on_ready)),
        EventDescriptor::new(event_names::MESSAGE_CREATE, event_fn(on_message_create)),
        EventDescriptor::new(
            event_names::INTERACTION_CREATE,
            event_fn(on_interaction_create),
        ),
    ]
}

async fn on_ready(ctx: Arc<BotContext>, event: GatewayEvent) -> Result<(), BoxError> {
    let EventPayload::Ready(info) = event.payload() else {
        return Err(format!("unexpected payload for '{}'", event.name()).into());
    };
    info!(
        user = %info.user.username,
        guilds = info.guild_count,
        events = ctx.events().len(),
        prefix_commands = ctx.commands().prefix().len(),
        slash_commands = ctx.commands().slash().len(),
        "Logged in as {}",
        info.user.username
    );
    Ok(())
}

async fn on_message_create(ctx: Arc<BotContext>, event: GatewayEvent) -> Result<(), BoxError> {
    let EventPayload::MessageCreate(message) = event.into_payload() else {
        return Err("unexpected payload for 'messageCreate'".into());
    };
    if message.author().bot {
        return Ok(());
    }
    let Some((name, args)) = parse_prefixed(message.content(), ctx.prefix()) else {
        return Ok(());
    };

    let invocation = CommandInvocation::prefixed(name, args, ctx.prefix());
    let outcome = dispatch_command(&ctx, InteractionContext::Message(message), invocation).await;
    debug!(outcome = ?outcome, "Prefix command dispatched");
    Ok(())
}

async fn on_interaction_create(ctx: Arc<BotContext>, event: GatewayEvent) -> Result<(), BoxError> {
    let EventPayload::InteractionCreate(interaction) = event.into_payload() else {
        return Err("unexpected payload for 'interactionCreate'".into());
    };

    let invocation = CommandInvocation::slash(interaction.command_name(), interaction.options());
    let outcome =
        dispatch_command(&ctx, InteractionContext::Interaction(interaction), invocation).await;
    debug!(outcome = ?outcome, "Slash command dispatched");
    Ok(())
}

// =============================================================================
// Startup Handlers
// =============================================================================

#[distributed_slice(HANDLERS)]
static EVENT_HANDLER: HandlerDescriptor = HandlerDescriptor::new("event", load_catalog_events);

#[distributed_slice(HANDLERS)]
static COMMAND_HANDLER: HandlerDescriptor =
    HandlerDescriptor::new("command", load_catalog_commands);

fn load_catalog_events(ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
    Box::pin(async move {
        let sources = ctx.catalog().events().to_vec();
        let report = load_events(&ctx, &sources).await;
        info!(
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Event definitions loaded"
        );
        Ok(())
    })
}

fn load_catalog_commands(ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
    Box::pin(async move {
        for kind in [CommandKind::Prefix, CommandKind::Slash] {
            let sources = ctx.catalog().commands(kind).to_vec();
            let report = load_commands(&ctx, kind, &sources).await;
            info!(
                kind = %kind,
                loaded = report.loaded.len(),
                failed = report.failures.len(),
                "Command definitions loaded"
            );
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandDescriptor;
    use crate::context::{BotIdentity, Catalog};
    use crate::handler::HandlerRegistry;
    use crate::testing::{MockInteraction, MockMessage, test_user};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn started_context(counter: &Arc<AtomicUsize>) -> Arc<BotContext> {
        let mut catalog = Catalog::with_builtin_events();
        for kind in [CommandKind::Prefix, CommandKind::Slash] {
            let counter = Arc::clone(counter);
            catalog.add_command(
                kind,
                Arc::new(CommandDescriptor::builder("ping").cooldown(5).run(
                    move |_ctx, _interaction, _args, _prefix| {
                        let counter = Arc::clone(&counter);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    },
                )),
            );
        }

        let ctx = BotContext::new(BotIdentity::default(), catalog);
        let report = HandlerRegistry::builtin()
            .run_all(&ctx, &["event".into(), "command".into()])
            .await;
        assert!(report.is_clean());
        ctx
    }

    #[tokio::test]
    async fn test_default_handlers_populate_tables() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = started_context(&counter).await;

        assert_eq!(
            ctx.events().names(),
            vec!["interactionCreate", "messageCreate", "ready"]
        );
        assert_eq!(ctx.commands().prefix().len(), 1);
        assert_eq!(ctx.commands().slash().len(), 1);
    }

    #[tokio::test]
    async fn test_message_routes_to_prefix_command() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = started_context(&counter).await;

        let message = MockMessage::new("$PING now");
        ctx.emit(GatewayEvent::message_create(message.as_text_message()))
            .await;
        let unprefixed = MockMessage::new("ping");
        ctx.emit(GatewayEvent::message_create(unprefixed.as_text_message()))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bot_authors_are_ignored() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = started_context(&counter).await;

        let message = MockMessage::new("$ping").with_author(test_user().as_bot());
        ctx.emit(GatewayEvent::message_create(message.as_text_message()))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(message.calls().is_empty());
    }

    #[tokio::test]
    async fn test_interaction_routes_to_slash_command() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctx = started_context(&counter).await;

        let interaction = MockInteraction::new("ping");
        ctx.emit(GatewayEvent::interaction_create(
            interaction.as_command_interaction(),
        ))
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(ctx.cooldowns().contains("ping", test_user().id));
    }
}
