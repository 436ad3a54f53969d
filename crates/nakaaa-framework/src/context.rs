//! The bot context.
//!
//! [`BotContext`] is the composition root of a running bot. It owns every
//! table the dispatch core needs and is handed to handlers, event listeners
//! and commands as `Arc<BotContext>`. There is no global state.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use tracing::{error, info, trace};

use crate::command::{CommandKind, CommandSource, CommandTables};
use crate::cooldown::CooldownTracker;
use crate::event::{EventSource, EventTable, SubscriptionTable};
use crate::introspect::StatusSnapshot;
use crate::reply::ReplyMediator;
use crate::status::{LogStatus, StatusGlyphs};
use nakaaa_core::{BoxedEventSink, EventSink, GatewayEvent};

// =============================================================================
// Identity
// =============================================================================

/// Default bot name.
pub const DEFAULT_BOT_NAME: &str = "slendertaker";
/// Default bot icon.
pub const DEFAULT_BOT_ICON: &str =
    "https://i.scdn.co/image/ab67616d00001e02af9492f3874593a0ecb971c8";
/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "$";
/// Default author credit.
pub const DEFAULT_AUTHOR: &str = "slendertaker";

/// Branding and prefix of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub name: String,
    pub icon: String,
    pub author: String,
    pub prefix: String,
    pub glyphs: StatusGlyphs,
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_BOT_NAME.to_string(),
            icon: DEFAULT_BOT_ICON.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            glyphs: StatusGlyphs::default(),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Definitions available to the built-in `event` and `command` handlers.
#[derive(Clone, Default)]
pub struct Catalog {
    events: Vec<Arc<dyn EventSource>>,
    prefix_commands: Vec<Arc<dyn CommandSource>>,
    slash_commands: Vec<Arc<dyn CommandSource>>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in routing events.
    pub fn with_builtin_events() -> Self {
        let mut catalog = Self::new();
        for event in crate::builtin::routing_events() {
            catalog.add_event(Arc::new(event));
        }
        catalog
    }

    pub fn add_event(&mut self, source: Arc<dyn EventSource>) -> &mut Self {
        self.events.push(source);
        self
    }

    pub fn add_command(&mut self, kind: CommandKind, source: Arc<dyn CommandSource>) -> &mut Self {
        match kind {
            CommandKind::Prefix => self.prefix_commands.push(source),
            CommandKind::Slash => self.slash_commands.push(source),
        }
        self
    }

    pub fn events(&self) -> &[Arc<dyn EventSource>] {
        &self.events
    }

    pub fn commands(&self, kind: CommandKind) -> &[Arc<dyn CommandSource>] {
        match kind {
            CommandKind::Prefix => &self.prefix_commands,
            CommandKind::Slash => &self.slash_commands,
        }
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("events", &self.events.len())
            .field("prefix_commands", &self.prefix_commands.len())
            .field("slash_commands", &self.slash_commands.len())
            .finish()
    }
}

// =============================================================================
// Bot Context
// =============================================================================

/// Shared state of a running bot.
pub struct BotContext {
    identity: BotIdentity,
    catalog: Catalog,
    events: EventTable,
    subscriptions: SubscriptionTable,
    commands: CommandTables,
    cooldowns: CooldownTracker,
    replies: ReplyMediator,
    started_at: DateTime<Utc>,
}

impl BotContext {
    pub fn new(identity: BotIdentity, catalog: Catalog) -> Arc<Self> {
        Arc::new(Self {
            identity,
            catalog,
            events: EventTable::new(),
            subscriptions: SubscriptionTable::new(),
            commands: CommandTables::new(),
            cooldowns: CooldownTracker::new(),
            replies: ReplyMediator::new(),
            started_at: Utc::now(),
        })
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn prefix(&self) -> &str {
        &self.identity.prefix
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn commands(&self) -> &CommandTables {
        &self.commands
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    pub fn replies(&self) -> &ReplyMediator {
        &self.replies
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Emits one status line for a loadable item.
    pub fn log_status(&self, category: &str, name: &str, status: LogStatus) {
        let line = self.identity.glyphs.render(category, name, status);
        match status {
            LogStatus::Error => error!(category, name, status = %status, "{line}"),
            _ => info!(category, name, status = %status, "{line}"),
        }
    }

    /// Read-only view for dashboards.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            bot_name: self.identity.name.clone(),
            started_at: self.started_at,
            events: self.events.names(),
            prefix_commands: self.commands.prefix().names(),
            slash_commands: self.commands.slash().names(),
            active_cooldowns: self.cooldowns.len(),
        }
    }

    /// Runs the listener subscribed to the event's name, if any.
    ///
    /// Listener errors and panics are logged here and go no further.
    pub async fn emit(self: &Arc<Self>, event: GatewayEvent) {
        let Some(listener) = self.subscriptions.listener(event.name()) else {
            trace!(event = %event.name(), "No listener subscribed");
            return;
        };
        let name = event.name().to_string();

        match AssertUnwindSafe(listener(Arc::clone(self), event))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(event = %name, error = %err, "Event listener failed"),
            Err(_) => error!(event = %name, "Event listener panicked"),
        }
    }

    /// An [`EventSink`] that handles every event on its own task.
    pub fn sink(self: &Arc<Self>) -> BoxedEventSink {
        Arc::new(ContextSink {
            ctx: Arc::clone(self),
        })
    }
}

impl fmt::Debug for BotContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotContext")
            .field("identity", &self.identity)
            .field("events", &self.events.len())
            .field("prefix_commands", &self.commands.prefix().len())
            .field("slash_commands", &self.commands.slash().len())
            .finish_non_exhaustive()
    }
}

struct ContextSink {
    ctx: Arc<BotContext>,
}

#[async_trait]
impl EventSink for ContextSink {
    async fn emit(&self, event: GatewayEvent) {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move { ctx.emit(event).await });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::event_fn;
    use crate::testing::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_panicking_listener_is_contained() {
        let ctx = test_context();
        ctx.subscriptions()
            .subscribe(
                "boom",
                event_fn(|_ctx, _event| async {
                    if true {
                        panic!("listener panic");
                    }
                    Ok(())
                }),
            );

        ctx.emit(GatewayEvent::raw("boom", serde_json::Value::Null))
            .await;
        ctx.emit(GatewayEvent::raw("unsubscribed", serde_json::Value::Null))
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_runs_listener_on_task() {
        let ctx = test_context();
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        ctx.subscriptions().subscribe(
            "custom",
            event_fn(move |_ctx, _event| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
        );

        ctx.sink()
            .emit(GatewayEvent::raw("custom", serde_json::json!({"n": 1})))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_snapshot_counts() {
        let ctx = test_context();
        let snapshot = ctx.status();
        assert_eq!(snapshot.bot_name, DEFAULT_BOT_NAME);
        assert!(snapshot.events.is_empty());
        assert_eq!(snapshot.active_cooldowns, 0);
    }
}
