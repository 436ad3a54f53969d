//! Event definitions, the event table and gateway subscriptions.
//!
//! Event definitions come from [`EventSource`]s. [`load_events`] resolves every
//! source concurrently; each definition with a name is stored in the
//! [`EventTable`] and subscribed so that gateway events of that name invoke its
//! listener. Definitions without a name are reported and skipped.
//!
//! Subscriptions are keyed by event name. Subscribing a name twice replaces
//! the previous listener, so reloading the same definitions never multiplies
//! invocations.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, join_all};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::context::BotContext;
use crate::error::{BoxError, LoadError};
use crate::status::{LoadReport, LogStatus};
use nakaaa_core::GatewayEvent;

/// Listener invoked for every gateway event of a subscribed name.
pub type EventFn = Arc<
    dyn Fn(Arc<BotContext>, GatewayEvent) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync,
>;

/// Wraps an async function into an [`EventFn`].
pub fn event_fn<F, Fut>(f: F) -> EventFn
where
    F: Fn(Arc<BotContext>, GatewayEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |ctx, event| Box::pin(f(ctx, event)))
}

// =============================================================================
// Definitions
// =============================================================================

/// A named event listener stored in the [`EventTable`].
#[derive(Clone)]
pub struct EventDescriptor {
    name: String,
    run: EventFn,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>, run: EventFn) -> Self {
        Self {
            name: name.into(),
            run,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn listener(&self) -> EventFn {
        Arc::clone(&self.run)
    }
}

impl fmt::Debug for EventDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What a source resolves to. The name is optional until validated.
pub struct EventDefinition {
    pub name: Option<String>,
    pub run: EventFn,
}

impl EventDefinition {
    pub fn named(name: impl Into<String>, run: EventFn) -> Self {
        Self {
            name: Some(name.into()),
            run,
        }
    }

    pub fn unnamed(run: EventFn) -> Self {
        Self { name: None, run }
    }

    /// Turns the definition into a descriptor, rejecting a missing or blank name.
    pub fn into_descriptor(self, origin: &str) -> Result<EventDescriptor, LoadError> {
        match self.name {
            Some(name) if !name.trim().is_empty() => Ok(EventDescriptor::new(name, self.run)),
            _ => Err(LoadError::missing_name(origin)),
        }
    }
}

/// A discoverable event definition.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Identifier used in logs and failure reports.
    fn origin(&self) -> &str;

    /// Produces the definition.
    async fn resolve(&self) -> Result<EventDefinition, LoadError>;
}

#[async_trait]
impl EventSource for EventDescriptor {
    fn origin(&self) -> &str {
        &self.name
    }

    async fn resolve(&self) -> Result<EventDefinition, LoadError> {
        Ok(EventDefinition::named(self.name.clone(), self.listener()))
    }
}

/// An [`EventSource`] backed by an async closure.
pub struct FnEventSource<F> {
    origin: String,
    resolver: F,
}

/// Creates an [`EventSource`] from an async closure.
pub fn event_source<F, Fut>(origin: impl Into<String>, resolver: F) -> FnEventSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventDefinition, LoadError>> + Send + 'static,
{
    FnEventSource {
        origin: origin.into(),
        resolver,
    }
}

#[async_trait]
impl<F, Fut> EventSource for FnEventSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<EventDefinition, LoadError>> + Send + 'static,
{
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn resolve(&self) -> Result<EventDefinition, LoadError> {
        (self.resolver)().await
    }
}

// =============================================================================
// Event Table
// =============================================================================

/// Loaded event definitions keyed by name.
#[derive(Default)]
pub struct EventTable {
    entries: RwLock<HashMap<String, EventDescriptor>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a descriptor, returning the one it replaced.
    pub fn insert(&self, descriptor: EventDescriptor) -> Option<EventDescriptor> {
        self.entries
            .write()
            .insert(descriptor.name.clone(), descriptor)
    }

    pub fn get(&self, name: &str) -> Option<EventDescriptor> {
        self.entries.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sorted event names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// Whether a subscription added or replaced a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Added,
    Replaced,
}

/// Gateway event name to listener. At most one listener per name.
#[derive(Default)]
pub struct SubscriptionTable {
    listeners: RwLock<HashMap<String, EventFn>>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, name: impl Into<String>, listener: EventFn) -> Subscription {
        match self.listeners.write().insert(name.into(), listener) {
            Some(_) => Subscription::Replaced,
            None => Subscription::Added,
        }
    }

    pub fn unsubscribe(&self, name: &str) -> bool {
        self.listeners.write().remove(name).is_some()
    }

    pub fn listener(&self, name: &str) -> Option<EventFn> {
        self.listeners.read().get(name).cloned()
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.listeners.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Resolves every source concurrently, storing and subscribing each named
/// definition.
///
/// Each source is handled independently: a failure is logged, recorded in the
/// returned report, and never affects the other sources.
pub async fn load_events(ctx: &Arc<BotContext>, sources: &[Arc<dyn EventSource>]) -> LoadReport {
    let outcomes = join_all(sources.iter().map(|source| async move {
        let origin = source.origin().to_string();
        let outcome = source
            .resolve()
            .await
            .and_then(|definition| definition.into_descriptor(&origin));

        match outcome {
            Ok(descriptor) => {
                let name = descriptor.name().to_string();
                if ctx.events().insert(descriptor.clone()).is_some() {
                    warn!(event = %name, origin = %origin, "Event definition replaced an earlier one");
                }
                if ctx.subscriptions().subscribe(name.clone(), descriptor.listener())
                    == Subscription::Replaced
                {
                    debug!(event = %name, "Listener replaced");
                }
                ctx.log_status("Event", &name, LogStatus::Success);
                Ok(name)
            }
            Err(error) => {
                ctx.log_status("Event", &origin, LogStatus::Error);
                warn!(origin = %origin, error = %error, "Failed to load event");
                Err((origin, error))
            }
        }
    }))
    .await;

    let mut report = LoadReport::new();
    for outcome in outcomes {
        match outcome {
            Ok(name) => report.loaded.push(name),
            Err(failure) => report.failures.push(failure),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LogCapture, test_context};
    use nakaaa_core::{ReadyInfo, RequestingUser};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: Arc<AtomicUsize>) -> EventFn {
        event_fn(move |_ctx, _event| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn ready_event() -> GatewayEvent {
        GatewayEvent::ready(ReadyInfo {
            user: RequestingUser::new(1, "nakaaa").as_bot(),
            guild_count: 0,
        })
    }

    #[tokio::test]
    async fn test_load_skips_malformed_sources() {
        let ctx = test_context();
        let counter = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(Arc::clone(&counter));

        let sources: Vec<Arc<dyn EventSource>> = vec![
            Arc::new(event_source("events/broken.rs", || async {
                Err::<EventDefinition, _>(LoadError::resolve(
                    "events/broken.rs",
                    "unexpected token",
                ))
            })),
            Arc::new(event_source("events/anonymous.rs", {
                let listener = Arc::clone(&listener);
                move || {
                    let listener = Arc::clone(&listener);
                    async move { Ok(EventDefinition::unnamed(listener)) }
                }
            })),
            Arc::new(EventDescriptor::new("ready", listener)),
        ];

        let logs = LogCapture::default();
        let report = {
            let _guard = logs.install();
            load_events(&ctx, &sources).await
        };

        let failure_lines: Vec<String> = logs
            .lines()
            .into_iter()
            .filter(|line| line.contains("| Status: ❌ Error"))
            .collect();
        assert_eq!(failure_lines.len(), 2);
        for origin in ["events/broken.rs", "events/anonymous.rs"] {
            assert!(
                failure_lines
                    .iter()
                    .any(|line| line.contains(&format!("Event : {origin} |")))
            );
        }

        assert_eq!(report.loaded, vec!["ready".to_string()]);
        assert_eq!(report.failures.len(), 2);
        assert!(
            report
                .failures
                .iter()
                .any(|(origin, err)| origin == "events/anonymous.rs"
                    && matches!(err, LoadError::MissingName { .. }))
        );
        assert_eq!(ctx.events().len(), 1);
        assert!(ctx.subscriptions().is_subscribed("ready"));

        ctx.emit(ready_event()).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_does_not_duplicate_listeners() {
        let ctx = test_context();
        let counter = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Arc<dyn EventSource>> = vec![Arc::new(EventDescriptor::new(
            "ready",
            counting_listener(Arc::clone(&counter)),
        ))];

        load_events(&ctx, &sources).await;
        load_events(&ctx, &sources).await;
        ctx.emit(ready_event()).await;

        assert_eq!(ctx.events().len(), 1);
        assert_eq!(ctx.subscriptions().len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_listener_error_is_contained() {
        let ctx = test_context();
        let counter = Arc::new(AtomicUsize::new(0));
        ctx.subscriptions().subscribe(
            "ready",
            event_fn(|_ctx, _event| async { Err::<(), BoxError>("listener blew up".into()) }),
        );
        ctx.subscriptions()
            .subscribe("messageCreate", counting_listener(Arc::clone(&counter)));

        ctx.emit(ready_event()).await;
        ctx.emit(GatewayEvent::raw("messageCreate", serde_json::Value::Null))
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_name_is_missing() {
        let run = event_fn(|_ctx, _event| async { Ok(()) });
        let result = EventDefinition::named("  ", run).into_descriptor("events/blank.rs");
        assert!(matches!(result, Err(LoadError::MissingName { .. })));
    }
}
