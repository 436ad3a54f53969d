//! Startup handlers.
//!
//! A handler is a named startup routine that populates the [`BotContext`]:
//! the built-in `event` handler loads event definitions, the built-in
//! `command` handler loads both command tables. Handlers are contributed at
//! compile time through the [`HANDLERS`] distributed slice, or registered by
//! hand on a [`HandlerRegistry`]. Configuration decides which identifiers run
//! and in which order.
//!
//! # Contributing a handler
//!
//! ```rust,ignore
//! use nakaaa::framework::{HANDLERS, HandlerDescriptor};
//! use nakaaa::linkme::distributed_slice;
//!
//! #[distributed_slice(HANDLERS)]
//! #[linkme(crate = nakaaa::linkme)]
//! static WARMUP: HandlerDescriptor = HandlerDescriptor::new("warmup", warmup);
//!
//! fn warmup(ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
//!     Box::pin(async move { Ok(()) })
//! }
//! ```

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use linkme::distributed_slice;
use tracing::{debug, warn};

use crate::context::BotContext;
use crate::error::{BoxError, LoadError};
use crate::status::{LoadReport, LogStatus};

/// Startup routine signature.
pub type HandlerFn = fn(Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>>;

/// A named startup routine.
#[derive(Clone, Copy)]
pub struct HandlerDescriptor {
    pub name: &'static str,
    pub run: HandlerFn,
}

impl HandlerDescriptor {
    pub const fn new(name: &'static str, run: HandlerFn) -> Self {
        Self { name, run }
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Handlers linked into the binary.
#[distributed_slice]
pub static HANDLERS: [HandlerDescriptor];

/// Handlers available by identifier.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<HandlerDescriptor>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every handler in [`HANDLERS`].
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for handler in HANDLERS.iter() {
            registry.register(*handler);
        }
        registry
    }

    /// Adds a handler. A later handler with the same name shadows the earlier.
    pub fn register(&mut self, handler: HandlerDescriptor) {
        if self.get(handler.name).is_some() {
            warn!(handler = %handler.name, "Handler registered twice, the later one wins");
        }
        self.handlers.push(handler);
    }

    pub fn get(&self, name: &str) -> Option<HandlerDescriptor> {
        self.handlers.iter().rev().find(|h| h.name == name).copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs the named handlers one after another, in the given order.
    ///
    /// Unknown identifiers and failing handlers are logged and recorded in the
    /// report; the remaining handlers still run.
    pub async fn run_all(&self, ctx: &Arc<BotContext>, identifiers: &[String]) -> LoadReport {
        let mut report = LoadReport::new();

        for identifier in identifiers {
            let Some(handler) = self.get(identifier) else {
                ctx.log_status("Handler", identifier, LogStatus::Error);
                warn!(handler = %identifier, "Handler is not registered");
                report.failures.push((
                    identifier.clone(),
                    LoadError::NotFound {
                        kind: "handler",
                        name: identifier.clone(),
                    },
                ));
                continue;
            };

            ctx.log_status("Handler", identifier, LogStatus::Loading);
            let outcome = AssertUnwindSafe((handler.run)(Arc::clone(ctx)))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err("handler panicked".into()));

            match outcome {
                Ok(()) => {
                    ctx.log_status("Handler", identifier, LogStatus::Success);
                    report.loaded.push(identifier.clone());
                }
                Err(source) => {
                    ctx.log_status("Handler", identifier, LogStatus::Error);
                    warn!(handler = %identifier, error = %source, "Handler failed");
                    report.failures.push((
                        identifier.clone(),
                        LoadError::Failed {
                            name: identifier.clone(),
                            source,
                        },
                    ));
                }
            }
        }

        debug!(
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Handlers finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_context;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RUNS: AtomicUsize = AtomicUsize::new(0);

    fn counting(_ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
        Box::pin(async {
            RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn failing(_ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
        Box::pin(async { Err("database offline".into()) })
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_later_handlers() {
        let ctx = test_context();
        let mut registry = HandlerRegistry::new();
        registry.register(HandlerDescriptor::new("broken", failing));
        registry.register(HandlerDescriptor::new("counting", counting));

        let before = RUNS.load(Ordering::SeqCst);
        let report = registry
            .run_all(
                &ctx,
                &["broken".into(), "missing".into(), "counting".into()],
            )
            .await;

        assert_eq!(report.loaded, vec!["counting".to_string()]);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.failures[0].1, LoadError::Failed { .. }));
        assert!(matches!(
            report.failures[1].1,
            LoadError::NotFound { kind: "handler", .. }
        ));
        assert_eq!(RUNS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_builtin_registry_contains_default_handlers() {
        let registry = HandlerRegistry::builtin();
        assert!(registry.get("event").is_some());
        assert!(registry.get("command").is_some());
    }
}
