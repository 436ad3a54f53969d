//! Runtime orchestration.
//!
//! [`NakaaaRuntime`] turns a configuration plus registered definitions into a
//! running bot: it builds the [`BotContext`], runs the configured startup
//! handlers in order, connects the gateway with the context as its event
//! sink and waits for a shutdown signal.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use nakaaa_runtime::NakaaaRuntime;
//!
//! let runtime = NakaaaRuntime::builder().config_file("nakaaa.toml").build()?;
//! runtime.register_prefix_command(Arc::new(ping)).await;
//! runtime.run(Arc::new(MyGateway::new())).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ConfigError, ConfigLoader, NakaaaConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use nakaaa_core::BoxedGateway;
use nakaaa_framework::{
    BotContext, Catalog, CommandKind, CommandSource, EventSource, HandlerDescriptor,
    HandlerRegistry,
};

struct Running {
    ctx: Arc<BotContext>,
    gateway: BoxedGateway,
}

/// The nakaaa runtime.
///
/// Registrations made after [`start`](Self::start) only take effect on the
/// next start.
pub struct NakaaaRuntime {
    config: NakaaaConfig,
    handlers: RwLock<HandlerRegistry>,
    catalog: RwLock<Catalog>,
    running: RwLock<Option<Running>>,
    shutdown: CancellationToken,
}

impl NakaaaRuntime {
    /// Creates a runtime from the configuration found in the current directory.
    ///
    /// Falls back to defaults when no valid configuration can be loaded.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                NakaaaConfig::default()
            });

        Self::from_config(&config)
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and installs logging.
    ///
    /// The handler registry starts with every linked-in handler and the
    /// catalog with the built-in routing events.
    pub fn from_config(config: &NakaaaConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            bot = %config.bot.name,
            prefix = %config.bot.prefix,
            handlers = ?config.handler.list,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            handlers: RwLock::new(HandlerRegistry::builtin()),
            catalog: RwLock::new(Catalog::with_builtin_events()),
            running: RwLock::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &NakaaaConfig {
        &self.config
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Adds a startup handler. It only runs if listed in `handler.list`.
    pub async fn register_handler(&self, handler: HandlerDescriptor) {
        self.handlers.write().await.register(handler);
    }

    /// Adds an event definition for the `event` handler to load.
    ///
    /// A definition named like a routing event replaces that listener.
    pub async fn register_event(&self, source: Arc<dyn EventSource>) {
        self.catalog.write().await.add_event(source);
    }

    pub async fn register_command(&self, kind: CommandKind, source: Arc<dyn CommandSource>) {
        self.catalog.write().await.add_command(kind, source);
    }

    pub async fn register_prefix_command(&self, source: Arc<dyn CommandSource>) {
        self.register_command(CommandKind::Prefix, source).await;
    }

    pub async fn register_slash_command(&self, source: Arc<dyn CommandSource>) {
        self.register_command(CommandKind::Slash, source).await;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn is_running(&self) -> bool {
        self.running.read().await.is_some()
    }

    /// The context of the running bot.
    pub async fn context(&self) -> Option<Arc<BotContext>> {
        self.running.read().await.as_ref().map(|r| Arc::clone(&r.ctx))
    }

    /// Cancelling this token makes [`run`](Self::run) shut down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Requests shutdown of a pending [`run`](Self::run).
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Builds the context, runs the startup handlers and connects the gateway.
    ///
    /// Handler failures are logged and do not abort startup. A gateway that
    /// needs a token fails fast when `bot.token` is empty.
    pub async fn start(&self, gateway: BoxedGateway) -> RuntimeResult<Arc<BotContext>> {
        let mut running = self.running.write().await;
        if running.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }

        let token = self.config.bot.token.trim();
        if gateway.requires_token() && token.is_empty() {
            return Err(ConfigError::missing_field("bot.token").into());
        }

        info!(gateway = gateway.name(), bot = %self.config.bot.name, "Starting nakaaa runtime");

        let catalog = self.catalog.read().await.clone();
        let ctx = BotContext::new(self.config.identity(), catalog);

        let handlers = self.handlers.read().await.clone();
        let report = handlers.run_all(&ctx, &self.config.handler.list).await;
        if !report.is_clean() {
            warn!(
                loaded = ?report.loaded,
                failed = report.failures.len(),
                "Some startup handlers failed"
            );
        }

        gateway
            .connect(token, ctx.sink())
            .await
            .map_err(|e| RuntimeError::gateway(gateway.name(), e))?;

        info!(
            gateway = gateway.name(),
            events = ctx.events().len(),
            prefix_commands = ctx.commands().prefix().len(),
            slash_commands = ctx.commands().slash().len(),
            "Runtime started"
        );

        *running = Some(Running {
            ctx: Arc::clone(&ctx),
            gateway,
        });
        Ok(ctx)
    }

    /// Shuts the gateway down. Pending cooldown timers are left to expire.
    pub async fn stop(&self) -> RuntimeResult<()> {
        let Some(running) = self.running.write().await.take() else {
            return Err(RuntimeError::NotStarted);
        };

        info!(gateway = running.gateway.name(), "Stopping nakaaa runtime");
        running.gateway.shutdown().await;
        info!("Runtime stopped");

        Ok(())
    }

    /// Runs until Ctrl+C, SIGTERM or [`shutdown`](Self::shutdown).
    pub async fn run(&self, gateway: BoxedGateway) -> RuntimeResult<()> {
        self.run_until(gateway, self.wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes.
    pub async fn run_until<F>(&self, gateway: BoxedGateway, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start(gateway).await?;
        info!("nakaaa is now running. Press Ctrl+C to stop.");

        shutdown.await;

        self.stop().await
    }

    async fn wait_for_shutdown(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
            _ = terminate => info!("Received SIGTERM, shutting down"),
            _ = self.shutdown.cancelled() => info!("Shutdown requested"),
        }
    }

    /// Current counts, for logging or a status command.
    pub async fn stats(&self) -> RuntimeStats {
        let handlers = self.handlers.read().await.len();
        let running = self.running.read().await;

        let mut stats = RuntimeStats {
            bot_name: self.config.bot.name.clone(),
            running: running.is_some(),
            handlers,
            ..Default::default()
        };
        if let Some(running) = running.as_ref() {
            stats.events = running.ctx.events().len();
            stats.prefix_commands = running.ctx.commands().prefix().len();
            stats.slash_commands = running.ctx.commands().slash().len();
            stats.active_cooldowns = running.ctx.cooldowns().len();
        }
        stats
    }
}

impl Default for NakaaaRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub bot_name: String,
    pub running: bool,
    /// Registered startup handlers.
    pub handlers: usize,
    pub events: usize,
    pub prefix_commands: usize,
    pub slash_commands: usize,
    pub active_cooldowns: usize,
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} handlers, {} events, {} prefix / {} slash commands, {} active cooldowns",
            self.bot_name,
            if self.running { "running" } else { "stopped" },
            self.handlers,
            self.events,
            self.prefix_commands,
            self.slash_commands,
            self.active_cooldowns
        )
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`NakaaaRuntime`] with custom configuration loading.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn without_dotenv(mut self) -> Self {
        self.config_loader = self.config_loader.without_dotenv();
        self
    }

    pub fn merge(mut self, config: NakaaaConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides one dotted key, e.g. `set("bot.token", token)`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    pub fn build(self) -> RuntimeResult<NakaaaRuntime> {
        let config = self.config_loader.load()?;
        Ok(NakaaaRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use parking_lot::Mutex;
    use nakaaa_core::{
        BoxedEventSink, Gateway, GatewayEvent, TransportError, TransportResult, async_trait,
    };
    use nakaaa_framework::{BoxError, CommandDescriptor, EventDescriptor, event_fn};

    #[derive(Default)]
    struct MockGateway {
        needs_token: bool,
        refuse: bool,
        token: Mutex<Option<String>>,
        sink: Mutex<Option<BoxedEventSink>>,
        shutdowns: AtomicUsize,
    }

    impl MockGateway {
        fn sink(&self) -> Option<BoxedEventSink> {
            self.sink.lock().clone()
        }
    }

    #[async_trait]
    impl Gateway for MockGateway {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn requires_token(&self) -> bool {
            self.needs_token
        }

        async fn connect(&self, token: &str, sink: BoxedEventSink) -> TransportResult<()> {
            if self.refuse {
                return Err(TransportError::Unauthorized("bad token".into()));
            }
            *self.token.lock() = Some(token.to_string());
            *self.sink.lock() = Some(sink);
            Ok(())
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn runtime_with(config: NakaaaConfig) -> NakaaaRuntime {
        NakaaaRuntime::from_config(&config)
    }

    #[tokio::test]
    async fn test_start_populates_context() {
        let runtime = runtime_with(NakaaaConfig::default());
        runtime
            .register_prefix_command(Arc::new(
                CommandDescriptor::builder("ping").run(|_, _, _, _| async { Ok(()) }),
            ))
            .await;
        runtime
            .register_slash_command(Arc::new(
                CommandDescriptor::builder("ping").run(|_, _, _, _| async { Ok(()) }),
            ))
            .await;

        let gateway = Arc::new(MockGateway::default());
        let ctx = runtime.start(gateway.clone()).await.unwrap();

        assert!(runtime.is_running().await);
        assert_eq!(ctx.events().len(), 3);
        assert!(ctx.commands().prefix().contains("ping"));
        assert!(ctx.commands().slash().contains("ping"));
        assert!(gateway.sink().is_some());

        let stats = runtime.stats().await;
        assert!(stats.running);
        assert_eq!(stats.prefix_commands, 1);
        assert_eq!(stats.slash_commands, 1);
        assert!(stats.to_string().contains("running"));
    }

    #[tokio::test]
    async fn test_missing_token_fails_fast() {
        let runtime = runtime_with(NakaaaConfig::default());
        let gateway = Arc::new(MockGateway {
            needs_token: true,
            ..Default::default()
        });

        let result = runtime.start(gateway.clone()).await;
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::MissingField { ref field })) if field == "bot.token"
        ));
        assert!(gateway.sink().is_none());
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_token_is_passed_to_gateway() {
        let mut config = NakaaaConfig::default();
        config.bot.token = "secret".into();
        let runtime = runtime_with(config);
        let gateway = Arc::new(MockGateway {
            needs_token: true,
            ..Default::default()
        });

        runtime.start(gateway.clone()).await.unwrap();
        assert_eq!(gateway.token.lock().as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_gateway_refusal_is_reported() {
        let runtime = runtime_with(NakaaaConfig::default());
        let gateway = Arc::new(MockGateway {
            refuse: true,
            ..Default::default()
        });

        let result = runtime.start(gateway).await;
        assert!(matches!(
            result,
            Err(RuntimeError::Gateway { gateway: "mock", .. })
        ));
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_start_twice_and_stop() {
        let runtime = runtime_with(NakaaaConfig::default());
        let gateway = Arc::new(MockGateway::default());

        runtime.start(gateway.clone()).await.unwrap();
        assert!(matches!(
            runtime.start(gateway.clone()).await,
            Err(RuntimeError::AlreadyStarted)
        ));

        runtime.stop().await.unwrap();
        assert_eq!(gateway.shutdowns.load(Ordering::SeqCst), 1);
        assert!(matches!(runtime.stop().await, Err(RuntimeError::NotStarted)));
    }

    #[tokio::test]
    async fn test_handler_list_controls_loading() {
        let mut config = NakaaaConfig::default();
        config.handler.list = vec!["command".into(), "missing".into()];
        let runtime = runtime_with(config);

        let ctx = runtime
            .start(Arc::new(MockGateway::default()))
            .await
            .unwrap();
        // The event handler was not listed, so nothing is subscribed.
        assert!(ctx.events().is_empty());
    }

    static CUSTOM_RUNS: AtomicUsize = AtomicUsize::new(0);

    fn count_custom(_ctx: Arc<BotContext>) -> BoxFuture<'static, Result<(), BoxError>> {
        Box::pin(async {
            CUSTOM_RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_registered_handler_runs_when_listed() {
        let mut config = NakaaaConfig::default();
        config.handler.list.push("custom".into());
        let runtime = runtime_with(config);
        runtime
            .register_handler(HandlerDescriptor::new("custom", count_custom))
            .await;

        runtime
            .start(Arc::new(MockGateway::default()))
            .await
            .unwrap();
        assert_eq!(CUSTOM_RUNS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sink_delivers_to_registered_event() {
        let runtime = runtime_with(NakaaaConfig::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        runtime
            .register_event(Arc::new(EventDescriptor::new(
                "guildCreate",
                event_fn(move |_ctx, event: GatewayEvent| {
                    let tx = tx.clone();
                    async move {
                        tx.send(event.name().to_string())?;
                        Ok(())
                    }
                }),
            )))
            .await;

        let gateway = Arc::new(MockGateway::default());
        runtime.start(gateway.clone()).await.unwrap();

        let sink = gateway.sink().unwrap();
        sink.emit(GatewayEvent::raw("guildCreate", serde_json::json!({ "id": 1 })))
            .await;
        assert_eq!(rx.recv().await.as_deref(), Some("guildCreate"));
    }

    #[tokio::test]
    async fn test_run_until_stops_gateway() {
        let runtime = runtime_with(NakaaaConfig::default());
        let gateway = Arc::new(MockGateway::default());

        runtime
            .run_until(gateway.clone(), async {})
            .await
            .unwrap();

        assert_eq!(gateway.shutdowns.load(Ordering::SeqCst), 1);
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_shutdown_token_ends_run() {
        let runtime = Arc::new(runtime_with(NakaaaConfig::default()));
        let gateway = Arc::new(MockGateway::default());
        let token = runtime.shutdown_token();

        let task = {
            let runtime = Arc::clone(&runtime);
            let gateway = gateway.clone();
            tokio::spawn(async move { runtime.run(gateway).await })
        };
        token.cancel();

        task.await.unwrap().unwrap();
        assert_eq!(gateway.shutdowns.load(Ordering::SeqCst), 1);
    }
}
