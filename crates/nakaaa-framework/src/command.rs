//! Command descriptors and command tables.
//!
//! Commands live in two independent tables: one for prefix-triggered text
//! commands and one for slash interactions. Both hold the same
//! [`CommandDescriptor`] type.
//!
//! # Defining a command
//!
//! ```rust,ignore
//! let ping = CommandDescriptor::builder("ping")
//!     .description("Check that the bot is alive")
//!     .category("info")
//!     .cooldown(5)
//!     .run(|ctx, interaction, _args, _prefix| async move {
//!         ctx.replies().send_text(&interaction, "Pong!", false).await;
//!         Ok(())
//!     });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, join_all};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::BotContext;
use crate::error::{BoxError, IntrospectError, LoadError};
use crate::introspect::CommandSummary;
use crate::status::{LoadReport, LogStatus};
use nakaaa_core::{InteractionContext, Permissions};

/// Cooldown applied when a command declares none, or a non-positive one.
pub const DEFAULT_COOLDOWN_SECS: i64 = 3;

/// Command body: `(context, interaction, args, prefix)`.
pub type CommandFn = Arc<
    dyn Fn(Arc<BotContext>, InteractionContext, Vec<String>, String) -> BoxFuture<'static, Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Wraps an async function into a [`CommandFn`].
pub fn command_fn<F, Fut>(f: F) -> CommandFn
where
    F: Fn(Arc<BotContext>, InteractionContext, Vec<String>, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    Arc::new(move |ctx, interaction, args, prefix| Box::pin(f(ctx, interaction, args, prefix)))
}

// =============================================================================
// Command Kind
// =============================================================================

/// Which table a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Triggered by a text message starting with the prefix.
    Prefix,
    /// Triggered by a structured interaction.
    Slash,
}

impl CommandKind {
    /// Category used in status lines.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Prefix => "Command",
            Self::Slash => "Slash",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Prefix => "prefix",
            Self::Slash => "slash",
        })
    }
}

// =============================================================================
// Command Descriptor
// =============================================================================

/// A runnable command and its requirements.
pub struct CommandDescriptor {
    name: String,
    description: String,
    category: String,
    user_permissions: Permissions,
    bot_permissions: Permissions,
    cooldown: AtomicI64,
    run: CommandFn,
}

impl CommandDescriptor {
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Permissions the invoking user must hold.
    pub fn user_permissions(&self) -> Permissions {
        self.user_permissions
    }

    /// Permissions the bot must hold.
    pub fn bot_permissions(&self) -> Permissions {
        self.bot_permissions
    }

    /// Cooldown as declared, before normalisation.
    pub fn declared_cooldown(&self) -> i64 {
        self.cooldown.load(Ordering::Acquire)
    }

    /// Effective cooldown in seconds.
    ///
    /// A non-positive value is replaced by [`DEFAULT_COOLDOWN_SECS`] on the
    /// descriptor itself the first time it is read.
    pub fn cooldown_secs(&self) -> u64 {
        let current = self.cooldown.load(Ordering::Acquire);
        if current > 0 {
            return current as u64;
        }
        match self.cooldown.compare_exchange(
            current,
            DEFAULT_COOLDOWN_SECS,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => DEFAULT_COOLDOWN_SECS as u64,
            Err(actual) => actual.max(DEFAULT_COOLDOWN_SECS) as u64,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs())
    }

    /// Runs the command body.
    pub fn invoke(
        &self,
        ctx: Arc<BotContext>,
        interaction: InteractionContext,
        args: Vec<String>,
        prefix: String,
    ) -> BoxFuture<'static, Result<(), BoxError>> {
        (self.run)(ctx, interaction, args, prefix)
    }

    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            cooldown: self.declared_cooldown(),
            user_permissions: self.user_permissions.names().into_iter().map(String::from).collect(),
            bot_permissions: self.bot_permissions.names().into_iter().map(String::from).collect(),
        }
    }
}

impl Clone for CommandDescriptor {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            user_permissions: self.user_permissions,
            bot_permissions: self.bot_permissions,
            cooldown: AtomicI64::new(self.declared_cooldown()),
            run: Arc::clone(&self.run),
        }
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("cooldown", &self.declared_cooldown())
            .field("user_permissions", &self.user_permissions)
            .field("bot_permissions", &self.bot_permissions)
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommandDescriptor`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    name: String,
    description: String,
    category: String,
    user_permissions: Permissions,
    bot_permissions: Permissions,
    cooldown: i64,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: "misc".to_string(),
            user_permissions: Permissions::NONE,
            bot_permissions: Permissions::NONE,
            cooldown: 0,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn user_permissions(mut self, permissions: Permissions) -> Self {
        self.user_permissions = permissions;
        self
    }

    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = permissions;
        self
    }

    /// Cooldown in seconds. Values below one fall back to the default.
    pub fn cooldown(mut self, secs: i64) -> Self {
        self.cooldown = secs;
        self
    }

    /// Finishes the descriptor with an async body.
    pub fn run<F, Fut>(self, f: F) -> CommandDescriptor
    where
        F: Fn(Arc<BotContext>, InteractionContext, Vec<String>, String) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.run_with(command_fn(f))
    }

    /// Finishes the descriptor with a prepared [`CommandFn`].
    pub fn run_with(self, run: CommandFn) -> CommandDescriptor {
        CommandDescriptor {
            name: self.name,
            description: self.description,
            category: self.category,
            user_permissions: self.user_permissions,
            bot_permissions: self.bot_permissions,
            cooldown: AtomicI64::new(self.cooldown),
            run,
        }
    }
}

// =============================================================================
// Command Table
// =============================================================================

/// Commands of one kind, keyed by lowercase name.
pub struct CommandTable {
    kind: CommandKind,
    entries: RwLock<HashMap<String, Arc<CommandDescriptor>>>,
}

impl CommandTable {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Stores a descriptor, returning the one it replaced.
    pub fn insert(&self, descriptor: CommandDescriptor) -> Option<Arc<CommandDescriptor>> {
        let key = descriptor.name.to_lowercase();
        self.entries.write().insert(key, Arc::new(descriptor))
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.entries.read().get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sorted command names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .values()
            .map(|descriptor| descriptor.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Summaries of every command, sorted by name.
    pub fn summaries(&self) -> Vec<CommandSummary> {
        let mut summaries: Vec<CommandSummary> = self
            .entries
            .read()
            .values()
            .map(|descriptor| descriptor.summary())
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Summary of one command.
    pub fn lookup(&self, name: &str) -> Result<CommandSummary, IntrospectError> {
        self.get(name)
            .map(|descriptor| descriptor.summary())
            .ok_or_else(|| IntrospectError::CommandNotFound(name.to_string()))
    }
}

/// The prefix and slash tables.
pub struct CommandTables {
    prefix: CommandTable,
    slash: CommandTable,
}

impl Default for CommandTables {
    fn default() -> Self {
        Self {
            prefix: CommandTable::new(CommandKind::Prefix),
            slash: CommandTable::new(CommandKind::Slash),
        }
    }
}

impl CommandTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> &CommandTable {
        &self.prefix
    }

    pub fn slash(&self) -> &CommandTable {
        &self.slash
    }

    pub fn table(&self, kind: CommandKind) -> &CommandTable {
        match kind {
            CommandKind::Prefix => &self.prefix,
            CommandKind::Slash => &self.slash,
        }
    }
}

// =============================================================================
// Command Sources
// =============================================================================

/// A discoverable command definition.
#[async_trait]
pub trait CommandSource: Send + Sync {
    /// Identifier used in logs and failure reports.
    fn origin(&self) -> &str;

    /// Produces the descriptor.
    async fn resolve(&self) -> Result<CommandDescriptor, LoadError>;
}

#[async_trait]
impl CommandSource for CommandDescriptor {
    fn origin(&self) -> &str {
        &self.name
    }

    async fn resolve(&self) -> Result<CommandDescriptor, LoadError> {
        Ok(self.clone())
    }
}

/// A [`CommandSource`] backed by an async closure.
pub struct FnCommandSource<F> {
    origin: String,
    resolver: F,
}

/// Creates a [`CommandSource`] from an async closure.
pub fn command_source<F, Fut>(origin: impl Into<String>, resolver: F) -> FnCommandSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<CommandDescriptor, LoadError>> + Send + 'static,
{
    FnCommandSource {
        origin: origin.into(),
        resolver,
    }
}

#[async_trait]
impl<F, Fut> CommandSource for FnCommandSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<CommandDescriptor, LoadError>> + Send + 'static,
{
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn resolve(&self) -> Result<CommandDescriptor, LoadError> {
        (self.resolver)().await
    }
}

/// Resolves every source concurrently into the table of `kind`.
///
/// Blank names are rejected. Failures are logged and reported, never fatal.
pub async fn load_commands(
    ctx: &Arc<BotContext>,
    kind: CommandKind,
    sources: &[Arc<dyn CommandSource>],
) -> LoadReport {
    let table = ctx.commands().table(kind);
    let outcomes = join_all(sources.iter().map(|source| async move {
        let origin = source.origin().to_string();
        let outcome = source.resolve().await.and_then(|descriptor| {
            if descriptor.name.trim().is_empty() {
                Err(LoadError::missing_name(&origin))
            } else {
                Ok(descriptor)
            }
        });

        match outcome {
            Ok(descriptor) => {
                let name = descriptor.name.clone();
                if table.insert(descriptor).is_some() {
                    warn!(command = %name, kind = %kind, "Command definition replaced an earlier one");
                }
                ctx.log_status(kind.category(), &name, LogStatus::Success);
                Ok(name)
            }
            Err(error) => {
                ctx.log_status(kind.category(), &origin, LogStatus::Error);
                warn!(origin = %origin, kind = %kind, error = %error, "Failed to load command");
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
