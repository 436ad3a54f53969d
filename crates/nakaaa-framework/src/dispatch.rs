//! The command gate.
//!
//! [`dispatch_command`] takes one invocation through a fixed sequence:
//!
//! 1. look the command up in the table of its kind; unknown names are ignored
//! 2. check the invoking user's permissions
//! 3. check the bot's permissions
//! 4. check and open the per-user cooldown window
//! 5. run the command body
//!
//! Every rejection is answered through the [`ReplyMediator`]. A command body
//! that fails or panics is logged in full; the user only sees a short
//! generic message.
//!
//! [`ReplyMediator`]: crate::reply::ReplyMediator

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{Instrument, debug, error, info_span, trace};

use crate::command::CommandKind;
use crate::context::BotContext;
use crate::cooldown::CooldownStatus;
use nakaaa_core::{InteractionContext, Permissions};

/// Message shown when a command body fails.
pub const COMMAND_FAILED_MESSAGE: &str = "There was an error while executing this command!";

/// Prefix passed to slash commands.
pub const SLASH_PREFIX: &str = "/";

/// One parsed command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub kind: CommandKind,
    pub name: String,
    pub args: Vec<String>,
    pub prefix: String,
}

impl CommandInvocation {
    pub fn prefixed(name: impl Into<String>, args: Vec<String>, prefix: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Prefix,
            name: name.into(),
            args,
            prefix: prefix.into(),
        }
    }

    pub fn slash(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            kind: CommandKind::Slash,
            name: name.into(),
            args,
            prefix: SLASH_PREFIX.to_string(),
        }
    }
}

/// What happened to an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No command of that name in the table.
    Unknown,
    /// The user lacks these permissions.
    UserMissingPermissions(Permissions),
    /// The bot lacks these permissions.
    BotMissingPermissions(Permissions),
    /// The user is still cooling down.
    CoolingDown { remaining: Duration },
    /// The body ran to completion.
    Executed,
    /// The body returned an error or panicked.
    Failed,
}

/// Splits `content` into a command name and arguments.
///
/// Returns `None` when the content does not start with `prefix` or names no
/// command. The name is lower-cased; arguments are whitespace-separated.
pub fn parse_prefixed(content: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = content.strip_prefix(prefix)?;
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_lowercase();
    Some((name, tokens.map(str::to_string).collect()))
}

/// Runs one invocation through the gate.
pub async fn dispatch_command(
    ctx: &Arc<BotContext>,
    interaction: InteractionContext,
    invocation: CommandInvocation,
) -> DispatchOutcome {
    let Some(command) = ctx.commands().table(invocation.kind).get(&invocation.name) else {
        trace!(command = %invocation.name, kind = %invocation.kind, "Unknown command");
        return DispatchOutcome::Unknown;
    };

    let user = interaction.requesting_user().clone();
    let span = info_span!(
        "command",
        command = %command.name(),
        kind = %invocation.kind,
        user = %user.id,
    );

    async move {
        let missing = interaction.user_permissions().missing(command.user_permissions());
        if !missing.is_empty() {
            debug!(missing = %missing, "User lacks permissions");
            ctx.replies()
                .send_text(
                    &interaction,
                    format!("You don't have `{missing}` permission(s) to use this command!"),
                    true,
                )
                .await;
            return DispatchOutcome::UserMissingPermissions(missing);
        }

        let missing = interaction.bot_permissions().missing(command.bot_permissions());
        if !missing.is_empty() {
            debug!(missing = %missing, "Bot lacks permissions");
            ctx.replies()
                .send_text(
                    &interaction,
                    format!("I don't have `{missing}` permission(s) to run this command!"),
                    true,
                )
                .await;
            return DispatchOutcome::BotMissingPermissions(missing);
        }

        let window = command.cooldown();
        if let CooldownStatus::Active { remaining } =
            ctx.cooldowns().check(command.name(), user.id, window)
        {
            debug!(remaining_secs = remaining.as_secs_f64(), "Command cooling down");
            ctx.replies()
                .send_text(
                    &interaction,
                    format!(
                        "Please wait {:.1} more second(s) before reusing the `{}` command.",
                        remaining.as_secs_f64(),
                        command.name()
                    ),
                    true,
                )
                .await;
            return DispatchOutcome::CoolingDown { remaining };
        }

        let body = command.invoke(
            Arc::clone(ctx),
            interaction.clone(),
            invocation.args,
            invocation.prefix,
        );
        match AssertUnwindSafe(body).catch_unwind().await {
            Ok(Ok(())) => {
                trace!("Command executed");
                DispatchOutcome::Executed
            }
            Ok(Err(err)) => {
                error!(error = %err, error_debug = ?err, "Command failed");
                ctx.replies()
                    .send_text(&interaction, COMMAND_FAILED_MESSAGE, true)
                    .await;
                DispatchOutcome::Failed
            }
            Err(_) => {
                error!("Command panicked");
                ctx.replies()
                    .send_text(&interaction, COMMAND_FAILED_MESSAGE, true)
                    .await;
                DispatchOutcome::Failed
            }
        }
    }
    .instrument(span)
    .await
}
