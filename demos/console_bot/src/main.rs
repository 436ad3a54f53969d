//! Console Bot Example
//!
//! Runs a nakaaa bot whose "chat platform" is the terminal: every line typed
//! on stdin becomes a text message, every reply is printed to stdout.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --config demos/console_bot/nakaaa.toml
//! ```
//!
//! Then type `$help`, `$ping` or `$clear 5`.

mod commands;
mod gateway;

use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use clap::Parser;
use nakaaa::framework::HANDLERS;
use nakaaa::linkme::distributed_slice;
use nakaaa::prelude::*;
use tracing::info;

use crate::gateway::ConsoleGateway;

#[derive(Debug, Parser)]
#[command(about = "A nakaaa bot on your terminal")]
struct Args {
    /// Configuration file (defaults to ./nakaaa.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// Name of the console user.
    #[arg(short, long, default_value = "console")]
    user: String,

    /// Startup handlers to run, overriding `handler.list`.
    #[arg(long, value_delimiter = ',')]
    handlers: Option<Vec<String>>,

    /// Run without any user permissions, to see the permission gate.
    #[arg(long)]
    no_permissions: bool,
}

// ============================================================================
// Startup Handler
// ============================================================================

#[distributed_slice(HANDLERS)]
#[linkme(crate = nakaaa::linkme)]
static ANNOUNCE: HandlerDescriptor = HandlerDescriptor::new("announce", announce);

/// Logs what the built-in handlers loaded.
fn announce(
    ctx: Arc<BotContext>,
) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>> {
    Box::pin(async move {
        let status = ctx.status();
        info!(
            events = ?status.events,
            commands = ?status.prefix_commands,
            "{} is ready with prefix {}",
            status.bot_name,
            ctx.prefix()
        );
        Ok(())
    })
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut builder = NakaaaRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = args.profile {
        builder = builder.profile(profile);
    }
    if let Some(handlers) = args.handlers {
        builder = builder.set("handler.list", handlers);
    }
    let runtime = builder.build()?;

    for command in commands::all() {
        runtime.register_prefix_command(Arc::new(command)).await;
    }

    let mut gateway = ConsoleGateway::new(args.user);
    if args.no_permissions {
        gateway = gateway.with_permissions(Permissions::NONE);
    }

    runtime.run(Arc::new(gateway)).await?;
    info!(stats = %runtime.stats().await, "Console bot stopped");

    Ok(())
}
