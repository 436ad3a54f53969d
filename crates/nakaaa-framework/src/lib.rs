//! # nakaaa Framework
//!
//! The dispatch core of a nakaaa bot.
//!
//! # Architecture
//!
//! ```text
//! Gateway ──► EventSink ──► BotContext::emit ──► SubscriptionTable
//!                                                    │
//!                          ┌─────────────────────────┴──────────────┐
//!                          ▼                                        ▼
//!                 messageCreate listener                 interactionCreate listener
//!                          │ parse_prefixed                         │
//!                          └──────────────► dispatch_command ◄──────┘
//!                                               │
//!                     permissions ─► cooldown ─► command body ─► ReplyMediator
//! ```
//!
//! - [`handler`]: named startup routines run in configured order
//! - [`event`]: event definitions, the event table, subscriptions
//! - [`command`]: command descriptors and the prefix/slash tables
//! - [`cooldown`]: per-command, per-user rate limiting
//! - [`reply`]: context-aware reply delivery with one fallback
//! - [`footer`]: standard embed footers
//! - [`dispatch`]: the command gate
//! - [`introspect`]: serializable read-only views

pub mod builtin;
pub mod command;
pub mod context;
pub mod cooldown;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod footer;
pub mod handler;
pub mod introspect;
pub mod reply;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{
    CommandBuilder, CommandDescriptor, CommandFn, CommandKind, CommandSource, CommandTable,
    CommandTables, DEFAULT_COOLDOWN_SECS, FnCommandSource, command_fn, command_source,
    load_commands,
};
pub use context::{BotContext, BotIdentity, Catalog};
pub use cooldown::{CooldownStatus, CooldownTracker};
pub use dispatch::{CommandInvocation, DispatchOutcome, dispatch_command, parse_prefixed};
pub use error::{BoxError, IntrospectError, LoadError, LoadResult};
pub use event::{
    EventDefinition, EventDescriptor, EventFn, EventSource, EventTable, FnEventSource,
    Subscription, SubscriptionTable, event_fn, event_source, load_events,
};
pub use footer::footer;
pub use handler::{HANDLERS, HandlerDescriptor, HandlerFn, HandlerRegistry};
pub use introspect::{CommandListing, CommandSummary, StatusSnapshot};
pub use reply::{Delivery, FALLBACK_MESSAGE, ReplyMediator};
pub use status::{LoadReport, LogStatus, StatusGlyphs};

// Re-export linkme so downstream crates can contribute handlers
pub use linkme;
