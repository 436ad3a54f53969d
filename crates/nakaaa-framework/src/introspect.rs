//! Read-only views of the registries, serializable for dashboards.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::command::{CommandKind, CommandTable};
use crate::error::IntrospectError;

/// Public description of one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSummary {
    pub name: String,
    pub description: String,
    pub category: String,
    /// Declared cooldown in seconds; becomes the default once normalised.
    pub cooldown: i64,
    pub user_permissions: Vec<String>,
    pub bot_permissions: Vec<String>,
}

/// Count and names of one command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandListing {
    pub kind: CommandKind,
    pub count: usize,
    pub names: Vec<String>,
}

impl CommandListing {
    pub fn of(table: &CommandTable) -> Self {
        let names = table.names();
        Self {
            kind: table.kind(),
            count: names.len(),
            names,
        }
    }
}

/// Snapshot of a running bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub bot_name: String,
    pub started_at: DateTime<Utc>,
    pub events: Vec<String>,
    pub prefix_commands: Vec<String>,
    pub slash_commands: Vec<String>,
    pub active_cooldowns: usize,
}

/// Looks up one command, answering not-found with an error.
pub fn lookup(table: &CommandTable, name: &str) -> Result<CommandSummary, IntrospectError> {
    table.lookup(name)
}
