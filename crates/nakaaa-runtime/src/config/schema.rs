//! Configuration schema definitions.
//!
//! ```toml
//! [bot]
//! name = "slendertaker"
//! prefix = "$"
//! author = "slendertaker"
//!
//! [emoji]
//! success = "✅"
//!
//! [handler]
//! list = ["event", "command"]
//!
//! [logging]
//! level = "debug"
//! format = "pretty"
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use nakaaa_framework::context::{
    DEFAULT_AUTHOR, DEFAULT_BOT_ICON, DEFAULT_BOT_NAME, DEFAULT_PREFIX,
};
use nakaaa_framework::{BotIdentity, StatusGlyphs};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NakaaaConfig {
    /// Identity, credentials and prefix.
    #[serde(default)]
    pub bot: BotSection,

    /// Glyphs used in status lines.
    #[serde(default)]
    pub emoji: StatusGlyphs,

    /// Startup handlers.
    #[serde(default)]
    pub handler: HandlerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NakaaaConfig {
    /// The branding the framework uses for footers and status lines.
    pub fn identity(&self) -> BotIdentity {
        BotIdentity {
            name: self.bot.name.clone(),
            icon: self.bot.icon.clone(),
            author: self.bot.author.clone(),
            prefix: self.bot.prefix.clone(),
            glyphs: self.emoji.clone(),
        }
    }
}

// =============================================================================
// Bot
// =============================================================================

/// Bot identity section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSection {
    pub name: String,
    pub icon: String,
    /// Gateway credential. Never logged.
    pub token: String,
    pub prefix: String,
    pub author: String,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_BOT_NAME.to_string(),
            icon: DEFAULT_BOT_ICON.to_string(),
            token: String::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl fmt::Debug for BotSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSection")
            .field("name", &self.name)
            .field("icon", &self.icon)
            .field("token", &if self.token.is_empty() { "" } else { "<redacted>" })
            .field("prefix", &self.prefix)
            .field("author", &self.author)
            .finish()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Startup handler section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerSection {
    /// Handler identifiers, run in this order.
    pub list: Vec<String>,
}

impl Default for HandlerSection {
    fn default() -> Self {
        Self {
            list: vec!["event".to_string(), "command".to_string()],
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Required when `output = "file"`.
    pub file_path: Option<PathBuf>,
    pub thread_ids: bool,
    /// Include file and line of each event.
    pub file_location: bool,
    pub span_events: SpanEventConfig,
    /// Per-target levels, e.g. `nakaaa_framework = "debug"`.
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NakaaaConfig::default();
        assert_eq!(config.bot.prefix, "$");
        assert_eq!(config.bot.name, "slendertaker");
        assert_eq!(config.handler.list, vec!["event", "command"]);
        assert_eq!(config.emoji.success, "✅");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_token_is_redacted() {
        let mut bot = BotSection::default();
        bot.token = "super-secret".into();
        let debug = format!("{bot:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_identity_from_config() {
        let mut config = NakaaaConfig::default();
        config.bot.prefix = "!".into();
        config.emoji.error = "x".into();
        let identity = config.identity();
        assert_eq!(identity.prefix, "!");
        assert_eq!(identity.glyphs.error, "x");
    }
}
