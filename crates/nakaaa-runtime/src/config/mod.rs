//! Configuration module for the nakaaa runtime.
//!
//! Layered loading (files, environment, `.env`) and validation of the bot
//! identity, startup handler list and logging settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_dotenv};
pub use schema::{
    BotSection, HandlerSection, LogFormat, LogLevel, LogOutput, LoggingConfig, NakaaaConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
