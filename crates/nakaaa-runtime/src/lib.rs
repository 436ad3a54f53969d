//! nakaaa Runtime - orchestration layer for nakaaa bots.
//!
//! This crate provides:
//! - Layered configuration (`nakaaa.toml`, `NAKAAA_*` and `BOT_*` variables, `.env`)
//! - Logging setup
//! - The [`NakaaaRuntime`] that starts a bot on a [`Gateway`](nakaaa_core::Gateway)
//!
//! ```ignore
//! use nakaaa_runtime::NakaaaRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = NakaaaRuntime::new();
//!     runtime.register_prefix_command(Arc::new(ping())).await;
//!     runtime.run(Arc::new(MyGateway::default())).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, NakaaaConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{NakaaaRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
