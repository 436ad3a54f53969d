//! Gateway contract.
//!
//! A [`Gateway`] owns the connection to the chat platform. Once connected it
//! pushes every event it receives into the [`EventSink`] it was given; the
//! framework never polls. Implementations are free to spawn their own read
//! loop and to deliver events concurrently.
//!
//! ```rust,ignore
//! #[async_trait]
//! impl Gateway for MyGateway {
//!     fn name(&self) -> &'static str { "my-platform" }
//!
//!     async fn connect(&self, token: &str, sink: BoxedEventSink) -> TransportResult<()> {
//!         let socket = self.open(token).await?;
//!         tokio::spawn(async move {
//!             while let Some(event) = socket.next_event().await {
//!                 sink.emit(event).await;
//!             }
//!         });
//!         Ok(())
//!     }
//!
//!     async fn shutdown(&self) { self.close().await }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::event::GatewayEvent;

/// Receiver of gateway events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers one event. Never fails: listener errors stay inside the sink.
    async fn emit(&self, event: GatewayEvent);
}

/// Shared event sink.
pub type BoxedEventSink = Arc<dyn EventSink>;

/// Connection to a chat platform.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether [`connect`](Self::connect) needs a non-empty token.
    fn requires_token(&self) -> bool {
        true
    }

    /// Opens the connection and starts delivering events to `sink`.
    async fn connect(&self, token: &str, sink: BoxedEventSink) -> TransportResult<()>;

    /// Closes the connection. Events may still arrive until this returns.
    async fn shutdown(&self);
}

/// Shared gateway.
pub type BoxedGateway = Arc<dyn Gateway>;
