//! Reply delivery.
//!
//! [`ReplyMediator`] hides the difference between answering a text message and
//! answering a slash interaction:
//!
//! | context                     | primary action          |
//! |-----------------------------|-------------------------|
//! | message, bot may post       | send into the channel   |
//! | message, bot may not post   | reply to the message    |
//! | interaction, deferred       | edit the deferred reply |
//! | interaction, already replied| defer                   |
//! | interaction, fresh          | initial reply           |
//!
//! If the primary action fails, exactly one fallback reply carrying
//! [`FALLBACK_MESSAGE`] is attempted with the same visibility flags. The
//! outcome is reported as a [`Delivery`]; nothing is ever raised to the caller.

use chrono::Utc;
use tracing::{debug, error, warn};

use nakaaa_core::{
    EmbedData, InteractionContext, ReplyPayload, SentReply, TransportError, TransportResult,
};

/// Text of the fallback reply.
pub const FALLBACK_MESSAGE: &str = "Something went wrong";

/// How a reply was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The primary action succeeded.
    Primary(SentReply),
    /// The primary action failed and the fallback was delivered.
    Fallback(SentReply),
    /// Neither action succeeded.
    Failed,
}

impl Delivery {
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// The platform's answer, if anything was delivered.
    pub fn sent(&self) -> Option<&SentReply> {
        match self {
            Self::Primary(sent) | Self::Fallback(sent) => Some(sent),
            Self::Failed => None,
        }
    }
}

/// Routes replies to the right platform call and applies the fallback.
#[derive(Debug, Clone)]
pub struct ReplyMediator {
    fallback_message: String,
}

impl Default for ReplyMediator {
    fn default() -> Self {
        Self {
            fallback_message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl ReplyMediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a different fallback text.
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback_message
    }

    /// Delivers `payload` in response to `ctx`.
    pub async fn send(&self, ctx: &InteractionContext, payload: ReplyPayload) -> Delivery {
        match Self::deliver(ctx, &payload).await {
            Ok(sent) => Delivery::Primary(sent),
            Err(error) => {
                warn!(kind = %ctx.kind(), error = %error, "Reply failed, sending fallback");
                self.fallback(ctx, payload.ephemeral, payload.fetch_reply).await
            }
        }
    }

    /// Builds an embed stamped with the current time and delivers it.
    ///
    /// An embed that violates platform limits is not sent; the fallback reply
    /// is delivered instead.
    pub async fn send_embed(
        &self,
        ctx: &InteractionContext,
        data: EmbedData,
        ephemeral: bool,
        fetch_reply: bool,
    ) -> Delivery {
        match data.build(Utc::now()) {
            Ok(embed) => {
                let payload = ReplyPayload::embed(embed)
                    .ephemeral(ephemeral)
                    .fetch_reply(fetch_reply);
                self.send(ctx, payload).await
            }
            Err(error) => {
                warn!(kind = %ctx.kind(), error = %error, "Invalid embed, sending fallback");
                self.fallback(ctx, ephemeral, fetch_reply).await
            }
        }
    }

    /// Delivers a plain text reply.
    pub async fn send_text(
        &self,
        ctx: &InteractionContext,
        content: impl Into<String>,
        ephemeral: bool,
    ) -> Delivery {
        self.send(ctx, ReplyPayload::text(content).ephemeral(ephemeral))
            .await
    }

    async fn deliver(ctx: &InteractionContext, payload: &ReplyPayload) -> TransportResult<SentReply> {
        match ctx {
            InteractionContext::Message(message) => {
                if message.can_send_in_channel() {
                    message.send_to_channel(payload).await
                } else {
                    debug!(channel = %message.channel_id(), "Cannot post in channel, replying instead");
                    message.reply(payload).await
                }
            }
            InteractionContext::Interaction(interaction) => {
                if interaction.is_deferred() {
                    interaction.edit_reply(payload).await
                } else if interaction.is_replied() {
                    interaction.defer_reply(payload.ephemeral).await
                } else {
                    interaction.reply(payload).await
                }
            }
        }
    }

    async fn fallback(&self, ctx: &InteractionContext, ephemeral: bool, fetch_reply: bool) -> Delivery {
        let payload = ReplyPayload::text(&self.fallback_message)
            .ephemeral(ephemeral)
            .fetch_reply(fetch_reply);
        match ctx.reply(&payload).await {
            Ok(sent) => Delivery::Fallback(sent),
            Err(error) => {
                log_fallback_failure(ctx, &error);
                Delivery::Failed
            }
        }
    }
}

fn log_fallback_failure(ctx: &InteractionContext, error: &TransportError) {
    error!(
        kind = %ctx.kind(),
        user = %ctx.requesting_user().id,
        error = %error,
        terminal = error.is_terminal(),
        "Fallback reply failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockInteraction, MockMessage};
    use nakaaa_core::Permissions;

    #[tokio::test]
    async fn test_message_posts_into_channel() {
        let message = MockMessage::new("$ping");
        let ctx = message.context();

        let delivery = ReplyMediator::new().send_text(&ctx, "pong", false).await;

        assert!(delivery.is_primary());
        assert_eq!(message.calls(), vec![Call::SendToChannel(Some("pong".into()))]);
    }

    #[tokio::test]
    async fn test_message_replies_without_send_permission() {
        let message = MockMessage::new("$ping").with_bot_permissions(Permissions::VIEW_CHANNEL);
        let ctx = message.context();

        ReplyMediator::new().send_text(&ctx, "pong", false).await;

        assert_eq!(message.calls(), vec![Call::Reply(Some("pong".into()))]);
    }

    #[tokio::test]
    async fn test_fresh_interaction_replies() {
        let interaction = MockInteraction::new("ping");
        let ctx = interaction.context();

        let delivery = ReplyMediator::new().send_text(&ctx, "pong", true).await;

        assert!(delivery.is_primary());
        assert_eq!(interaction.calls(), vec![Call::Reply(Some("pong".into()))]);
        assert!(interaction.is_replied_now());
    }

    #[tokio::test]
    async fn test_deferred_interaction_edits() {
        let interaction = MockInteraction::new("ping").deferred();
        let ctx = interaction.context();

        ReplyMediator::new().send_text(&ctx, "pong", false).await;

        assert_eq!(interaction.calls(), vec![Call::EditReply(Some("pong".into()))]);
    }

    #[tokio::test]
    async fn test_replied_interaction_defers() {
        let interaction = MockInteraction::new("ping").replied();
        let ctx = interaction.context();

        ReplyMediator::new().send_text(&ctx, "pong", true).await;

        assert_eq!(interaction.calls(), vec![Call::DeferReply { ephemeral: true }]);
    }

    #[tokio::test]
    async fn test_failure_sends_one_fallback() {
        let interaction = MockInteraction::new("ping").failing_first(1);
        let ctx = interaction.context();

        let delivery = ReplyMediator::new().send_text(&ctx, "pong", true).await;

        assert!(matches!(delivery, Delivery::Fallback(_)));
        assert_eq!(
            interaction.calls(),
            vec![
                Call::Reply(Some("pong".into())),
                Call::Reply(Some(FALLBACK_MESSAGE.into())),
            ]
        );
        assert_eq!(interaction.last_ephemeral(), Some(true));
    }

    fn flagged_pong() -> ReplyPayload {
        ReplyPayload::text("pong").ephemeral(true).fetch_reply(true)
    }

    fn assert_flagged_fallback(sent: &[ReplyPayload]) {
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].content.as_deref(), Some(FALLBACK_MESSAGE));
        assert!(sent[1].ephemeral);
        assert!(sent[1].fetch_reply);
    }

    #[tokio::test]
    async fn test_interaction_fallback_keeps_flags() {
        let interaction = MockInteraction::new("ping").failing_first(1);

        let delivery = ReplyMediator::new()
            .send(&interaction.context(), flagged_pong())
            .await;

        assert!(matches!(delivery, Delivery::Fallback(_)));
        assert_flagged_fallback(&interaction.payloads());
    }

    #[tokio::test]
    async fn test_message_fallback_keeps_flags() {
        let message = MockMessage::new("$ping").failing_first(1);

        let delivery = ReplyMediator::new()
            .send(&message.context(), flagged_pong())
            .await;

        assert!(matches!(delivery, Delivery::Fallback(_)));
        assert_flagged_fallback(&message.payloads());
    }

    #[tokio::test]
    async fn test_fallback_failure_is_reported_not_raised() {
        let message = MockMessage::new("$ping").failing_first(2);
        let ctx = message.context();

        let delivery = ReplyMediator::new().send_text(&ctx, "pong", false).await;

        assert!(delivery.is_failed());
        assert_eq!(message.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_send_embed_stamps_and_sends() {
        let interaction = MockInteraction::new("help");
        let ctx = interaction.context();

        let delivery = ReplyMediator::new()
            .send_embed(&ctx, EmbedData::new().title("Help").color(0x2F3136), false, true)
            .await;

        assert!(delivery.is_primary());
        let sent = interaction.payloads();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].fetch_reply);
        assert!(sent[0].embeds[0].timestamp().is_some());
    }

    #[tokio::test]
    async fn test_invalid_embed_sends_fallback() {
        let interaction = MockInteraction::new("help");
        let ctx = interaction.context();

        let delivery = ReplyMediator::new()
            .send_embed(&ctx, EmbedData::new().color(u32::MAX), true, false)
            .await;

        assert!(matches!(delivery, Delivery::Fallback(_)));
        assert_eq!(
            interaction.calls(),
            vec![Call::Reply(Some(FALLBACK_MESSAGE.into()))]
        );
    }
}
