//! Standard embed footers.

use nakaaa_core::{EmbedFooter, InteractionContext};

use crate::context::BotIdentity;

/// Avatar size requested for the requester's icon.
pub const FOOTER_AVATAR_SIZE: u16 = 512;

/// Builds the footer for an embed.
///
/// Without a request, or when `use_default` is set, the footer credits the
/// bot: `"<bot name> | Bot by <author>"` with the bot icon. Otherwise it
/// credits the requester: `"Requested by <username> | Bot by <author>"` with
/// the requester's avatar.
pub fn footer(
    identity: &BotIdentity,
    request: Option<&InteractionContext>,
    use_default: bool,
) -> EmbedFooter {
    match request {
        Some(ctx) if !use_default => {
            let user = ctx.requesting_user();
            EmbedFooter::new(format!(
                "Requested by {} | Bot by {}",
                user.username, identity.author
            ))
            .with_icon(user.display_avatar_url(FOOTER_AVATAR_SIZE))
        }
        _ => EmbedFooter::new(format!("{} | Bot by {}", identity.name, identity.author))
            .with_icon(identity.icon.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockMessage;

    fn identity() -> BotIdentity {
        BotIdentity {
            name: "nakaaa".into(),
            icon: "https://cdn.example/bot.png".into(),
            author: "sleepy".into(),
            ..BotIdentity::default()
        }
    }

    #[test]
    fn test_default_footer() {
        let footer = footer(&identity(), None, false);
        assert_eq!(footer.text, "nakaaa | Bot by sleepy");
        assert_eq!(footer.icon_url.as_deref(), Some("https://cdn.example/bot.png"));
    }

    #[test]
    fn test_requester_footer() {
        let message = MockMessage::new("$help");
        let footer = footer(&identity(), Some(&message.context()), false);
        assert_eq!(footer.text, "Requested by tester | Bot by sleepy");
        assert_eq!(
            footer.icon_url.as_deref(),
            Some("https://cdn.example/avatars/42.png?size=512")
        );
    }

    #[test]
    fn test_forced_default_footer() {
        let message = MockMessage::new("$help");
        let footer = footer(&identity(), Some(&message.context()), true);
        assert_eq!(footer.text, "nakaaa | Bot by sleepy");
    }
}
