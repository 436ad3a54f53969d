//! The demo's commands.

use chrono::Utc;
use nakaaa::core::InteractionKind;
use nakaaa::framework::IntrospectError;
use nakaaa::prelude::*;

/// Bounds accepted by `clear`.
const CLEAR_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
const CLEAR_DEFAULT: u32 = 10;

/// Every command this bot serves as prefix commands.
pub fn all() -> Vec<CommandDescriptor> {
    vec![ping(), help(), clear()]
}

pub fn ping() -> CommandDescriptor {
    CommandDescriptor::builder("ping")
        .description("Check that the bot is alive.")
        .category("info")
        .cooldown(5)
        .run(|ctx, interaction, _args, _prefix| async move {
            let up = (Utc::now() - ctx.started_at()).num_seconds().max(0);
            let embed = EmbedData::new()
                .title("Pong!")
                .description(format!("Up for {}m {}s", up / 60, up % 60))
                .footer(footer(ctx.identity(), Some(&interaction), false));
            ctx.replies()
                .send_embed(&interaction, embed, false, false)
                .await;
            Ok(())
        })
}

/// Lists commands, or describes one when given a name.
pub fn help() -> CommandDescriptor {
    CommandDescriptor::builder("help")
        .description("List commands or describe one.")
        .category("info")
        .run(|ctx, interaction, args, prefix| async move {
            let kind = match interaction.kind() {
                InteractionKind::Message => CommandKind::Prefix,
                InteractionKind::Interaction => CommandKind::Slash,
            };
            let table = ctx.commands().table(kind);

            let embed = match args.first() {
                Some(name) => match table.get(name) {
                    Some(command) => describe(&command, &prefix),
                    None => EmbedData::new()
                        .title("Help")
                        .description(IntrospectError::CommandNotFound(name.clone()).to_string()),
                },
                None => {
                    let lines: Vec<String> = table
                        .summaries()
                        .into_iter()
                        .map(|s| format!("{prefix}{} - {}", s.name, s.description))
                        .collect();
                    EmbedData::new()
                        .title(format!("{} commands", ctx.identity().name))
                        .description(lines.join("\n"))
                }
            };

            ctx.replies()
                .send_embed(
                    &interaction,
                    embed.footer(footer(ctx.identity(), Some(&interaction), false)),
                    false,
                    false,
                )
                .await;
            Ok(())
        })
}

/// Help entry for one command, with its effective cooldown.
fn describe(command: &CommandDescriptor, prefix: &str) -> EmbedData {
    EmbedData::new()
        .title(format!("{prefix}{}", command.name()))
        .description(format!(
            "{}\nCategory: {}\nCooldown: {}s",
            command.description(),
            command.category(),
            command.cooldown_secs()
        ))
}

/// Clears the terminal.
pub fn clear() -> CommandDescriptor {
    CommandDescriptor::builder("clear")
        .description("Clear messages in a channel.")
        .category("misc")
        .user_permissions(Permissions::SEND_MESSAGES)
        .bot_permissions(Permissions::SEND_MESSAGES)
        .cooldown(5)
        .run(|ctx, interaction, args, _prefix| async move {
            let amount = match args.first().map(|a| a.parse::<u32>()) {
                None => CLEAR_DEFAULT,
                Some(Ok(n)) if CLEAR_RANGE.contains(&n) => n,
                Some(_) => {
                    ctx.replies()
                        .send_text(
                            &interaction,
                            format!(
                                "Please provide a number between {} and {}.",
                                CLEAR_RANGE.start(),
                                CLEAR_RANGE.end()
                            ),
                            true,
                        )
                        .await;
                    return Ok(());
                }
            };

            print!("\x1B[2J\x1B[1;1H");
            ctx.replies()
                .send_text(&interaction, format!("Cleared {amount} message(s)."), true)
                .await;
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_matches_misc_defaults() {
        let summary = clear().summary();
        assert_eq!(summary.category, "misc");
        assert_eq!(summary.cooldown, 5);
        assert_eq!(summary.user_permissions, vec!["SendMessages"]);
        assert_eq!(summary.bot_permissions, vec!["SendMessages"]);
    }

    #[test]
    fn test_help_uses_default_cooldown() {
        assert_eq!(help().cooldown_secs(), 3);
    }

    #[test]
    fn test_describe_shows_effective_cooldown() {
        let short = CommandDescriptor::builder("roll")
            .cooldown(2)
            .run(|_ctx, _interaction, _args, _prefix| async { Ok(()) });
        let description = describe(&short, "$").description.unwrap_or_default();
        assert!(description.ends_with("Cooldown: 2s"));

        let description = describe(&help(), "$").description.unwrap_or_default();
        assert!(description.ends_with("Cooldown: 3s"));
    }

    #[test]
    fn test_all_names() {
        let names: Vec<String> = all().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["ping", "help", "clear"]);
    }
}
