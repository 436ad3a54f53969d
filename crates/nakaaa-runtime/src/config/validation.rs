//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotSection, HandlerSection, LogOutput, LoggingConfig, NakaaaConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &NakaaaConfig) -> ConfigResult<()> {
    validate_bot_section(&config.bot)?;
    validate_handler_section(&config.handler)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_section(bot: &BotSection) -> ConfigResult<()> {
    if bot.name.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.name"));
    }

    if bot.prefix.is_empty() {
        return Err(ConfigError::validation("Command prefix cannot be empty"));
    }

    if bot.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Command prefix cannot contain whitespace: {:?}",
            bot.prefix
        )));
    }

    Ok(())
}

fn validate_handler_section(handler: &HandlerSection) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for id in &handler.list {
        if id.trim().is_empty() {
            return Err(ConfigError::validation("Handler identifier cannot be empty"));
        }
        if !seen.insert(id.as_str()) {
            return Err(ConfigError::DuplicateHandler(id.clone()));
        }
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = NakaaaConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_prefix() {
        let mut config = NakaaaConfig::default();
        config.bot.prefix = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));

        config.bot.prefix = "! ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_blank_name() {
        let mut config = NakaaaConfig::default();
        config.bot.name = "  ".into();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "bot.name"
        ));
    }

    #[test]
    fn test_validate_duplicate_handler() {
        let mut config = NakaaaConfig::default();
        config.handler.list = vec!["event".into(), "command".into(), "event".into()];

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateHandler(id)) if id == "event"));
    }

    #[test]
    fn test_validate_empty_handler_list_is_allowed() {
        let mut config = NakaaaConfig::default();
        config.handler.list.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = NakaaaConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("bot.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
