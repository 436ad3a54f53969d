//! Identifiers and the user who triggered a request.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

snowflake!(
    /// Platform user identifier.
    UserId
);
snowflake!(
    /// Platform channel identifier.
    ChannelId
);
snowflake!(
    /// Platform message identifier.
    MessageId
);

/// Avatar shown for users without one of their own.
pub const DEFAULT_AVATAR_URL: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

/// The user on whose behalf a command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestingUser {
    /// Stable identifier.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Base avatar URL without a size parameter.
    pub avatar_url: Option<String>,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
}

impl RequestingUser {
    /// Creates a human user without an avatar.
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar_url: None,
            bot: false,
        }
    }

    /// Sets the avatar URL.
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Marks the user as a bot account.
    pub fn as_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Avatar URL sized for display, falling back to the platform default.
    pub fn display_avatar_url(&self, size: u16) -> String {
        match &self.avatar_url {
            Some(url) if url.contains('?') => format!("{url}&size={size}"),
            Some(url) => format!("{url}?size={size}"),
            None => DEFAULT_AVATAR_URL.to_string(),
        }
    }
}
