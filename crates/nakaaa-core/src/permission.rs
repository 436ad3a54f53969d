//! Platform permission sets.
//!
//! [`Permissions`] is a bit set over the platform's permission flags. Commands
//! declare the set they need from the invoking user and from the bot, and the
//! dispatcher compares those against what the gateway reports for the channel.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

/// A set of platform permission flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);

macro_rules! permission_flags {
    ($($(#[$meta:meta])* $name:ident = $bit:expr => $label:literal;)*) => {
        impl Permissions {
            $(
                $(#[$meta])*
                pub const $name: Self = Self(1 << $bit);
            )*

            const LABELS: &'static [(Self, &'static str)] = &[$((Self::$name, $label)),*];

            /// Every known flag.
            pub const ALL: Self = Self(0 $(| (1 << $bit))*);
        }
    };
}

permission_flags! {
    /// Create channel invites.
    CREATE_INSTANT_INVITE = 0 => "CreateInstantInvite";
    /// Kick members.
    KICK_MEMBERS = 1 => "KickMembers";
    /// Ban members.
    BAN_MEMBERS = 2 => "BanMembers";
    /// Bypasses every other check.
    ADMINISTRATOR = 3 => "Administrator";
    /// Manage channels.
    MANAGE_CHANNELS = 4 => "ManageChannels";
    /// Manage the guild.
    MANAGE_GUILD = 5 => "ManageGuild";
    /// Add reactions.
    ADD_REACTIONS = 6 => "AddReactions";
    /// View channels.
    VIEW_CHANNEL = 10 => "ViewChannel";
    /// Send messages.
    SEND_MESSAGES = 11 => "SendMessages";
    /// Delete and pin messages of others.
    MANAGE_MESSAGES = 13 => "ManageMessages";
    /// Post embeds.
    EMBED_LINKS = 14 => "EmbedLinks";
    /// Upload files.
    ATTACH_FILES = 15 => "AttachFiles";
    /// Read message history.
    READ_MESSAGE_HISTORY = 16 => "ReadMessageHistory";
    /// Mention everyone.
    MENTION_EVERYONE = 17 => "MentionEveryone";
    /// Connect to voice.
    CONNECT = 20 => "Connect";
    /// Speak in voice.
    SPEAK = 21 => "Speak";
    /// Manage roles.
    MANAGE_ROLES = 28 => "ManageRoles";
}

impl Permissions {
    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Builds a set from raw bits. Unknown bits are kept.
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Returns `true` when no flag is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` when every flag in `other` is also in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the flags of `required` this set does not grant.
    ///
    /// A set holding [`Permissions::ADMINISTRATOR`] grants everything.
    pub const fn missing(self, required: Self) -> Self {
        if self.contains(Self::ADMINISTRATOR) {
            Self::NONE
        } else {
            Self(required.0 & !self.0)
        }
    }

    /// Returns `true` when this set grants every flag in `required`.
    pub const fn satisfies(self, required: Self) -> bool {
        self.missing(required).is_empty()
    }

    /// Human-readable names of the known flags in this set.
    pub fn names(self) -> Vec<&'static str> {
        Self::LABELS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, label)| *label)
            .collect()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let mut parts: Vec<String> = self.names().into_iter().map(String::from).collect();
        let unknown = self.0 & !Self::ALL.0;
        if unknown != 0 {
            parts.push(format!("Unknown({unknown:#x})"));
        }
        f.write_str(&parts.join(", "))
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for Permissions {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}
