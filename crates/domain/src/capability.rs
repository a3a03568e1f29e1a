//! Platform capability bits using bitflags.
//!
//! Bit positions follow Discord's guild permission layout so values coming
//! from an interaction payload can be used unchanged.

use bitflags::bitflags;
use gatehouse_core::AppError;

bitflags! {
    /// Platform-native permission flags held by an actor in a tenant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct Capabilities: u64 {
        /// Create invite links.
        const CREATE_INSTANT_INVITE = 1 << 0;
        /// Kick members from the guild.
        const KICK_MEMBERS          = 1 << 1;
        /// Ban members from the guild.
        const BAN_MEMBERS           = 1 << 2;
        /// Implicitly grants every other capability.
        const ADMINISTRATOR         = 1 << 3;
        /// Create, edit and delete channels.
        const MANAGE_CHANNELS       = 1 << 4;
        /// Modify guild settings.
        const MANAGE_GUILD          = 1 << 5;
        /// Add reactions to messages.
        const ADD_REACTIONS         = 1 << 6;
        /// Read the guild audit log.
        const VIEW_AUDIT_LOG        = 1 << 7;
        /// View channels.
        const VIEW_CHANNEL          = 1 << 10;
        /// Send messages.
        const SEND_MESSAGES         = 1 << 11;
        /// Delete or pin messages of other members.
        const MANAGE_MESSAGES       = 1 << 13;
        /// Mention @everyone and @here.
        const MENTION_EVERYONE      = 1 << 17;
        /// Server-mute members in voice.
        const MUTE_MEMBERS          = 1 << 22;
        /// Server-deafen members in voice.
        const DEAFEN_MEMBERS        = 1 << 23;
        /// Move members between voice channels.
        const MOVE_MEMBERS          = 1 << 24;
        /// Change other members' nicknames.
        const MANAGE_NICKNAMES      = 1 << 27;
        /// Create and edit roles below the actor's highest role.
        const MANAGE_ROLES          = 1 << 28;
        /// Manage webhooks.
        const MANAGE_WEBHOOKS       = 1 << 29;
        /// Manage scheduled events.
        const MANAGE_EVENTS         = 1 << 33;
        /// Manage threads.
        const MANAGE_THREADS        = 1 << 34;
        /// Time out members.
        const MODERATE_MEMBERS      = 1 << 40;
    }
}

impl Capabilities {
    /// Capabilities any of which qualifies an actor for moderation operations.
    pub const MODERATION_DEFAULT: Self = Self::KICK_MEMBERS
        .union(Self::BAN_MEMBERS)
        .union(Self::MODERATE_MEMBERS)
        .union(Self::MANAGE_MESSAGES);

    /// Returns whether the actor holds the administrator bit.
    #[must_use]
    pub fn is_administrator(self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }

    /// Returns whether these capabilities satisfy at least one required bit.
    ///
    /// Administrators satisfy every non-empty requirement.
    #[must_use]
    pub fn satisfies_any(self, required: Self) -> bool {
        if required.is_empty() {
            return false;
        }

        self.is_administrator() || self.intersects(required)
    }

    /// Parses one capability constant name such as `BAN_MEMBERS`.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_name(value.trim())
            .ok_or_else(|| AppError::Validation(format!("unknown capability '{value}'")))
    }

    /// Returns the constant names of every set bit.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Capabilities;

    #[test]
    fn administrator_satisfies_any_requirement() {
        let admin = Capabilities::ADMINISTRATOR;
        assert!(admin.satisfies_any(Capabilities::BAN_MEMBERS));
        assert!(!admin.satisfies_any(Capabilities::empty()));
    }

    #[test]
    fn any_overlapping_bit_satisfies_requirement() {
        let actor = Capabilities::KICK_MEMBERS | Capabilities::SEND_MESSAGES;
        assert!(actor.satisfies_any(Capabilities::MODERATION_DEFAULT));
        assert!(!Capabilities::SEND_MESSAGES.satisfies_any(Capabilities::MODERATION_DEFAULT));
    }

    #[test]
    fn capability_names_roundtrip() {
        let parsed = Capabilities::from_transport("MODERATE_MEMBERS");
        assert!(parsed.is_ok());
        assert_eq!(
            parsed.map(Capabilities::names).unwrap_or_default(),
            vec!["MODERATE_MEMBERS"]
        );
        assert!(Capabilities::from_transport("FLY").is_err());
    }

    #[test]
    fn discord_bit_positions_are_preserved() {
        assert_eq!(Capabilities::ADMINISTRATOR.bits(), 0x8);
        assert_eq!(Capabilities::MODERATE_MEMBERS.bits(), 1 << 40);
    }
}
