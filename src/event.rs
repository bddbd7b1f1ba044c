//! Inbound protocol events.
//!
//! The protocol/parsing layer turns each state-bearing server line into
//! exactly one [`StateEvent`] and feeds it to the tracker in wire order.
//! A compound mode line (`MODE #chan +nk pass`) arrives as one event per
//! letter, with the argument attached to the letter that consumed it.

/// One parsed, state-bearing server line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateEvent {
    /// A user (possibly the local client) joined a channel.
    Join {
        /// Target channel.
        channel: String,
        /// Joiner's nick.
        nick: String,
    },
    /// A user left a channel of their own accord.
    Part {
        /// Channel left.
        channel: String,
        /// Leaver's nick.
        nick: String,
        /// Part message, if one was given.
        reason: Option<String>,
    },
    /// One user removed another from a channel.
    Kick {
        /// Channel the kick happened on.
        channel: String,
        /// Nick doing the kicking.
        actor: String,
        /// Nick being removed.
        target: String,
        /// Kick message, if one was given.
        reason: Option<String>,
    },
    /// A user disconnected from the network entirely.
    Quit {
        /// Quitter's nick.
        nick: String,
        /// Quit message, if one was given.
        reason: Option<String>,
    },
    /// A user changed nicks, network-wide.
    NickChange {
        /// The nick being given up.
        old_nick: String,
        /// The nick now in use.
        new_nick: String,
    },
    /// One channel mode delta.
    Mode {
        /// Channel the mode applies to.
        channel: String,
        /// Nick that set the mode.
        actor: String,
        /// The mode letter.
        letter: char,
        /// The letter's argument: key text, limit digits, ban mask, or a
        /// target nick for the privilege letters.
        arg: Option<String>,
        /// True for `+`, false for `-`.
        is_add: bool,
    },
    /// The topic was set or replaced.
    Topic {
        /// Channel whose topic changed.
        channel: String,
        /// Nick that set it (or the server name for the join-time reply).
        actor: String,
        /// New topic text.
        text: String,
        /// True when this is the join-time topic reply rather than a live
        /// change.
        is_initial: bool,
    },
    /// One 353 (NAMES) reply line.
    NamesReply {
        /// Channel the reply describes.
        channel: String,
        /// Space-separated nicks, each optionally carrying a leading
        /// privilege-symbol run (`"@Alice +Bob Carol"`).
        tokens: String,
    },
    /// One 367 (ban list) entry.
    BanListEntry {
        /// Channel the ban belongs to.
        channel: String,
        /// The banned mask.
        mask: String,
        /// Who set the ban, when the server says.
        set_by: Option<String>,
        /// Unix timestamp of the ban, when the server says.
        set_at: Option<i64>,
    },
    /// 368: the ban list is fully transferred.
    BanListComplete {
        /// Channel whose list finished.
        channel: String,
    },
    /// 329: the channel's creation time.
    CreationTime {
        /// Channel the timestamp belongs to.
        channel: String,
        /// Creation time as a unix timestamp.
        timestamp: i64,
    },
}

impl StateEvent {
    /// A join by `nick`.
    pub fn join(channel: impl Into<String>, nick: impl Into<String>) -> Self {
        StateEvent::Join {
            channel: channel.into(),
            nick: nick.into(),
        }
    }

    /// A part with no message.
    pub fn part(channel: impl Into<String>, nick: impl Into<String>) -> Self {
        StateEvent::Part {
            channel: channel.into(),
            nick: nick.into(),
            reason: None,
        }
    }

    /// A kick with no message.
    pub fn kick(
        channel: impl Into<String>,
        actor: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        StateEvent::Kick {
            channel: channel.into(),
            actor: actor.into(),
            target: target.into(),
            reason: None,
        }
    }

    /// A quit with no message.
    pub fn quit(nick: impl Into<String>) -> Self {
        StateEvent::Quit {
            nick: nick.into(),
            reason: None,
        }
    }

    /// A nick change.
    pub fn nick_change(old_nick: impl Into<String>, new_nick: impl Into<String>) -> Self {
        StateEvent::NickChange {
            old_nick: old_nick.into(),
            new_nick: new_nick.into(),
        }
    }

    /// A `+<letter>` mode delta.
    pub fn mode_add(
        channel: impl Into<String>,
        actor: impl Into<String>,
        letter: char,
        arg: Option<&str>,
    ) -> Self {
        StateEvent::Mode {
            channel: channel.into(),
            actor: actor.into(),
            letter,
            arg: arg.map(str::to_string),
            is_add: true,
        }
    }

    /// A `-<letter>` mode delta.
    pub fn mode_del(
        channel: impl Into<String>,
        actor: impl Into<String>,
        letter: char,
        arg: Option<&str>,
    ) -> Self {
        StateEvent::Mode {
            channel: channel.into(),
            actor: actor.into(),
            letter,
            arg: arg.map(str::to_string),
            is_add: false,
        }
    }

    /// A NAMES reply line.
    pub fn names(channel: impl Into<String>, tokens: impl Into<String>) -> Self {
        StateEvent::NamesReply {
            channel: channel.into(),
            tokens: tokens.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_the_obvious_fields() {
        assert_eq!(
            StateEvent::join("#rust", "alice"),
            StateEvent::Join {
                channel: "#rust".to_string(),
                nick: "alice".to_string(),
            }
        );
        assert_eq!(
            StateEvent::mode_add("#rust", "alice", 'k', Some("pw")),
            StateEvent::Mode {
                channel: "#rust".to_string(),
                actor: "alice".to_string(),
                letter: 'k',
                arg: Some("pw".to_string()),
                is_add: true,
            }
        );
        assert_eq!(
            StateEvent::quit("bob"),
            StateEvent::Quit {
                nick: "bob".to_string(),
                reason: None,
            }
        );
    }
}
