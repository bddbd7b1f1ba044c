//! Outbound state-change notifications and the collaborator seams.

use crate::bans::BanEntry;
use crate::member::Privilege;

/// A state change the tracker reports to application subscribers.
///
/// Updates come out of [`StateTracker::apply`](crate::StateTracker::apply)
/// in event-arrival order, and within one event in the fixed order the
/// event defines (a kick is `UserKicked` then `UserLeft`, never the
/// reverse).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateUpdate {
    /// A NAMES reply added this batch of members, in token order.
    UsersAdded {
        /// Channel the batch landed on.
        channel: String,
        /// Display-case nicks that were added or refreshed.
        nicks: Vec<String>,
    },
    /// A user joined.
    UserJoined {
        /// Channel joined.
        channel: String,
        /// Joiner's nick.
        nick: String,
    },
    /// A user parted. Always followed by [`StateUpdate::UserLeft`].
    UserParted {
        /// Channel left.
        channel: String,
        /// Leaver's nick.
        nick: String,
        /// Part message, if any.
        reason: Option<String>,
    },
    /// A user was kicked. Always followed by [`StateUpdate::UserLeft`].
    UserKicked {
        /// Channel the kick happened on.
        channel: String,
        /// Who kicked.
        actor: String,
        /// Who was removed.
        target: String,
        /// Kick message, if any.
        reason: Option<String>,
    },
    /// A user is gone from a channel, whatever the cause (part, kick, or
    /// quit).
    UserLeft {
        /// Channel the user is gone from.
        channel: String,
        /// The departed nick.
        nick: String,
    },
    /// A non-privilege mode was set.
    ModeAdded {
        /// Channel the mode applies to.
        channel: String,
        /// Who set it.
        actor: String,
        /// The mode letter.
        letter: char,
        /// The letter's argument, as received.
        arg: Option<String>,
    },
    /// A non-privilege mode was removed.
    ModeDeleted {
        /// Channel the mode applied to.
        channel: String,
        /// Who removed it.
        actor: String,
        /// The mode letter.
        letter: char,
        /// The letter's argument, as received.
        arg: Option<String>,
    },
    /// A privilege rank was granted to a member.
    FlagAdded {
        /// Channel it happened on.
        channel: String,
        /// Who granted it.
        actor: String,
        /// The rank granted.
        privilege: Privilege,
        /// The member receiving it, in display case.
        target: String,
    },
    /// A privilege rank was taken from a member.
    FlagDeleted {
        /// Channel it happened on.
        channel: String,
        /// Who revoked it.
        actor: String,
        /// The rank revoked.
        privilege: Privilege,
        /// The member losing it, in display case.
        target: String,
    },
    /// The topic changed, or the join-time topic arrived (`initial`).
    TopicChanged {
        /// Channel whose topic changed.
        channel: String,
        /// Who set it.
        actor: String,
        /// The new text.
        text: String,
        /// True for the join-time reply rather than a live change.
        initial: bool,
    },
    /// One ban-list entry arrived during bulk synchronization.
    BanListEntrySent {
        /// Channel the entry belongs to.
        channel: String,
        /// The entry as stored.
        entry: BanEntry,
    },
    /// Bulk ban-list synchronization finished.
    BanListComplete {
        /// Channel whose list finished.
        channel: String,
    },
    /// The server reported the channel's creation time.
    ChanCreationTimeSent {
        /// Channel the timestamp belongs to.
        channel: String,
        /// Creation time as a unix timestamp.
        timestamp: i64,
    },
}

impl StateUpdate {
    /// The channel this update concerns.
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            StateUpdate::UsersAdded { channel, .. }
            | StateUpdate::UserJoined { channel, .. }
            | StateUpdate::UserParted { channel, .. }
            | StateUpdate::UserKicked { channel, .. }
            | StateUpdate::UserLeft { channel, .. }
            | StateUpdate::ModeAdded { channel, .. }
            | StateUpdate::ModeDeleted { channel, .. }
            | StateUpdate::FlagAdded { channel, .. }
            | StateUpdate::FlagDeleted { channel, .. }
            | StateUpdate::TopicChanged { channel, .. }
            | StateUpdate::BanListEntrySent { channel, .. }
            | StateUpdate::BanListComplete { channel }
            | StateUpdate::ChanCreationTimeSent { channel, .. } => channel,
        }
    }
}

/// Receives every [`StateUpdate`] the tracker produces.
///
/// The tokio shell fans updates out to subscribers one update at a time,
/// in arrival order; within one update, subscribers are called in the
/// order they subscribed.
pub trait StateObserver: Send + Sync {
    /// Called once per update.
    fn on_update(&self, update: &StateUpdate);
}

/// Outbound command hook used by the unban scheduler.
///
/// The one command this crate ever asks for: lifting a ban whose timer
/// expired naturally.
pub trait CommandDispatch: Send + Sync {
    /// Ask the protocol layer to send `MODE <channel> -b <mask>`.
    fn unban(&self, channel: &str, mask: &str);
}
