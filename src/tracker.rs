//! The channel-state mirror.
//!
//! [`StateTracker`] is the sans-IO core of the crate: it owns every tracked
//! channel and user, consumes parsed [`StateEvent`]s one at a time, and
//! returns the [`StateUpdate`]s each event produced, in order. It performs
//! no IO and reads no clock of its own; the tokio shell feeds it events and
//! drives its unban deadlines.
//!
//! Events that do not fit the mirror (an untracked channel, an unknown
//! member) are dropped with a `debug` log rather than surfaced as errors:
//! the server is authoritative, and a stray line usually means we have not
//! joined yet or already left.

use std::collections::HashMap;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::bans::BanEntry;
use crate::casemap::{irc_eq, irc_to_lower};
use crate::channel::{Channel, Topic};
use crate::event::StateEvent;
use crate::member::{split_names_token, Privilege};
use crate::unban::{UnbanQueue, UnbanRequest};
use crate::update::StateUpdate;
use crate::user::{User, UserTable};

/// Startup parameters for a [`StateTracker`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerConfig {
    /// The local client's nick at connect time. Kept current afterwards by
    /// nick-change events.
    pub nickname: String,
}

impl TrackerConfig {
    /// Config for a client connected as `nickname`.
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
        }
    }
}

/// Client-side mirror of channel state, fed by parsed server events.
///
/// Channels are keyed by RFC 1459 folded name; every nick lookup folds the
/// same way. The local client's own join is what opens a channel in the
/// mirror, and its own part, kick, or quit is what closes one.
#[derive(Debug)]
pub struct StateTracker {
    nick: String,
    channels: HashMap<String, Channel>,
    users: UserTable,
    unbans: UnbanQueue,
}

impl StateTracker {
    /// An empty mirror for the given client.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            nick: config.nickname,
            channels: HashMap::new(),
            users: UserTable::default(),
            unbans: UnbanQueue::new(),
        }
    }

    /// The local client's current nick.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Look up a tracked channel by name.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(&irc_to_lower(name))
    }

    /// Iterate tracked channels in no particular order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    /// Number of tracked channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Display names of every tracked channel, sorted by folded name.
    #[must_use]
    pub fn channel_names(&self) -> Vec<String> {
        let mut by_key: Vec<(&String, &Channel)> = self.channels.iter().collect();
        by_key.sort_by(|a, b| a.0.cmp(b.0));
        by_key
            .into_iter()
            .map(|(_, chan)| chan.name().to_string())
            .collect()
    }

    /// Look up a known user by nick.
    #[must_use]
    pub fn user(&self, nick: &str) -> Option<&User> {
        self.users.by_nick(nick)
    }

    /// Number of users currently sharing a channel with us.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Feed one event through the mirror, returning the updates it caused.
    ///
    /// Never fails: anomalies are logged and the event (or the part of it
    /// that did not fit) is dropped.
    pub fn apply(&mut self, event: StateEvent) -> Vec<StateUpdate> {
        let mut out = Vec::new();
        match event {
            StateEvent::Join { channel, nick } => self.on_join(&channel, &nick, &mut out),
            StateEvent::Part {
                channel,
                nick,
                reason,
            } => self.on_part(&channel, &nick, reason, &mut out),
            StateEvent::Kick {
                channel,
                actor,
                target,
                reason,
            } => self.on_kick(&channel, &actor, &target, reason, &mut out),
            StateEvent::Quit { nick, reason } => self.on_quit(&nick, reason, &mut out),
            StateEvent::NickChange { old_nick, new_nick } => {
                self.on_nick_change(&old_nick, &new_nick)
            }
            StateEvent::Mode {
                channel,
                actor,
                letter,
                arg,
                is_add,
            } => self.on_mode(&channel, &actor, letter, arg, is_add, &mut out),
            StateEvent::Topic {
                channel,
                actor,
                text,
                is_initial,
            } => self.on_topic(&channel, &actor, text, is_initial, &mut out),
            StateEvent::NamesReply { channel, tokens } => {
                self.on_names(&channel, &tokens, &mut out)
            }
            StateEvent::BanListEntry {
                channel,
                mask,
                set_by,
                set_at,
            } => self.on_ban_entry(&channel, mask, set_by, set_at, &mut out),
            StateEvent::BanListComplete { channel } => self.on_ban_complete(&channel, &mut out),
            StateEvent::CreationTime { channel, timestamp } => {
                self.on_creation_time(&channel, timestamp, &mut out)
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Membership events.
    // ------------------------------------------------------------------

    fn on_join(&mut self, channel: &str, nick: &str, out: &mut Vec<StateUpdate>) {
        let folded = irc_to_lower(channel);
        if self.is_self(nick) {
            // A rejoin starts clean; the server re-sends NAMES, topic, and
            // modes after every join.
            if let Some(stale) = self.channels.remove(&folded) {
                for member in stale.members() {
                    self.users.note_leave(member.user(), &folded);
                }
                debug!(channel = %stale.name(), "rejoin, stale mirror discarded");
            }
            self.channels.insert(folded.clone(), Channel::new(channel));
            debug!(%channel, "joined, mirror opened");
        } else if !self.channels.contains_key(&folded) {
            debug!(%channel, %nick, "join for untracked channel dropped");
            return;
        }
        let id = self.users.intern(nick);
        if let Some(chan) = self.channels.get_mut(&folded) {
            if chan.add_member(id, nick) {
                self.users.note_join(id, &folded);
                out.push(StateUpdate::UserJoined {
                    channel: chan.name().to_string(),
                    nick: nick.to_string(),
                });
            } else {
                debug!(channel = %chan.name(), %nick, "duplicate join ignored");
            }
        }
    }

    fn on_part(
        &mut self,
        channel: &str,
        nick: &str,
        reason: Option<String>,
        out: &mut Vec<StateUpdate>,
    ) {
        let leaving_self = self.is_self(nick);
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, %nick, "part for untracked channel dropped");
            return;
        };
        let name = chan.name().to_string();
        let Some(member) = chan.remove_member(nick) else {
            debug!(%channel, %nick, "part for unknown member dropped");
            return;
        };
        let known_nick = member.nick().to_string();
        out.push(StateUpdate::UserParted {
            channel: name.clone(),
            nick: known_nick.clone(),
            reason,
        });
        out.push(StateUpdate::UserLeft {
            channel: name,
            nick: known_nick,
        });
        self.users.note_leave(member.user(), &folded);
        if leaving_self {
            self.destroy_channel(&folded);
        }
    }

    fn on_kick(
        &mut self,
        channel: &str,
        actor: &str,
        target: &str,
        reason: Option<String>,
        out: &mut Vec<StateUpdate>,
    ) {
        let losing_self = self.is_self(target);
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, %target, "kick for untracked channel dropped");
            return;
        };
        let name = chan.name().to_string();
        let Some(member) = chan.remove_member(target) else {
            debug!(%channel, %target, "kick for unknown member dropped");
            return;
        };
        let known_nick = member.nick().to_string();
        out.push(StateUpdate::UserKicked {
            channel: name.clone(),
            actor: actor.to_string(),
            target: known_nick.clone(),
            reason,
        });
        out.push(StateUpdate::UserLeft {
            channel: name,
            nick: known_nick,
        });
        self.users.note_leave(member.user(), &folded);
        if losing_self {
            self.destroy_channel(&folded);
        }
    }

    fn on_quit(&mut self, nick: &str, reason: Option<String>, out: &mut Vec<StateUpdate>) {
        let Some(id) = self.users.id_of(nick) else {
            debug!(%nick, "quit for unknown user dropped");
            return;
        };
        let quitting_self = self.is_self(nick);
        // Locals handed to the event macros must not be called `display` or
        // `debug`; the expansion's `use tracing::field::*` shadows them.
        let known_nick = self
            .users
            .get(id)
            .map(|user| user.nick().to_string())
            .unwrap_or_else(|| nick.to_string());
        let mut folded_channels: Vec<String> = self
            .users
            .get(id)
            .map(|user| user.channels().map(str::to_string).collect())
            .unwrap_or_default();
        folded_channels.sort();
        debug!(nick = %known_nick, ?reason, channels = folded_channels.len(), "quit");
        for folded in &folded_channels {
            if let Some(chan) = self.channels.get_mut(folded) {
                chan.remove_member(&known_nick);
                out.push(StateUpdate::UserLeft {
                    channel: chan.name().to_string(),
                    nick: known_nick.clone(),
                });
            }
            self.users.note_leave(id, folded);
        }
        if quitting_self {
            self.channels.clear();
            self.users.clear();
            self.unbans.clear();
            debug!("local quit, mirror cleared");
        }
    }

    fn on_nick_change(&mut self, old_nick: &str, new_nick: &str) {
        if self.is_self(old_nick) {
            self.nick = new_nick.to_string();
        }
        let Some(id) = self.users.rename(old_nick, new_nick) else {
            debug!(%old_nick, "nick change for unknown user dropped");
            return;
        };
        let folded_channels: Vec<String> = self
            .users
            .get(id)
            .map(|user| user.channels().map(str::to_string).collect())
            .unwrap_or_default();
        for folded in &folded_channels {
            if let Some(chan) = self.channels.get_mut(folded) {
                chan.rename_member(old_nick, new_nick);
            }
        }
        debug!(%old_nick, %new_nick, channels = folded_channels.len(), "nick change applied");
    }

    // ------------------------------------------------------------------
    // Mode and topic events.
    // ------------------------------------------------------------------

    fn on_mode(
        &mut self,
        channel: &str,
        actor: &str,
        letter: char,
        arg: Option<String>,
        is_add: bool,
        out: &mut Vec<StateUpdate>,
    ) {
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, %letter, "mode for untracked channel dropped");
            return;
        };
        let name = chan.name().to_string();

        // Privilege letters target a member, not the channel.
        if let Some(rank) = Privilege::from_mode_char(letter) {
            let Some(target) = arg.as_deref() else {
                warn!(channel = %name, %letter, "privilege mode without a target nick");
                return;
            };
            let Some(member) = chan.member_mut(target) else {
                debug!(channel = %name, %target, %letter, "privilege change for unknown member dropped");
                return;
            };
            let known_nick = member.nick().to_string();
            if is_add {
                member.privileges_mut().add(rank);
                out.push(StateUpdate::FlagAdded {
                    channel: name,
                    actor: actor.to_string(),
                    privilege: rank,
                    target: known_nick,
                });
            } else {
                member.privileges_mut().remove(rank);
                out.push(StateUpdate::FlagDeleted {
                    channel: name,
                    actor: actor.to_string(),
                    privilege: rank,
                    target: known_nick,
                });
            }
            return;
        }

        // The ban letter maintains the ban list, never the mode string.
        if letter == 'b' {
            let Some(mask) = arg.as_deref() else {
                warn!(channel = %name, "ban mode without a mask");
                return;
            };
            if is_add {
                chan.bans_mut().insert(BanEntry {
                    mask: mask.to_string(),
                    set_by: Some(actor.to_string()),
                    set_at: Some(Utc::now().timestamp()),
                });
                out.push(StateUpdate::ModeAdded {
                    channel: name,
                    actor: actor.to_string(),
                    letter,
                    arg: Some(mask.to_string()),
                });
            } else {
                if chan.bans_mut().remove(mask).is_none() {
                    debug!(channel = %name, %mask, "unban for a mask the mirror does not hold");
                }
                if self.unbans.cancel(channel, mask).is_some() {
                    debug!(channel = %name, %mask, "manual unban cancelled the pending timer");
                }
                out.push(StateUpdate::ModeDeleted {
                    channel: name,
                    actor: actor.to_string(),
                    letter,
                    arg: Some(mask.to_string()),
                });
            }
            return;
        }

        // Everything else is plain channel-mode state. The server already
        // applied the mode, so subscribers hear about it even when the
        // argument fails to parse.
        if is_add {
            if let Err(err) = chan.modes_mut().apply_add(letter, arg.as_deref()) {
                warn!(channel = %name, %letter, %err, "mode argument rejected, state unchanged");
            }
            out.push(StateUpdate::ModeAdded {
                channel: name,
                actor: actor.to_string(),
                letter,
                arg,
            });
        } else {
            chan.modes_mut().apply_delete(letter);
            out.push(StateUpdate::ModeDeleted {
                channel: name,
                actor: actor.to_string(),
                letter,
                arg,
            });
        }
    }

    fn on_topic(
        &mut self,
        channel: &str,
        actor: &str,
        text: String,
        is_initial: bool,
        out: &mut Vec<StateUpdate>,
    ) {
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, "topic for untracked channel dropped");
            return;
        };
        chan.set_topic(Topic {
            text: text.clone(),
            set_by: actor.to_string(),
            set_at: Utc::now().timestamp(),
        });
        out.push(StateUpdate::TopicChanged {
            channel: chan.name().to_string(),
            actor: actor.to_string(),
            text,
            initial: is_initial,
        });
    }

    // ------------------------------------------------------------------
    // Bulk synchronization numerics.
    // ------------------------------------------------------------------

    fn on_names(&mut self, channel: &str, tokens: &str, out: &mut Vec<StateUpdate>) {
        // NAMES can precede our own JOIN echo on some servers, so it is the
        // second event allowed to open a channel in the mirror.
        let folded = irc_to_lower(channel);
        let chan = self
            .channels
            .entry(folded.clone())
            .or_insert_with(|| Channel::new(channel));
        let name = chan.name().to_string();
        let mut nicks = Vec::new();
        for token in tokens.split_whitespace() {
            let (privileges, nick) = split_names_token(token);
            if nick.is_empty() {
                debug!(channel = %name, %token, "names token with no nick skipped");
                continue;
            }
            let id = self.users.intern(nick);
            if chan.sync_member(id, nick, privileges) {
                self.users.note_join(id, &folded);
            }
            nicks.push(nick.to_string());
        }
        if nicks.is_empty() {
            debug!(channel = %name, "empty names reply");
            return;
        }
        out.push(StateUpdate::UsersAdded {
            channel: name,
            nicks,
        });
    }

    fn on_ban_entry(
        &mut self,
        channel: &str,
        mask: String,
        set_by: Option<String>,
        set_at: Option<i64>,
        out: &mut Vec<StateUpdate>,
    ) {
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, %mask, "ban list entry for untracked channel dropped");
            return;
        };
        let entry = BanEntry {
            mask,
            set_by,
            set_at,
        };
        chan.bans_mut().insert(entry.clone());
        out.push(StateUpdate::BanListEntrySent {
            channel: chan.name().to_string(),
            entry,
        });
    }

    fn on_ban_complete(&mut self, channel: &str, out: &mut Vec<StateUpdate>) {
        let Some(chan) = self.channel(channel) else {
            debug!(%channel, "ban list end for untracked channel dropped");
            return;
        };
        out.push(StateUpdate::BanListComplete {
            channel: chan.name().to_string(),
        });
    }

    fn on_creation_time(&mut self, channel: &str, timestamp: i64, out: &mut Vec<StateUpdate>) {
        let folded = irc_to_lower(channel);
        let Some(chan) = self.channels.get_mut(&folded) else {
            debug!(%channel, "creation time for untracked channel dropped");
            return;
        };
        chan.set_created_at(timestamp);
        out.push(StateUpdate::ChanCreationTimeSent {
            channel: chan.name().to_string(),
            timestamp,
        });
    }

    // ------------------------------------------------------------------
    // Scheduled unbans.
    // ------------------------------------------------------------------

    /// Schedule `mask` to be lifted from `channel` at `deadline`.
    ///
    /// The channel must be tracked; the ban itself need not be in the
    /// mirror yet (the 367 sync may still be running). Returns false when
    /// the channel is untracked or a timer for this mask already exists.
    pub fn schedule_unban(&mut self, channel: &str, mask: &str, deadline: Instant) -> bool {
        if !self.channels.contains_key(&irc_to_lower(channel)) {
            warn!(%channel, %mask, "refusing to schedule an unban for an untracked channel");
            return false;
        }
        let scheduled = self.unbans.schedule(channel, mask, deadline);
        if scheduled {
            debug!(%channel, %mask, "unban scheduled");
        } else {
            debug!(%channel, %mask, "unban already scheduled");
        }
        scheduled
    }

    /// Withdraw a pending unban. Returns false when none was pending.
    pub fn cancel_unban(&mut self, channel: &str, mask: &str) -> bool {
        self.unbans.cancel(channel, mask).is_some()
    }

    /// Whether an unban is pending for this mask on this channel.
    #[must_use]
    pub fn unban_scheduled(&self, channel: &str, mask: &str) -> bool {
        self.unbans.is_scheduled(channel, mask)
    }

    /// The earliest pending unban deadline, for the shell to sleep until.
    #[must_use]
    pub fn next_unban_deadline(&self) -> Option<Instant> {
        self.unbans.next_deadline()
    }

    /// Fire every timer due as of `now`.
    ///
    /// Each fired timer whose ban is still in the mirror removes that ban
    /// and yields an [`UnbanRequest`] for the command-dispatch collaborator;
    /// the server's `-b` echo then produces the `ModeDeleted` update. Timers
    /// whose ban or channel is already gone fire into nothing.
    pub fn fire_due_unbans(&mut self, now: Instant) -> Vec<UnbanRequest> {
        let mut requests = Vec::new();
        for timer in self.unbans.fire_due(now) {
            let folded = irc_to_lower(&timer.channel);
            let Some(chan) = self.channels.get_mut(&folded) else {
                debug!(channel = %timer.channel, mask = %timer.mask, "unban fired for untracked channel");
                continue;
            };
            if chan.bans_mut().remove(&timer.mask).is_none() {
                debug!(channel = %chan.name(), mask = %timer.mask, "unban fired for a ban no longer held");
                continue;
            }
            requests.push(UnbanRequest {
                channel: chan.name().to_string(),
                mask: timer.mask,
            });
        }
        requests
    }

    fn destroy_channel(&mut self, folded: &str) {
        let Some(chan) = self.channels.remove(folded) else {
            return;
        };
        for member in chan.members() {
            self.users.note_leave(member.user(), folded);
        }
        let cancelled = self.unbans.cancel_channel(folded);
        debug!(channel = %chan.name(), members = chan.member_count(), cancelled, "mirror closed");
    }

    fn is_self(&self, nick: &str) -> bool {
        irc_eq(nick, &self.nick)
    }
}
