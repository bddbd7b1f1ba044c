//! Tracked user records.

use std::collections::{HashMap, HashSet};

use crate::casemap::irc_to_lower;

/// Stable identity for a tracked user, minted by the tracker.
///
/// Nicks change; ids do not. Privileges and membership records hang off
/// the id, which is why a nick change never rewrites them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(u64);

/// A user visible in at least one tracked channel.
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    nick: String,
    /// Folded names of channels shared with the local client.
    /// Back-references only; the registry owns the channels.
    channels: HashSet<String>,
}

impl User {
    fn new(id: UserId, nick: String) -> Self {
        Self {
            id,
            nick,
            channels: HashSet::new(),
        }
    }

    /// This user's stable id.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Current nick, in display case.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Folded names of the channels this user shares with the local
    /// client, in no particular order.
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    /// How many tracked channels this user is on.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Nick-indexed table of every user the tracker can currently see.
///
/// A record exists while the user shares at least one channel with us and
/// is dropped when the last shared channel goes away.
#[derive(Debug, Default)]
pub(crate) struct UserTable {
    users: HashMap<UserId, User>,
    by_nick: HashMap<String, UserId>,
    next_id: u64,
}

impl UserTable {
    /// Find the user currently holding `nick`, or create a record for it.
    pub(crate) fn intern(&mut self, nick: &str) -> UserId {
        let folded = irc_to_lower(nick);
        if let Some(id) = self.by_nick.get(&folded) {
            return *id;
        }
        let id = UserId(self.next_id);
        self.next_id += 1;
        self.users.insert(id, User::new(id, nick.to_string()));
        self.by_nick.insert(folded, id);
        id
    }

    pub(crate) fn get(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub(crate) fn id_of(&self, nick: &str) -> Option<UserId> {
        self.by_nick.get(&irc_to_lower(nick)).copied()
    }

    pub(crate) fn by_nick(&self, nick: &str) -> Option<&User> {
        self.id_of(nick).and_then(|id| self.get(id))
    }

    /// Move a record to a new nick, re-keying the index. Returns the id,
    /// or None when the old nick is unknown.
    pub(crate) fn rename(&mut self, old_nick: &str, new_nick: &str) -> Option<UserId> {
        let id = self.by_nick.remove(&irc_to_lower(old_nick))?;
        if let Some(user) = self.users.get_mut(&id) {
            user.nick = new_nick.to_string();
        }
        self.by_nick.insert(irc_to_lower(new_nick), id);
        Some(id)
    }

    /// Record that the user is now on `folded_channel`.
    pub(crate) fn note_join(&mut self, id: UserId, folded_channel: &str) {
        if let Some(user) = self.users.get_mut(&id) {
            user.channels.insert(folded_channel.to_string());
        }
    }

    /// Record that the user left `folded_channel`; drops the record when
    /// that was the last shared channel. Returns true if the record was
    /// dropped.
    pub(crate) fn note_leave(&mut self, id: UserId, folded_channel: &str) -> bool {
        let Some(user) = self.users.get_mut(&id) else {
            return false;
        };
        user.channels.remove(folded_channel);
        if user.channels.is_empty() {
            let folded_nick = irc_to_lower(&user.nick);
            self.users.remove(&id);
            self.by_nick.remove(&folded_nick);
            true
        } else {
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.users.len()
    }

    pub(crate) fn clear(&mut self) {
        self.users.clear();
        self.by_nick.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_reuses_records_case_insensitively() {
        let mut table = UserTable::default();
        let a = table.intern("Alice");
        let b = table.intern("ALICE");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        // Display case is the first one seen.
        assert_eq!(table.get(a).unwrap().nick(), "Alice");
    }

    #[test]
    fn rename_preserves_identity() {
        let mut table = UserTable::default();
        let id = table.intern("alice");
        table.note_join(id, "#rust");

        assert_eq!(table.rename("ALICE", "alicia"), Some(id));
        assert!(table.by_nick("alice").is_none());
        let user = table.by_nick("Alicia").unwrap();
        assert_eq!(user.id(), id);
        assert_eq!(user.nick(), "alicia");
        assert_eq!(user.channel_count(), 1);

        assert_eq!(table.rename("nobody", "anybody"), None);
    }

    #[test]
    fn record_drops_with_last_channel() {
        let mut table = UserTable::default();
        let id = table.intern("alice");
        table.note_join(id, "#rust");
        table.note_join(id, "#irc");

        assert!(!table.note_leave(id, "#rust"));
        assert_eq!(table.len(), 1);
        assert!(table.note_leave(id, "#irc"));
        assert_eq!(table.len(), 0);
        assert!(table.by_nick("alice").is_none());
    }

    #[test]
    fn ids_are_never_reused() {
        let mut table = UserTable::default();
        let a = table.intern("alice");
        table.note_join(a, "#rust");
        table.note_leave(a, "#rust");
        let b = table.intern("alice");
        assert_ne!(a, b);
    }
}
