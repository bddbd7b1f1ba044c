//! A single tracked channel.

use std::collections::HashMap;

use crate::bans::{BanEntry, BanList};
use crate::casemap::{irc_eq, irc_to_lower};
use crate::member::{Privilege, PrivilegeSet};
use crate::modes::ChannelModes;
use crate::user::UserId;

/// Channel topic with who set it and when.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Topic {
    /// Topic text.
    pub text: String,
    /// Nick that set it (or the server name for the join-time reply).
    pub set_by: String,
    /// Unix timestamp when it was set. Local clock for live changes.
    pub set_at: i64,
}

/// One channel member: a user's identity and the ranks they hold here.
///
/// Membership and privileges live in the same record, so one can never
/// exist without the other.
#[derive(Debug, Clone)]
pub struct Member {
    user: UserId,
    nick: String,
    privileges: PrivilegeSet,
}

impl Member {
    /// The member's stable user id.
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    /// The member's nick, in display case.
    #[must_use]
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The ranks this member holds on this channel.
    #[must_use]
    pub fn privileges(&self) -> &PrivilegeSet {
        &self.privileges
    }

    /// The member's highest rank here.
    #[must_use]
    pub fn highest(&self) -> Privilege {
        self.privileges.highest()
    }

    /// Whether this member holds `rank` or anything above it.
    #[must_use]
    pub fn has_at_least(&self, rank: Privilege) -> bool {
        self.privileges.has_at_least(rank)
    }

    pub(crate) fn privileges_mut(&mut self) -> &mut PrivilegeSet {
        &mut self.privileges
    }
}

/// One member in a [`ChannelInfo`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberInfo {
    /// Nick in display case.
    pub nick: String,
    /// Ranks held.
    pub privileges: PrivilegeSet,
}

/// Point-in-time copy of one channel's state, cheap to hand across tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelInfo {
    /// Channel name in display case.
    pub name: String,
    /// Creation time, when the server has reported it.
    pub created_at: Option<i64>,
    /// Current topic, if any.
    pub topic: Option<Topic>,
    /// Mode state.
    pub modes: ChannelModes,
    /// Members sorted by folded nick.
    pub members: Vec<MemberInfo>,
    /// Ban list in arrival order.
    pub bans: Vec<BanEntry>,
}

/// The mirror of one joined channel.
///
/// All nick lookups fold the key under RFC 1459 rules; the stored member
/// record keeps the display-case nick.
#[derive(Debug)]
pub struct Channel {
    name: String,
    folded: String,
    created_at: Option<i64>,
    topic: Option<Topic>,
    modes: ChannelModes,
    bans: BanList,
    members: HashMap<String, Member>,
}

impl Channel {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            folded: irc_to_lower(name),
            created_at: None,
            topic: None,
            modes: ChannelModes::new(),
            bans: BanList::new(),
            members: HashMap::new(),
        }
    }

    /// Channel name in display case.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RFC 1459 fold of the name, as used for registry keys.
    #[must_use]
    pub fn folded_name(&self) -> &str {
        &self.folded
    }

    /// Case-insensitive name test.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        irc_eq(&self.name, name)
    }

    /// Creation time, when the server has reported it.
    #[must_use]
    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    /// Current topic, if any.
    #[must_use]
    pub fn topic(&self) -> Option<&Topic> {
        self.topic.as_ref()
    }

    /// Mode state.
    #[must_use]
    pub fn modes(&self) -> &ChannelModes {
        &self.modes
    }

    /// Ban list.
    #[must_use]
    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    /// Look up a member by nick.
    #[must_use]
    pub fn member(&self, nick: &str) -> Option<&Member> {
        self.members.get(&irc_to_lower(nick))
    }

    /// Whether `nick` is currently a member.
    #[must_use]
    pub fn has_member(&self, nick: &str) -> bool {
        self.members.contains_key(&irc_to_lower(nick))
    }

    /// Whether `nick` is a member holding `rank` or anything above it.
    /// False for non-members.
    #[must_use]
    pub fn has_at_least(&self, nick: &str, rank: Privilege) -> bool {
        self.member(nick).map(|m| m.has_at_least(rank)).unwrap_or(false)
    }

    /// Iterate members in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.values()
    }

    /// Number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Point-in-time snapshot, members sorted by folded nick.
    #[must_use]
    pub fn snapshot(&self) -> ChannelInfo {
        let mut keys: Vec<&String> = self.members.keys().collect();
        keys.sort();
        let members = keys
            .into_iter()
            .map(|key| {
                let m = &self.members[key];
                MemberInfo {
                    nick: m.nick.clone(),
                    privileges: m.privileges,
                }
            })
            .collect();
        ChannelInfo {
            name: self.name.clone(),
            created_at: self.created_at,
            topic: self.topic.clone(),
            modes: self.modes.clone(),
            members,
            bans: self.bans.iter().cloned().collect(),
        }
    }

    // ------------------------------------------------------------------
    // Mutations, driven by the tracker.
    // ------------------------------------------------------------------

    /// Add a member with no privileges. No-op when already present (a
    /// duplicate join echo must not wipe earned ranks). Returns true when
    /// the member was newly added.
    pub(crate) fn add_member(&mut self, user: UserId, nick: &str) -> bool {
        let folded = irc_to_lower(nick);
        if self.members.contains_key(&folded) {
            return false;
        }
        self.members.insert(
            folded,
            Member {
                user,
                nick: nick.to_string(),
                privileges: PrivilegeSet::new(),
            },
        );
        true
    }

    /// Add or refresh a member from a NAMES token: a new member is created
    /// with the given ranks, an existing one has its ranks replaced by the
    /// server's snapshot. Returns true when the member was newly added.
    pub(crate) fn sync_member(
        &mut self,
        user: UserId,
        nick: &str,
        privileges: PrivilegeSet,
    ) -> bool {
        let folded = irc_to_lower(nick);
        match self.members.get_mut(&folded) {
            Some(member) => {
                member.privileges = privileges;
                false
            }
            None => {
                self.members.insert(
                    folded,
                    Member {
                        user,
                        nick: nick.to_string(),
                        privileges,
                    },
                );
                true
            }
        }
    }

    /// Remove a member, returning the record (identity and privileges go
    /// together).
    pub(crate) fn remove_member(&mut self, nick: &str) -> Option<Member> {
        self.members.remove(&irc_to_lower(nick))
    }

    /// Re-key a member under a new nick. The record, privileges included,
    /// moves intact. Returns false when the old nick is not a member.
    pub(crate) fn rename_member(&mut self, old_nick: &str, new_nick: &str) -> bool {
        let Some(mut member) = self.members.remove(&irc_to_lower(old_nick)) else {
            return false;
        };
        member.nick = new_nick.to_string();
        self.members.insert(irc_to_lower(new_nick), member);
        true
    }

    pub(crate) fn member_mut(&mut self, nick: &str) -> Option<&mut Member> {
        self.members.get_mut(&irc_to_lower(nick))
    }

    pub(crate) fn set_topic(&mut self, topic: Topic) {
        self.topic = Some(topic);
    }

    pub(crate) fn set_created_at(&mut self, timestamp: i64) {
        self.created_at = Some(timestamp);
    }

    pub(crate) fn modes_mut(&mut self) -> &mut ChannelModes {
        &mut self.modes
    }

    pub(crate) fn bans_mut(&mut self) -> &mut BanList {
        &mut self.bans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u64) -> UserId {
        // UserTable mints ids sequentially from zero; tests that need raw
        // ids go through a table to stay honest.
        let mut table = crate::user::UserTable::default();
        let mut id = table.intern("seed0");
        for i in 1..=n {
            id = table.intern(&format!("seed{}", i));
        }
        id
    }

    #[test]
    fn add_member_is_idempotent_and_keeps_ranks() {
        let mut chan = Channel::new("#Rust");
        let alice = uid(0);
        assert!(chan.add_member(alice, "Alice"));
        chan.member_mut("alice").unwrap().privileges_mut().add(Privilege::Op);

        // A duplicate join echo changes nothing.
        assert!(!chan.add_member(alice, "Alice"));
        assert!(chan.has_at_least("ALICE", Privilege::Op));
        assert_eq!(chan.member_count(), 1);
    }

    #[test]
    fn sync_member_replaces_the_rank_snapshot() {
        let mut chan = Channel::new("#rust");
        let alice = uid(0);
        chan.add_member(alice, "Alice");
        chan.member_mut("alice").unwrap().privileges_mut().add(Privilege::Voice);

        chan.sync_member(alice, "Alice", PrivilegeSet::from_symbols("@"));
        let member = chan.member("alice").unwrap();
        assert!(member.privileges().has(Privilege::Op));
        assert!(!member.privileges().has(Privilege::Voice));
    }

    #[test]
    fn removal_takes_identity_and_privileges_together() {
        let mut chan = Channel::new("#rust");
        let alice = uid(0);
        chan.add_member(alice, "Alice");
        chan.member_mut("alice").unwrap().privileges_mut().add(Privilege::Op);

        let gone = chan.remove_member("ALICE").unwrap();
        assert_eq!(gone.user(), alice);
        assert!(gone.privileges().has(Privilege::Op));
        assert!(!chan.has_member("alice"));
        assert!(!chan.has_at_least("alice", Privilege::Regular));
    }

    #[test]
    fn rename_moves_the_record_intact() {
        let mut chan = Channel::new("#rust");
        let alice = uid(0);
        chan.add_member(alice, "Alice");
        chan.member_mut("alice").unwrap().privileges_mut().add(Privilege::HalfOp);

        assert!(chan.rename_member("ALICE", "Alicia[away]"));
        assert!(!chan.has_member("alice"));
        let member = chan.member("alicia{away}").unwrap();
        assert_eq!(member.nick(), "Alicia[away]");
        assert_eq!(member.user(), alice);
        assert!(member.privileges().has(Privilege::HalfOp));

        assert!(!chan.rename_member("nobody", "anybody"));
    }

    #[test]
    fn name_test_is_case_insensitive() {
        let chan = Channel::new("#Rust[Lang]");
        assert!(chan.is("#rust{lang}"));
        assert!(!chan.is("#rust"));
        assert_eq!(chan.folded_name(), "#rust{lang}");
    }

    #[test]
    fn snapshot_sorts_members_and_copies_state() {
        let mut chan = Channel::new("#rust");
        chan.add_member(uid(0), "zoe");
        chan.add_member(uid(1), "Alice");
        chan.set_topic(Topic {
            text: "hello".to_string(),
            set_by: "zoe".to_string(),
            set_at: 1_700_000_000,
        });
        chan.bans_mut().insert(BanEntry::new("*!*@bad"));

        let info = chan.snapshot();
        let nicks: Vec<&str> = info.members.iter().map(|m| m.nick.as_str()).collect();
        assert_eq!(nicks, ["Alice", "zoe"]);
        assert_eq!(info.topic.as_ref().unwrap().text, "hello");
        assert_eq!(info.bans.len(), 1);
    }
}
