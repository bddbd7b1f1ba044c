//! Property-based tests for privilege bookkeeping.
//!
//! Uses proptest to generate random rank operations and event sequences
//! and verify that:
//! 1. Rank ordering is downward closed (`has_at_least`)
//! 2. The symbol string faithfully round-trips a privilege set
//! 3. Membership and privileges never drift apart, whatever the events

use proptest::prelude::*;
use slirc_state::{
    split_names_token, Privilege, PrivilegeSet, StateEvent, StateTracker, TrackerConfig,
};

// =============================================================================
// STRATEGIES
// =============================================================================

/// Any storable rank (everything above `Regular`).
fn rank_strategy() -> impl Strategy<Value = Privilege> {
    prop::sample::select(&Privilege::RANKED[..])
}

/// Valid IRC nickname that never starts with a status symbol.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

/// Small fixed population so random events actually collide.
fn pool_nick() -> impl Strategy<Value = &'static str> {
    prop::sample::select(&["Alice", "Bob", "Carol", "Dave", "eve[x]"][..])
}

/// One random membership / privilege operation against `#test`.
#[derive(Debug, Clone)]
enum Op {
    Join(String),
    Part(String),
    Kick(String),
    Quit(String),
    Grant(String, Privilege),
    Revoke(String, Privilege),
    Names(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        pool_nick().prop_map(|n| Op::Join(n.to_string())),
        pool_nick().prop_map(|n| Op::Part(n.to_string())),
        pool_nick().prop_map(|n| Op::Kick(n.to_string())),
        pool_nick().prop_map(|n| Op::Quit(n.to_string())),
        (pool_nick(), rank_strategy()).prop_map(|(n, r)| Op::Grant(n.to_string(), r)),
        (pool_nick(), rank_strategy()).prop_map(|(n, r)| Op::Revoke(n.to_string(), r)),
        prop::collection::vec(("[~&@%+]{0,2}", pool_nick()), 1..4).prop_map(|parts| {
            let tokens: Vec<String> = parts
                .into_iter()
                .map(|(symbols, nick)| format!("{symbols}{nick}"))
                .collect();
            Op::Names(tokens.join(" "))
        }),
    ]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Holding a rank means holding "at least" it and every rank below.
    #[test]
    fn has_at_least_is_downward_closed(ranks in prop::collection::vec(rank_strategy(), 0..5)) {
        let mut set = PrivilegeSet::new();
        for rank in &ranks {
            set.add(*rank);
        }
        for pair in Privilege::RANKED.windows(2) {
            if set.has_at_least(pair[1]) {
                prop_assert!(
                    set.has_at_least(pair[0]),
                    "{:?} satisfied but {:?} not, set: {:?}", pair[1], pair[0], set
                );
            }
        }
    }

    /// Whatever was added can be removed again, leaving nothing behind.
    #[test]
    fn add_then_remove_leaves_the_set_empty(ranks in prop::collection::vec(rank_strategy(), 1..6)) {
        let mut set = PrivilegeSet::new();
        for rank in &ranks {
            set.add(*rank);
            prop_assert!(set.has(*rank));
        }
        for rank in &ranks {
            set.remove(*rank);
        }
        for rank in &ranks {
            prop_assert!(!set.has(*rank));
        }
        prop_assert!(set.is_empty());
    }

    /// The NAMES-style symbol string carries the whole set.
    #[test]
    fn symbol_string_round_trips(ranks in prop::collection::vec(rank_strategy(), 0..6)) {
        let mut set = PrivilegeSet::new();
        for rank in &ranks {
            set.add(*rank);
        }
        let rebuilt = PrivilegeSet::from_symbols(&set.symbols());
        prop_assert_eq!(set, rebuilt, "symbols: {:?}", set.symbols());
    }

    /// A NAMES token splits into exactly its symbol run and its nick.
    #[test]
    fn names_token_splits_cleanly(
        symbols in "[~&@%+]{0,4}",
        nick in nickname_strategy()
    ) {
        let token = format!("{symbols}{nick}");
        let (privileges, rest) = split_names_token(&token);
        prop_assert_eq!(rest, nick.as_str());
        for symbol in symbols.chars() {
            let rank = Privilege::from_symbol(symbol).expect("status symbol");
            prop_assert!(privileges.has(rank), "missing {:?} from {:?}", rank, token);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// However events interleave, a member always has exactly one record:
    /// present members resolve to a user and a privilege set, departed
    /// members leave neither behind.
    #[test]
    fn membership_and_privileges_stay_in_lockstep(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut t = StateTracker::new(TrackerConfig::new("me"));
        t.apply(StateEvent::join("#test", "me"));

        for op in ops {
            match op {
                Op::Join(nick) => {
                    t.apply(StateEvent::join("#test", &nick));
                }
                Op::Part(nick) => {
                    t.apply(StateEvent::part("#test", &nick));
                }
                Op::Kick(nick) => {
                    t.apply(StateEvent::Kick {
                        channel: "#test".to_string(),
                        actor: "me".to_string(),
                        target: nick,
                        reason: None,
                    });
                }
                Op::Quit(nick) => {
                    t.apply(StateEvent::quit(nick));
                }
                Op::Grant(nick, rank) => {
                    let letter = rank.mode_char().expect("ranked");
                    t.apply(StateEvent::mode_add("#test", "me", letter, Some(&nick)));
                }
                Op::Revoke(nick, rank) => {
                    let letter = rank.mode_char().expect("ranked");
                    t.apply(StateEvent::mode_del("#test", "me", letter, Some(&nick)));
                }
                Op::Names(tokens) => {
                    t.apply(StateEvent::names("#test", tokens));
                }
            }

            // We never leave, so the channel must survive every sequence.
            let chan = t.channel("#test");
            prop_assert!(chan.is_some());
            let chan = chan.unwrap();

            let snapshot = chan.snapshot();
            prop_assert_eq!(snapshot.members.len(), chan.member_count());
            for member in &snapshot.members {
                let held = chan.member(&member.nick);
                prop_assert!(held.is_some(), "snapshot nick {} not a member", member.nick);
                prop_assert_eq!(*held.unwrap().privileges(), member.privileges);
                prop_assert!(
                    t.user(&member.nick).is_some(),
                    "member {} has no user record", member.nick
                );
            }
        }
    }
}
