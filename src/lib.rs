//! # slirc-state
//!
//! Client-side mirror of IRC channel state.
//!
//! Feed the tracker one parsed server event at a time and it maintains,
//! per joined channel: the member list with privilege ranks, the channel
//! modes (key and limit carried separately from the letter string), the
//! topic, the ban list, and the creation time. Bans can be scheduled for
//! automatic removal after a delay.
//!
//! ## Features
//!
//! - Sans-IO core: [`StateTracker::apply`] is a plain synchronous call
//!   returning the [`StateUpdate`]s each event produced
//! - RFC 1459 case folding on every channel and nick lookup
//! - Privilege ranks (`+v` through `+q`) stored with the membership
//!   record, so the two can never drift apart
//! - Ban-list mirroring with scheduled, cancellable unbans
//! - Optional Tokio actor shell with subscriber fan-out

#![deny(clippy::all)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```rust
//! use slirc_state::{Privilege, StateEvent, StateTracker, StateUpdate, TrackerConfig};
//!
//! let mut tracker = StateTracker::new(TrackerConfig::new("me"));
//!
//! // Our own join opens the mirror; the NAMES reply fills it.
//! tracker.apply(StateEvent::join("#rust", "me"));
//! let updates = tracker.apply(StateEvent::names("#rust", "@Alice +Bob Carol"));
//! assert!(matches!(updates[0], StateUpdate::UsersAdded { .. }));
//!
//! let channel = tracker.channel("#RUST").expect("tracked");
//! assert_eq!(channel.member_count(), 4);
//! assert!(channel.has_at_least("alice", Privilege::Op));
//! ```
//!
//! For concurrent use, spawn the tracker behind the actor shell (default
//! `tokio` feature) and talk to it through a
//! [`TrackerHandle`](actor::TrackerHandle).

#[cfg(feature = "tokio")]
pub mod actor;
pub mod bans;
pub mod casemap;
pub mod channel;
pub mod error;
pub mod event;
pub mod member;
pub mod modes;
pub mod tracker;
pub mod unban;
pub mod update;
pub mod user;

#[cfg(feature = "tokio")]
pub use self::actor::{TrackerActor, TrackerHandle};
pub use self::bans::{BanEntry, BanList};
pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::channel::{Channel, ChannelInfo, Member, MemberInfo, Topic};
pub use self::error::{Result, StateError};
pub use self::event::StateEvent;
pub use self::member::{split_names_token, Privilege, PrivilegeSet};
pub use self::modes::ChannelModes;
pub use self::tracker::{StateTracker, TrackerConfig};
pub use self::unban::{UnbanQueue, UnbanRequest, UnbanTimer, UnbanTimerState};
pub use self::update::{CommandDispatch, StateObserver, StateUpdate};
pub use self::user::{User, UserId};
