//! Scheduled unban timers.
//!
//! Each timer is an explicit little state machine: `Scheduled` until it
//! either comes due (`Fired`) or is withdrawn (`Cancelled`), both terminal.
//! The queue itself is sans-IO - it stores deadlines and answers "what is
//! due as of `now`", while whoever owns it (the tracker, driven by the
//! tokio shell) supplies the clock and decides what a fire means.

use std::collections::HashMap;
use std::time::Instant;

use crate::casemap::irc_to_lower;

/// Lifecycle of one scheduled unban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnbanTimerState {
    /// Waiting for its deadline.
    Scheduled,
    /// Came due and was handed to the owner. Terminal.
    Fired,
    /// Withdrawn before the deadline. Terminal.
    Cancelled,
}

/// One pending automatic unban.
#[derive(Debug, Clone)]
pub struct UnbanTimer {
    /// Channel the ban lives on, in the case the scheduler was given.
    pub channel: String,
    /// Exact mask to lift.
    pub mask: String,
    /// When the timer comes due.
    pub deadline: Instant,
    /// Where the timer is in its lifecycle.
    pub state: UnbanTimerState,
}

/// An unban the scheduler decided to issue, to be sent by the
/// command-dispatch collaborator as `MODE <channel> -b <mask>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnbanRequest {
    /// Channel to lift the ban on.
    pub channel: String,
    /// Exact mask to lift.
    pub mask: String,
}

/// Deadline bookkeeping for every channel's pending unbans.
///
/// Keyed by (folded channel name, exact mask). Only `Scheduled` timers are
/// held; fired and cancelled timers leave the queue carrying their terminal
/// state.
#[derive(Debug, Default)]
pub struct UnbanQueue {
    timers: HashMap<(String, String), UnbanTimer>,
}

impl UnbanQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an unban. Returns false (changing nothing) when a timer
    /// for this mask on this channel is already pending.
    pub fn schedule(&mut self, channel: &str, mask: &str, deadline: Instant) -> bool {
        let key = (irc_to_lower(channel), mask.to_string());
        if self.timers.contains_key(&key) {
            return false;
        }
        self.timers.insert(
            key,
            UnbanTimer {
                channel: channel.to_string(),
                mask: mask.to_string(),
                deadline,
                state: UnbanTimerState::Scheduled,
            },
        );
        true
    }

    /// Cancel a pending timer, returning it in the `Cancelled` state.
    /// Cancelling a timer that does not exist is a no-op.
    pub fn cancel(&mut self, channel: &str, mask: &str) -> Option<UnbanTimer> {
        let key = (irc_to_lower(channel), mask.to_string());
        let mut timer = self.timers.remove(&key)?;
        timer.state = UnbanTimerState::Cancelled;
        Some(timer)
    }

    /// Drop every pending timer for one channel (channel teardown).
    /// Returns how many were cancelled.
    pub fn cancel_channel(&mut self, channel: &str) -> usize {
        let folded = irc_to_lower(channel);
        let before = self.timers.len();
        self.timers.retain(|(chan, _), _| *chan != folded);
        before - self.timers.len()
    }

    /// Whether a timer is pending for this mask on this channel.
    #[must_use]
    pub fn is_scheduled(&self, channel: &str, mask: &str) -> bool {
        self.timers
            .contains_key(&(irc_to_lower(channel), mask.to_string()))
    }

    /// The earliest pending deadline, for the shell to sleep until.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Remove and return every timer due as of `now`, in the `Fired`
    /// state, earliest deadline first.
    pub fn fire_due(&mut self, now: Instant) -> Vec<UnbanTimer> {
        let due: Vec<(String, String)> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();

        let mut fired: Vec<UnbanTimer> = due
            .into_iter()
            .filter_map(|key| self.timers.remove(&key))
            .map(|mut t| {
                t.state = UnbanTimerState::Fired;
                t
            })
            .collect();
        fired.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.mask.cmp(&b.mask)));
        fired
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Drop everything without firing (subsystem shutdown).
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn duplicate_schedule_is_refused() {
        let mut queue = UnbanQueue::new();
        let deadline = Instant::now() + Duration::from_secs(60);
        assert!(queue.schedule("#rust", "*!*@host", deadline));
        assert!(!queue.schedule("#rust", "*!*@host", deadline + Duration::from_secs(5)));
        assert_eq!(queue.len(), 1);
        // The original deadline survives the refused reschedule.
        assert_eq!(queue.next_deadline(), Some(deadline));
    }

    #[test]
    fn channel_keys_are_casefolded() {
        let mut queue = UnbanQueue::new();
        let deadline = Instant::now() + Duration::from_secs(60);
        assert!(queue.schedule("#Rust", "*!*@host", deadline));
        assert!(!queue.schedule("#rust", "*!*@host", deadline));
        assert!(queue.is_scheduled("#RUST", "*!*@host"));
        assert!(queue.cancel("#rust", "*!*@host").is_some());
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_is_terminal_and_safe_when_absent() {
        let mut queue = UnbanQueue::new();
        assert!(queue.cancel("#rust", "*!*@host").is_none());

        queue.schedule("#rust", "*!*@host", Instant::now());
        let cancelled = queue.cancel("#rust", "*!*@host").unwrap();
        assert_eq!(cancelled.state, UnbanTimerState::Cancelled);
        // A cancelled timer never fires.
        assert!(queue.fire_due(Instant::now() + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn fire_due_returns_only_expired_timers() {
        let mut queue = UnbanQueue::new();
        let now = Instant::now();
        queue.schedule("#rust", "a!*@*", now + Duration::from_secs(10));
        queue.schedule("#rust", "b!*@*", now + Duration::from_secs(20));
        queue.schedule("#irc", "c!*@*", now + Duration::from_secs(30));

        let fired = queue.fire_due(now + Duration::from_secs(20));
        let masks: Vec<&str> = fired.iter().map(|t| t.mask.as_str()).collect();
        assert_eq!(masks, ["a!*@*", "b!*@*"]);
        assert!(fired.iter().all(|t| t.state == UnbanTimerState::Fired));
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.next_deadline(),
            Some(now + Duration::from_secs(30))
        );
    }

    #[test]
    fn cancel_channel_drops_all_of_its_timers() {
        let mut queue = UnbanQueue::new();
        let deadline = Instant::now() + Duration::from_secs(60);
        queue.schedule("#rust", "a!*@*", deadline);
        queue.schedule("#Rust", "b!*@*", deadline);
        queue.schedule("#irc", "c!*@*", deadline);
        assert_eq!(queue.cancel_channel("#RUST"), 2);
        assert_eq!(queue.len(), 1);
        assert!(queue.is_scheduled("#irc", "c!*@*"));
    }
}
