//! Tokio shell around the tracker.
//!
//! [`StateTracker`] is plain synchronous state, so concurrent use goes
//! through an actor: the tracker lives in its own task, every interaction
//! is a message to that task, and queries come back over a oneshot. This
//! keeps the state single-writer with no lock on the event path.
//!
//! The task also owns the clock. Unban deadlines are computed from
//! [`tokio::time::Instant`], so tests can pause and advance virtual time,
//! and the run loop sleeps until the earliest pending deadline rather than
//! polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, info};

use crate::channel::{Channel, ChannelInfo};
use crate::error::{Result, StateError};
use crate::event::StateEvent;
use crate::tracker::{StateTracker, TrackerConfig};
use crate::unban::UnbanRequest;
use crate::update::{CommandDispatch, StateObserver};

enum TrackerMessage {
    Apply(StateEvent),
    Subscribe(Arc<dyn StateObserver>),
    ScheduleUnban {
        channel: String,
        mask: String,
        after: Duration,
        reply_tx: oneshot::Sender<bool>,
    },
    CancelUnban {
        channel: String,
        mask: String,
        reply_tx: oneshot::Sender<bool>,
    },
    GetChannel {
        name: String,
        reply_tx: oneshot::Sender<Option<ChannelInfo>>,
    },
    GetChannelNames {
        reply_tx: oneshot::Sender<Vec<String>>,
    },
    GetNick {
        reply_tx: oneshot::Sender<String>,
    },
    Shutdown,
}

/// The tracker's task: owns a [`StateTracker`], its subscribers, and the
/// unban clock.
pub struct TrackerActor {
    tracker: StateTracker,
    rx: mpsc::Receiver<TrackerMessage>,
    observers: Vec<Arc<dyn StateObserver>>,
    dispatch: Arc<dyn CommandDispatch>,
}

impl TrackerActor {
    /// Spawn a fresh tracker on its own task and return the handle to it.
    ///
    /// `dispatch` receives the unban commands fired by expired timers.
    pub fn spawn(config: TrackerConfig, dispatch: Arc<dyn CommandDispatch>) -> TrackerHandle {
        Self::spawn_with_capacity(config, dispatch, 64)
    }

    /// [`TrackerActor::spawn`] with an explicit inbox capacity.
    pub fn spawn_with_capacity(
        config: TrackerConfig,
        dispatch: Arc<dyn CommandDispatch>,
        capacity: usize,
    ) -> TrackerHandle {
        let (tx, rx) = mpsc::channel(capacity);
        let actor = Self {
            tracker: StateTracker::new(config),
            rx,
            observers: Vec::new(),
            dispatch,
        };
        tokio::spawn(actor.run());
        TrackerHandle { tx }
    }

    async fn run(mut self) {
        info!(nick = %self.tracker.nick(), "state tracker running");
        loop {
            tokio::select! {
                message = self.rx.recv() => {
                    match message {
                        Some(TrackerMessage::Shutdown) | None => break,
                        Some(message) => self.handle(message),
                    }
                }
                _ = sleep_until_deadline(self.tracker.next_unban_deadline()) => {
                    self.fire_due_unbans();
                }
            }
        }
        info!("state tracker stopped");
    }

    fn handle(&mut self, message: TrackerMessage) {
        match message {
            TrackerMessage::Apply(event) => {
                let updates = self.tracker.apply(event);
                for update in &updates {
                    for observer in &self.observers {
                        observer.on_update(update);
                    }
                }
            }
            TrackerMessage::Subscribe(observer) => {
                self.observers.push(observer);
                debug!(observers = self.observers.len(), "subscriber added");
            }
            TrackerMessage::ScheduleUnban {
                channel,
                mask,
                after,
                reply_tx,
            } => {
                let deadline = (time::Instant::now() + after).into_std();
                let scheduled = self.tracker.schedule_unban(&channel, &mask, deadline);
                let _ = reply_tx.send(scheduled);
            }
            TrackerMessage::CancelUnban {
                channel,
                mask,
                reply_tx,
            } => {
                let _ = reply_tx.send(self.tracker.cancel_unban(&channel, &mask));
            }
            TrackerMessage::GetChannel { name, reply_tx } => {
                let _ = reply_tx.send(self.tracker.channel(&name).map(Channel::snapshot));
            }
            TrackerMessage::GetChannelNames { reply_tx } => {
                let _ = reply_tx.send(self.tracker.channel_names());
            }
            TrackerMessage::GetNick { reply_tx } => {
                let _ = reply_tx.send(self.tracker.nick().to_string());
            }
            // Handled by the run loop.
            TrackerMessage::Shutdown => {}
        }
    }

    fn fire_due_unbans(&mut self) {
        let now = time::Instant::now().into_std();
        for request in self.tracker.fire_due_unbans(now) {
            info!(channel = %request.channel, mask = %request.mask, "unban timer fired");
            self.dispatch.unban(&request.channel, &request.mask);
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none. A new deadline
/// arriving re-creates this future on the next loop turn.
async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(time::Instant::from_std(deadline)).await,
        None => std::future::pending::<()>().await,
    }
}

/// Cloneable handle to a spawned [`TrackerActor`].
///
/// Every method is a message round-trip (or send) to the tracker task;
/// they fail with [`StateError::TrackerClosed`] once the task is gone.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    tx: mpsc::Sender<TrackerMessage>,
}

impl TrackerHandle {
    /// Feed one parsed event to the tracker. Subscribers hear the
    /// resulting updates before the next event is processed.
    pub async fn apply(&self, event: StateEvent) -> Result<()> {
        self.tx
            .send(TrackerMessage::Apply(event))
            .await
            .map_err(|_| StateError::TrackerClosed)
    }

    /// Register a subscriber for every future update.
    pub async fn subscribe(&self, observer: Arc<dyn StateObserver>) -> Result<()> {
        self.tx
            .send(TrackerMessage::Subscribe(observer))
            .await
            .map_err(|_| StateError::TrackerClosed)
    }

    /// Schedule `mask` to be lifted from `channel` once `after` has
    /// elapsed. Returns false when the channel is untracked or a timer for
    /// this mask is already pending.
    pub async fn schedule_unban(&self, channel: &str, mask: &str, after: Duration) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::ScheduleUnban {
                channel: channel.to_string(),
                mask: mask.to_string(),
                after,
                reply_tx,
            })
            .await
            .map_err(|_| StateError::TrackerClosed)?;
        reply_rx.await.map_err(|_| StateError::TrackerClosed)
    }

    /// Withdraw a pending unban. Returns false when none was pending.
    pub async fn cancel_unban(&self, channel: &str, mask: &str) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::CancelUnban {
                channel: channel.to_string(),
                mask: mask.to_string(),
                reply_tx,
            })
            .await
            .map_err(|_| StateError::TrackerClosed)?;
        reply_rx.await.map_err(|_| StateError::TrackerClosed)
    }

    /// Snapshot one channel's state, or `None` when it is untracked.
    pub async fn channel_info(&self, name: &str) -> Result<Option<ChannelInfo>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::GetChannel {
                name: name.to_string(),
                reply_tx,
            })
            .await
            .map_err(|_| StateError::TrackerClosed)?;
        reply_rx.await.map_err(|_| StateError::TrackerClosed)
    }

    /// Display names of every tracked channel, sorted by folded name.
    pub async fn channel_names(&self) -> Result<Vec<String>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::GetChannelNames { reply_tx })
            .await
            .map_err(|_| StateError::TrackerClosed)?;
        reply_rx.await.map_err(|_| StateError::TrackerClosed)
    }

    /// The local client's current nick.
    pub async fn nick(&self) -> Result<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(TrackerMessage::GetNick { reply_tx })
            .await
            .map_err(|_| StateError::TrackerClosed)?;
        reply_rx.await.map_err(|_| StateError::TrackerClosed)
    }

    /// Stop the tracker task. Pending unban timers die with it; already
    /// queued events are dropped. Idempotent.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(TrackerMessage::Shutdown).await;
    }
}

/// The usual dispatch wiring: unban requests go out over an unbounded
/// channel for the connection layer to turn into `MODE -b` lines.
impl CommandDispatch for mpsc::UnboundedSender<UnbanRequest> {
    fn unban(&self, channel: &str, mask: &str) {
        let _ = self.send(UnbanRequest {
            channel: channel.to_string(),
            mask: mask.to_string(),
        });
    }
}
