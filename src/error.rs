//! Error types for channel state tracking.
//!
//! Nothing in this crate is fatal: the tracker drops undeliverable events
//! and keeps running. These types exist so sub-component calls can report
//! exactly what went wrong and callers (or the log) can tell the cases
//! apart.

use thiserror::Error;

/// Convenience type alias for Results using [`StateError`].
pub type Result<T, E = StateError> = std::result::Result<T, E>;

/// Errors raised while applying protocol events to the channel mirror.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum StateError {
    /// The named channel is not currently tracked.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// The named nick is not a member of the channel under mutation.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// A mode argument could not be used (non-numeric limit, missing key).
    ///
    /// The affected mode mutation is skipped; the rest of the event still
    /// applies.
    #[error("malformed argument for mode '{mode}': {arg:?}")]
    MalformedModeArgument {
        /// The mode letter whose argument was rejected.
        mode: char,
        /// The offending argument, if one was supplied at all.
        arg: Option<String>,
    },

    /// The tracker task is gone, either shut down or crashed.
    #[error("state tracker is not running")]
    TrackerClosed,
}
