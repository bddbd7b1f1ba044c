//! Per-channel mode state: simple flags plus the key and limit arguments.

use crate::error::{Result, StateError};

/// The mirror of one channel's mode string.
///
/// Simple flag letters (`n`, `t`, `s`, unknown letters, ...) accumulate in
/// an insertion-ordered, deduplicated string. The argument-carrying modes
/// live in their own fields: `k` is the key, `l` the member limit. Neither
/// appears in the letters string, and neither does `b` - ban masks are list
/// modes owned by the channel's [`BanList`](crate::bans::BanList), routed
/// there before this type is consulted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelModes {
    letters: String,
    key: Option<String>,
    limit: Option<u32>,
}

impl ChannelModes {
    /// Fresh state: no flags, no key, no limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `+<letter>` delta.
    ///
    /// `k` requires an argument and stores it as the key; `l` requires a
    /// numeric argument and stores it as the limit. A missing or
    /// non-numeric argument yields [`StateError::MalformedModeArgument`]
    /// and leaves all state untouched. Any other letter is appended to the
    /// letters string if not already present; a second add of the same
    /// letter is a no-op.
    pub fn apply_add(&mut self, letter: char, arg: Option<&str>) -> Result<()> {
        match letter {
            'k' => {
                let key = arg.ok_or_else(|| StateError::MalformedModeArgument {
                    mode: 'k',
                    arg: None,
                })?;
                self.key = Some(key.to_string());
            }
            'l' => {
                let limit = arg
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(|| StateError::MalformedModeArgument {
                        mode: 'l',
                        arg: arg.map(str::to_string),
                    })?;
                self.limit = Some(limit);
            }
            // List mode; the owning channel routes these to its ban list.
            'b' => {}
            _ => {
                if !self.letters.contains(letter) {
                    self.letters.push(letter);
                }
            }
        }
        Ok(())
    }

    /// Apply a `-<letter>` delta.
    ///
    /// `k` clears the key, `l` clears the limit, anything else removes the
    /// letter from the letters string if present. Never fails.
    pub fn apply_delete(&mut self, letter: char) {
        match letter {
            'k' => self.key = None,
            'l' => self.limit = None,
            'b' => {}
            _ => self.letters.retain(|c| c != letter),
        }
    }

    /// Reset everything, as happens when the channel is freshly (re)joined.
    pub fn clear(&mut self) {
        self.letters.clear();
        self.key = None;
        self.limit = None;
    }

    /// Whether a single flag letter is set. `k` and `l` answer from their
    /// own fields.
    #[must_use]
    pub fn has(&self, letter: char) -> bool {
        match letter {
            'k' => self.key.is_some(),
            'l' => self.limit.is_some(),
            _ => self.letters.contains(letter),
        }
    }

    /// Whether every letter of `letters` is set, in any order.
    #[must_use]
    pub fn has_all(&self, letters: &str) -> bool {
        letters.chars().all(|c| self.has(c))
    }

    /// The flag letters in first-set order, for display.
    #[must_use]
    pub fn letters(&self) -> &str {
        &self.letters
    }

    /// The channel key, if one is set.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The member limit, if one is set.
    #[must_use]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }
}
