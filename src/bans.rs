//! Per-channel ban list state.

/// One ban mask and whatever metadata the server supplied for it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BanEntry {
    /// The `nick!user@host` pattern, stored verbatim.
    pub mask: String,
    /// Nick of whoever set the ban, when known.
    pub set_by: Option<String>,
    /// Unix timestamp the ban was set at, when known.
    pub set_at: Option<i64>,
}

impl BanEntry {
    /// An entry with no metadata.
    #[must_use]
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            mask: mask.into(),
            set_by: None,
            set_at: None,
        }
    }
}

/// The mirror of one channel's ban list.
///
/// Entries are keyed by exact mask and kept in arrival order. Whether a
/// mask actually matches a live user is the server's business; this layer
/// only answers what the server has told it.
#[derive(Debug, Default, Clone)]
pub struct BanList {
    entries: Vec<BanEntry>,
}

impl BanList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, overwriting in place any existing entry with the
    /// same mask (idempotent; a re-sent ban refreshes its metadata).
    pub fn insert(&mut self, entry: BanEntry) {
        match self.entries.iter_mut().find(|e| e.mask == entry.mask) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Remove the entry with this exact mask, returning it if present.
    pub fn remove(&mut self, mask: &str) -> Option<BanEntry> {
        let idx = self.entries.iter().position(|e| e.mask == mask)?;
        Some(self.entries.remove(idx))
    }

    /// Exact-mask membership test.
    #[must_use]
    pub fn contains(&self, mask: &str) -> bool {
        self.entries.iter().any(|e| e.mask == mask)
    }

    /// Look up the entry for an exact mask.
    #[must_use]
    pub fn get(&self, mask: &str) -> Option<&BanEntry> {
        self.entries.iter().find(|e| e.mask == mask)
    }

    /// Iterate entries in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &BanEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no bans are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
