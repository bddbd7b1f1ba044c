//! Channel privilege ranks and per-member privilege sets.

use std::fmt;

/// A channel privilege rank, ordered lowest to highest.
///
/// `Regular` is the floor of the order: the rank of a member holding no
/// status prefix at all. It has no symbol and no mode letter and is never
/// stored in a [`PrivilegeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Privilege {
    /// No channel status.
    Regular,
    /// 'v' / '+' - Voice.
    Voice,
    /// 'h' / '%' - Half-operator.
    HalfOp,
    /// 'o' / '@' - Operator.
    Op,
    /// 'a' / '&' - Admin (protected).
    Admin,
    /// 'q' / '~' - Owner (founder).
    Owner,
}

impl Privilege {
    /// Every rank above `Regular`, lowest first.
    pub const RANKED: [Privilege; 5] = [
        Privilege::Voice,
        Privilege::HalfOp,
        Privilege::Op,
        Privilege::Admin,
        Privilege::Owner,
    ];

    /// Map a NAMES status symbol to its rank.
    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Privilege::Voice),
            '%' => Some(Privilege::HalfOp),
            '@' => Some(Privilege::Op),
            '&' => Some(Privilege::Admin),
            '~' => Some(Privilege::Owner),
            _ => None,
        }
    }

    /// Map a privilege mode letter (`v h o a q`) to its rank.
    #[must_use]
    pub fn from_mode_char(letter: char) -> Option<Self> {
        match letter {
            'v' => Some(Privilege::Voice),
            'h' => Some(Privilege::HalfOp),
            'o' => Some(Privilege::Op),
            'a' => Some(Privilege::Admin),
            'q' => Some(Privilege::Owner),
            _ => None,
        }
    }

    /// The status symbol for this rank (`None` for `Regular`).
    #[must_use]
    pub fn symbol(self) -> Option<char> {
        match self {
            Privilege::Regular => None,
            Privilege::Voice => Some('+'),
            Privilege::HalfOp => Some('%'),
            Privilege::Op => Some('@'),
            Privilege::Admin => Some('&'),
            Privilege::Owner => Some('~'),
        }
    }

    /// The mode letter that grants this rank (`None` for `Regular`).
    #[must_use]
    pub fn mode_char(self) -> Option<char> {
        match self {
            Privilege::Regular => None,
            Privilege::Voice => Some('v'),
            Privilege::HalfOp => Some('h'),
            Privilege::Op => Some('o'),
            Privilege::Admin => Some('a'),
            Privilege::Owner => Some('q'),
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Privilege::Regular => 0,
            Privilege::Voice => 1,
            Privilege::HalfOp => 1 << 1,
            Privilege::Op => 1 << 2,
            Privilege::Admin => 1 << 3,
            Privilege::Owner => 1 << 4,
        }
    }
}

/// The set of privilege ranks one member holds on one channel.
///
/// One bit per rank. Add and remove are idempotent; `Regular` is never
/// stored, it is what [`highest`](Self::highest) reports for an empty set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrivilegeSet(u8);

impl PrivilegeSet {
    /// An empty set (a regular member).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a run of status symbols, e.g. `"@"` or `"+%"`.
    ///
    /// Unrecognized characters are skipped, matching how a NAMES token with
    /// an unexpected prefix should degrade.
    #[must_use]
    pub fn from_symbols(symbols: &str) -> Self {
        let mut set = Self::new();
        for rank in symbols.chars().filter_map(Privilege::from_symbol) {
            set.add(rank);
        }
        set
    }

    /// Add a rank. Adding an already-held rank (or `Regular`) is a no-op.
    pub fn add(&mut self, rank: Privilege) {
        self.0 |= rank.bit();
    }

    /// Remove a rank. Removing an absent rank (or `Regular`) is a no-op.
    pub fn remove(&mut self, rank: Privilege) {
        self.0 &= !rank.bit();
    }

    /// Exact membership test. Always false for `Regular`.
    #[must_use]
    pub fn has(&self, rank: Privilege) -> bool {
        rank != Privilege::Regular && self.0 & rank.bit() != 0
    }

    /// Rank-order test: true if the member holds `rank` or anything above
    /// it. Every set, including the empty one, satisfies
    /// `has_at_least(Regular)`.
    #[must_use]
    pub fn has_at_least(&self, rank: Privilege) -> bool {
        self.highest() >= rank
    }

    /// The highest rank held, or `Regular` for an empty set.
    #[must_use]
    pub fn highest(&self) -> Privilege {
        Privilege::RANKED
            .iter()
            .rev()
            .copied()
            .find(|rank| self.has(*rank))
            .unwrap_or(Privilege::Regular)
    }

    /// True when no rank is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The status symbols held, highest first (multi-prefix order).
    #[must_use]
    pub fn symbols(&self) -> String {
        let mut s = String::with_capacity(Privilege::RANKED.len());
        for rank in Privilege::RANKED.iter().rev() {
            if self.has(*rank) {
                if let Some(symbol) = rank.symbol() {
                    s.push(symbol);
                }
            }
        }
        s
    }
}

impl fmt::Display for PrivilegeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbols())
    }
}

/// Split a NAMES token into its leading status-symbol run and the nick.
///
/// Servers with `multi-prefix` negotiated send every rank a member holds,
/// e.g. `"@+alice"`; without it there is at most one symbol. Either way the
/// whole leading run is consumed.
#[must_use]
pub fn split_names_token(token: &str) -> (PrivilegeSet, &str) {
    let (symbols, nick) = match token.find(|c| Privilege::from_symbol(c).is_none()) {
        Some(nick_start) => token.split_at(nick_start),
        // All symbols, no nick.
        None => (token, ""),
    };
    (PrivilegeSet::from_symbols(symbols), nick)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_mode_char_round_trip() {
        for rank in Privilege::RANKED {
            assert_eq!(Privilege::from_symbol(rank.symbol().unwrap()), Some(rank));
            assert_eq!(
                Privilege::from_mode_char(rank.mode_char().unwrap()),
                Some(rank)
            );
        }
        assert_eq!(Privilege::from_symbol('x'), None);
        assert_eq!(Privilege::from_mode_char('b'), None);
        assert_eq!(Privilege::Regular.symbol(), None);
    }

    #[test]
    fn ranks_are_totally_ordered() {
        assert!(Privilege::Regular < Privilege::Voice);
        assert!(Privilege::Voice < Privilege::HalfOp);
        assert!(Privilege::HalfOp < Privilege::Op);
        assert!(Privilege::Op < Privilege::Admin);
        assert!(Privilege::Admin < Privilege::Owner);
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut set = PrivilegeSet::new();
        set.add(Privilege::Op);
        let once = set;
        set.add(Privilege::Op);
        assert_eq!(set, once);

        set.remove(Privilege::Voice); // never held
        assert_eq!(set, once);
        set.remove(Privilege::Op);
        set.remove(Privilege::Op);
        assert!(set.is_empty());
    }

    #[test]
    fn regular_is_not_storable() {
        let mut set = PrivilegeSet::new();
        set.add(Privilege::Regular);
        assert!(set.is_empty());
        assert!(!set.has(Privilege::Regular));
    }

    #[test]
    fn highest_of_empty_is_regular() {
        let set = PrivilegeSet::new();
        assert_eq!(set.highest(), Privilege::Regular);
        assert!(set.has_at_least(Privilege::Regular));
        assert!(!set.has_at_least(Privilege::Voice));
    }

    #[test]
    fn has_at_least_follows_rank_order() {
        let mut set = PrivilegeSet::new();
        set.add(Privilege::Op);
        assert!(set.has_at_least(Privilege::Regular));
        assert!(set.has_at_least(Privilege::Voice));
        assert!(set.has_at_least(Privilege::HalfOp));
        assert!(set.has_at_least(Privilege::Op));
        assert!(!set.has_at_least(Privilege::Admin));
        assert!(!set.has_at_least(Privilege::Owner));

        // Exact membership stays exact.
        assert!(set.has(Privilege::Op));
        assert!(!set.has(Privilege::Voice));
    }

    #[test]
    fn from_symbols_ignores_unknown_characters() {
        let set = PrivilegeSet::from_symbols("@+x");
        assert!(set.has(Privilege::Op));
        assert!(set.has(Privilege::Voice));
        assert_eq!(set.symbols(), "@+");
    }

    #[test]
    fn symbols_render_highest_first() {
        let set = PrivilegeSet::from_symbols("+~@");
        assert_eq!(set.symbols(), "~@+");
        assert_eq!(set.to_string(), "~@+");
    }

    #[test]
    fn names_token_strips_whole_symbol_run() {
        let (privs, nick) = split_names_token("@+Bob");
        assert!(privs.has(Privilege::Op));
        assert!(privs.has(Privilege::Voice));
        assert_eq!(nick, "Bob");

        let (privs, nick) = split_names_token("Carol");
        assert!(privs.is_empty());
        assert_eq!(nick, "Carol");

        // A token that is all symbols leaves an empty nick.
        let (_, nick) = split_names_token("@");
        assert_eq!(nick, "");
    }
}
