//! RFC 1459 case mapping.
//!
//! Nick and channel names compare case-insensitively on IRC, and the fold
//! is not plain ASCII: the bracket characters pair with their shifted forms
//! (`[` with `{`, `]` with `}`, `\` with `|`, `~` with `^`). Every map in
//! this crate that is keyed by nick or channel name folds the key through
//! [`irc_to_lower`] at the point of access, so `Nick[1]` and `nick{1}`
//! always land on the same entry.

/// Fold a single character under RFC 1459 case mapping.
///
/// ASCII uppercase folds as usual; additionally `[` → `{`, `]` → `}`,
/// `\` → `|` and `~` → `^`. Everything else passes through unchanged.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Fold a whole string under RFC 1459 case mapping.
///
/// Used for every nick and channel map key in this crate.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under RFC 1459 case mapping.
///
/// Equivalent to comparing the [`irc_to_lower`] folds without allocating.
pub fn irc_eq(a: &str, b: &str) -> bool {
    // The fold is char-for-char, so differing lengths can never match.
    if a.len() != b.len() {
        return false;
    }
    a.chars()
        .zip(b.chars())
        .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_ascii_uppercase() {
        assert_eq!(irc_lower_char('A'), 'a');
        assert_eq!(irc_lower_char('Q'), 'q');
        assert_eq!(irc_lower_char('z'), 'z');
        assert_eq!(irc_lower_char('3'), '3');
    }

    #[test]
    fn folds_bracket_pairs() {
        assert_eq!(irc_lower_char('['), '{');
        assert_eq!(irc_lower_char(']'), '}');
        assert_eq!(irc_lower_char('\\'), '|');
        assert_eq!(irc_lower_char('~'), '^');
        // Already-folded forms stay put.
        assert_eq!(irc_lower_char('{'), '{');
        assert_eq!(irc_lower_char('|'), '|');
    }

    #[test]
    fn folds_whole_keys() {
        assert_eq!(irc_to_lower("#Rust"), "#rust");
        assert_eq!(irc_to_lower("Nick[1]"), "nick{1}");
        assert_eq!(irc_to_lower("Ope~rator"), "ope^rator");
        assert_eq!(irc_to_lower("back\\slash"), "back|slash");
    }

    #[test]
    fn eq_matches_fold() {
        assert!(irc_eq("#Channel", "#channel"));
        assert!(irc_eq("Nick[1]", "nick{1}"));
        assert!(irc_eq("a~b", "A^B"));
        assert!(!irc_eq("alice", "bob"));
        assert!(!irc_eq("alice", "alicia"));
    }

    #[test]
    fn eq_rejects_length_mismatch() {
        assert!(!irc_eq("", "a"));
        assert!(!irc_eq("nick", "nick_"));
    }
}
