//! Query classification: maps a search string to the kind of thing it names.
//!
//! Pure and synchronous; nothing here touches the network.

use crate::constants::query::{
    BASE64_HASH_LENGTH, BLOCK_PREFIX, HEX_HASH_LENGTH, MAX_BLOCK_HEIGHT_DIGITS,
    MAX_NAMESPACE_DIGITS, MIN_NAMESPACE_DIGITS, TX_PREFIX,
};
use crate::types::QueryKind;

fn is_base64url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | '_' | '-')
}

fn is_hex_hash(s: &str) -> bool {
    s.len() == HEX_HASH_LENGTH && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// ASCII words separated by single spaces, e.g. `"Molten Network"`.
fn is_rollup_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .split(' ')
            .all(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Classify `input` (trimmed first). First matching rule wins.
pub fn classify(input: &str) -> QueryKind {
    let q = input.trim();
    if q.is_empty() {
        return QueryKind::Invalid;
    }

    if q.starts_with(TX_PREFIX) {
        return QueryKind::Transaction;
    }
    if q.starts_with(BLOCK_PREFIX) {
        return QueryKind::BlockHash;
    }
    if q.len() == BASE64_HASH_LENGTH && q.chars().all(is_base64url_char) {
        return QueryKind::Transaction;
    }
    if let Some(hex) = q.strip_prefix("0x") {
        if is_hex_hash(hex) {
            return QueryKind::BlockHash;
        }
    }
    if is_hex_hash(q) {
        return QueryKind::Transaction;
    }
    if all_digits(q) {
        return match q.len() {
            n if (MIN_NAMESPACE_DIGITS..=MAX_NAMESPACE_DIGITS).contains(&n) => QueryKind::Namespace,
            n if n <= MAX_BLOCK_HEIGHT_DIGITS => QueryKind::BlockOrNamespace,
            _ => QueryKind::Invalid,
        };
    }
    if is_rollup_name(q) {
        return QueryKind::RollupName;
    }
    QueryKind::Invalid
}

/// True for inputs too short to be worth searching: non-numeric and under
/// the minimum length.
pub fn is_too_short(input: &str, min_len: usize) -> bool {
    let q = input.trim();
    !all_digits(q) && q.chars().count() < min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_are_invalid() {
        assert_eq!(classify(""), QueryKind::Invalid);
        assert_eq!(classify("   \t"), QueryKind::Invalid);
    }

    #[test]
    fn marker_prefixes_win_regardless_of_rest() {
        assert_eq!(classify("TX~abc123"), QueryKind::Transaction);
        assert_eq!(classify("TX~"), QueryKind::Transaction);
        assert_eq!(classify("TX~ not a hash !!"), QueryKind::Transaction);
        assert_eq!(classify("BLOCK~zzz"), QueryKind::BlockHash);
        assert_eq!(classify("  TX~x  "), QueryKind::Transaction);
    }

    #[test]
    fn base64url_hash_of_exact_length_is_transaction() {
        let h = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJ_-+/0123";
        assert_eq!(h.len(), 44);
        assert_eq!(classify(h), QueryKind::Transaction);
        assert_eq!(classify(&h[..43]), QueryKind::Invalid);
        // 44 digits hit the base64url rule before any digit window
        assert_eq!(classify(&"1".repeat(44)), QueryKind::Transaction);
    }

    #[test]
    fn hex_hashes() {
        let hex = "a".repeat(64);
        assert_eq!(classify(&format!("0x{hex}")), QueryKind::BlockHash);
        assert_eq!(classify(&hex), QueryKind::Transaction);
        assert_eq!(classify(&format!("0x{}", "a".repeat(63))), QueryKind::Invalid);
        assert_eq!(classify(&format!("0x{}", "g".repeat(64))), QueryKind::Invalid);
    }

    #[test]
    fn digit_windows() {
        for n in 1..=12 {
            assert_eq!(classify(&"7".repeat(n)), QueryKind::BlockOrNamespace, "{n} digits");
        }
        for n in 13..=15 {
            assert_eq!(classify(&"7".repeat(n)), QueryKind::Namespace, "{n} digits");
        }
        assert_eq!(classify(&"7".repeat(16)), QueryKind::Invalid);
        assert_eq!(classify("123456"), QueryKind::BlockOrNamespace);
    }

    #[test]
    fn rollup_names() {
        assert_eq!(classify("Molten"), QueryKind::RollupName);
        assert_eq!(classify("Molten Network"), QueryKind::RollupName);
        assert_eq!(classify("Molten  Network"), QueryKind::Invalid);
        assert_eq!(classify("Molten-1"), QueryKind::Invalid);
        assert_eq!(classify("a"), QueryKind::RollupName);
    }

    #[test]
    fn short_non_numeric_queries() {
        assert!(is_too_short("a", 2));
        assert!(!is_too_short("ab", 2));
        assert!(!is_too_short("7", 2));
    }
}
