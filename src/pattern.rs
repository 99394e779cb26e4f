//! Pattern matching for vanity addresses.
//!
//! Rewritten from the teacher's hex prefix/vanity-palindrome predicate:
//! `PatternConfig`/`PatternMode` and the byte-level hot path next to a
//! string-level `description()`/`estimated_probability()` pair carry over in
//! shape, but the match semantics are entirely different (Base58
//! prefix/suffix/anywhere with a `?` wildcard and optional case folding).

/// Anchor mode for a pattern match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternMode {
    Prefix,
    Suffix,
    Anywhere,
}

/// A compiled vanity-address pattern.
#[derive(Clone, Debug)]
pub struct PatternConfig {
    pub mode: PatternMode,
    pub case_sensitive: bool,
    /// Raw pattern bytes, `?` meaning wildcard. ASCII only.
    pub bytes: Vec<u8>,
}

impl PatternConfig {
    pub fn new(pattern: &str, mode: PatternMode, case_sensitive: bool) -> Self {
        Self {
            mode,
            case_sensitive,
            bytes: pattern.as_bytes().to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of non-wildcard characters, used by the difficulty model.
    pub fn effective_len(&self) -> usize {
        self.bytes.iter().filter(|&&b| b != b'?').count()
    }

    pub fn description(&self) -> String {
        let mode = match self.mode {
            PatternMode::Prefix => "prefix",
            PatternMode::Suffix => "suffix",
            PatternMode::Anywhere => "anywhere",
        };
        let pattern = String::from_utf8_lossy(&self.bytes);
        let case = if self.case_sensitive {
            "case-sensitive"
        } else {
            "case-insensitive"
        };
        format!("{} '{}' ({})", mode, pattern, case)
    }
}

#[inline(always)]
fn fold(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

#[inline(always)]
fn char_matches(pattern_byte: u8, addr_byte: u8, case_sensitive: bool) -> bool {
    if pattern_byte == b'?' {
        return true;
    }
    if case_sensitive {
        pattern_byte == addr_byte
    } else {
        fold(pattern_byte) == fold(addr_byte)
    }
}

#[inline(always)]
fn matches_at(pattern: &[u8], addr: &[u8], anchor: usize, case_sensitive: bool) -> bool {
    for (i, &p) in pattern.iter().enumerate() {
        if !char_matches(p, addr[anchor + i], case_sensitive) {
            return false;
        }
    }
    true
}

/// Test an address (Base58 text) against a compiled pattern.
pub fn matches(addr: &[u8], config: &PatternConfig) -> bool {
    let pattern = &config.bytes;
    let p_len = pattern.len();
    let a_len = addr.len();
    if p_len > a_len {
        return false;
    }

    match config.mode {
        PatternMode::Prefix => matches_at(pattern, addr, 0, config.case_sensitive),
        PatternMode::Suffix => matches_at(pattern, addr, a_len - p_len, config.case_sensitive),
        PatternMode::Anywhere => {
            for anchor in 0..=(a_len - p_len) {
                if matches_at(pattern, addr, anchor, config.case_sensitive) {
                    return true;
                }
            }
            false
        }
    }
}

/// Validate a raw pattern string against the Base58-plus-`?` alphabet,
/// returning `(offending_char, position)` on the first violation.
pub fn validate(pattern: &str) -> Result<(), (char, usize)> {
    for (i, ch) in pattern.chars().enumerate() {
        if ch == '?' {
            continue;
        }
        if !ch.is_ascii() || !crate::base58::ALPHABET.contains(&(ch as u8)) {
            return Err((ch, i));
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn alphabet_string(max_len: usize) -> impl Strategy<Value = String> {
        proptest::collection::vec(
            proptest::sample::select(crate::base58::ALPHABET.to_vec()),
            1..=max_len,
        )
        .prop_map(|bytes| String::from_utf8(bytes).unwrap())
    }

    proptest! {
        #[test]
        fn wildcard_only_pattern_matches_every_long_enough_address(
            pattern_len in 1usize..=6,
            addr in alphabet_string(12),
            mode in prop_oneof![Just(PatternMode::Prefix), Just(PatternMode::Suffix), Just(PatternMode::Anywhere)],
        ) {
            prop_assume!(addr.len() >= pattern_len);
            let pattern = "?".repeat(pattern_len);
            let c = PatternConfig::new(&pattern, mode, true);
            prop_assert!(matches(addr.as_bytes(), &c));
        }

        #[test]
        fn idempotent_match_holds_for_arbitrary_inputs(
            pattern in alphabet_string(5),
            addr in alphabet_string(12),
            case_sensitive in any::<bool>(),
            mode in prop_oneof![Just(PatternMode::Prefix), Just(PatternMode::Suffix), Just(PatternMode::Anywhere)],
        ) {
            let c = PatternConfig::new(&pattern, mode, case_sensitive);
            let a = matches(addr.as_bytes(), &c);
            let b = matches(addr.as_bytes(), &c);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prefix_match_is_preserved_by_appending_to_address(
            pattern in alphabet_string(4),
            suffix in alphabet_string(8),
        ) {
            let c = PatternConfig::new(&pattern, PatternMode::Prefix, true);
            let mut extended = pattern.clone();
            extended.push_str(&suffix);
            prop_assert!(matches(extended.as_bytes(), &c));
        }
    }
}
