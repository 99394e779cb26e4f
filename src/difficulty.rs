//! Expected-attempts / P50 difficulty model for progress reporting.
//!
//! Generalizes the teacher's `PatternConfig::estimated_probability` (which
//! used a hex alphabet of size 16) to the Base58 alphabet sizes named in
//! spec §4.9: 58 case-sensitive, 34 case-insensitive equivalence classes.

use crate::pattern::{PatternConfig, PatternMode};

const ADDRESS_LEN: f64 = 44.0;

fn alphabet_size(case_sensitive: bool) -> f64 {
    if case_sensitive {
        58.0
    } else {
        34.0
    }
}

/// Expected number of attempts until one match, given the compiled pattern.
pub fn expected_attempts(config: &PatternConfig) -> f64 {
    let a = alphabet_size(config.case_sensitive);
    let l_star = config.effective_len() as i32;
    let base = a.powi(l_star);

    match config.mode {
        PatternMode::Prefix | PatternMode::Suffix => base,
        PatternMode::Anywhere => {
            let p = config.len() as f64;
            if p < ADDRESS_LEN {
                base / (ADDRESS_LEN - p + 1.0)
            } else {
                base
            }
        }
    }
}

/// Median number of attempts (P50) until one match: E * ln(2).
pub fn p50_attempts(config: &PatternConfig) -> f64 {
    expected_attempts(config) * std::f64::consts::LN_2
}

/// Probability of a single attempt matching (1 / E), used for live ETA math.
pub fn probability_per_attempt(config: &PatternConfig) -> f64 {
    1.0 / expected_attempts(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_difficulty_matches_alphabet_power() {
        let c = PatternConfig::new("AB", PatternMode::Prefix, true);
        let e = expected_attempts(&c);
        assert!((e - 58f64.powi(2)).abs() < 1.0);
    }

    #[test]
    fn case_insensitive_uses_smaller_alphabet() {
        let sensitive = PatternConfig::new("AB", PatternMode::Prefix, true);
        let insensitive = PatternConfig::new("AB", PatternMode::Prefix, false);
        assert!(expected_attempts(&insensitive) < expected_attempts(&sensitive));
    }

    #[test]
    fn wildcards_reduce_effective_length() {
        let full = PatternConfig::new("AB", PatternMode::Prefix, true);
        let wild = PatternConfig::new("A?", PatternMode::Prefix, true);
        assert!(expected_attempts(&wild) < expected_attempts(&full));
    }

    #[test]
    fn p50_is_ln2_fraction_of_expected() {
        let c = PatternConfig::new("ZZZZ", PatternMode::Prefix, true);
        let e = expected_attempts(&c);
        let p50 = p50_attempts(&c);
        assert!((p50 / e - std::f64::consts::LN_2).abs() < 1e-9);
    }

    #[test]
    fn anywhere_mode_is_cheaper_than_prefix() {
        let prefix = PatternConfig::new("AB", PatternMode::Prefix, true);
        let anywhere = PatternConfig::new("AB", PatternMode::Anywhere, true);
        assert!(expected_attempts(&anywhere) < expected_attempts(&prefix));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prefix_and_suffix_expected_attempts_match_alphabet_power(
            len in 1usize..=6,
            case_sensitive in any::<bool>(),
            suffix_mode in any::<bool>(),
        ) {
            let pattern_text = "A".repeat(len);
            let mode = if suffix_mode { PatternMode::Suffix } else { PatternMode::Prefix };
            let c = PatternConfig::new(&pattern_text, mode, case_sensitive);
            let a = if case_sensitive { 58.0f64 } else { 34.0f64 };
            let expected = a.powi(len as i32);
            prop_assert!((expected_attempts(&c) - expected).abs() <= 1.0);
        }
    }
}
