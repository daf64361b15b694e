//! Phone number normalization
//!
//! Canonicalizes arbitrarily formatted phone strings (spaces, parentheses,
//! dots, hyphens, leading symbols, trailing contact names) into a comparable
//! digit-only form. Single-country convention: an international number with
//! the `31` calling code is rewritten to the local leading-zero form, so
//! `+31 6 53233740` and `06-53.233.740` compare equal.
//!
//! Normalizing to the empty string means "unmatchable", not an error.

use std::fmt;

/// Country calling code whose prefix collapses to a leading `0`
const COUNTRY_CODE: &str = "31";

/// Minimum significant digits for a store lookup; shorter queries would
/// produce pathologically broad candidate scans
pub const MIN_MATCH_DIGITS: usize = 6;

/// Number of trailing digits used for the loose store-side pre-filter
pub const SEARCH_SUFFIX_LEN: usize = 7;

/// A digit-only phone string in canonical local form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Normalize an arbitrary phone string.
    ///
    /// Strips every non-digit character; if the remaining digits start with
    /// the country calling code and span at least 11 digits, the code is
    /// replaced by a single leading `0`. Idempotent.
    pub fn normalize(raw: &str) -> Self {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

        let canonical = if digits.starts_with(COUNTRY_CODE) && digits.len() >= 11 {
            format!("0{}", &digits[COUNTRY_CODE.len()..])
        } else {
            digits
        };

        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the number carries enough digits to query the store with
    pub fn is_matchable(&self) -> bool {
        self.0.len() >= MIN_MATCH_DIGITS
    }

    /// Trailing digits used for the permissive store-side filter. Numbers
    /// shorter than the suffix length return the whole string.
    pub fn search_suffix(&self) -> &str {
        let start = self.0.len().saturating_sub(SEARCH_SUFFIX_LEN);
        &self.0[start..]
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
