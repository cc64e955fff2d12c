// 🧹 Name Normalizer - Canonical keys for free-text names
//
// Problem solved:
// - "  ACME   Ltd " and "acme ltd" → same contributor key
// - "ACME Ltd" vs "ACME" → equal once organizational markers are stripped
// - "A. B." vs "AB Corporation" → comparable once initials are folded
//
// Each stage is pure, total and idempotent. `normalize` yields the identity key;
// the other two stages are comparison views used only by the matcher tiers.

use once_cell::sync::Lazy;
use regex::Regex;

/// Organizational markers stripped in the suffix tier (company / association / legal entity)
pub const DEFAULT_ORG_SUFFIXES: &[&str] = &[
    "בע\"מ",
    "בעמ",
    "עמותת",
    "עמותה",
    "חברה",
    "חברת",
    "ltd",
    "inc",
    "llc",
    "corp",
    "corporation",
    "company",
    "co",
];

/// A dot plus any whitespace that follows it ("A. B." → "AB")
static ABBREVIATION_DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\s*").unwrap());

/// Identity key: trim, collapse internal whitespace runs, lowercase
///
/// Punctuation is kept. An empty result means the name takes no part in matching.
pub fn normalize(raw: &str) -> String {
    let cleaned = raw.replace(['\u{feff}', '\u{200b}', '\u{200f}', '\u{200e}'], "");
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove organizational markers appearing as whole tokens
///
/// Tokens compare case-insensitively and ignore trailing "." or "," ("Ltd." / "Inc.,").
/// Removing whole tokens can never create a new marker, so the stage is idempotent.
pub fn strip_org_suffixes<S: AsRef<str>>(key: &str, suffixes: &[S]) -> String {
    key.split_whitespace()
        .filter(|token| {
            let bare = token.trim_end_matches(['.', ',']).to_lowercase();
            !suffixes
                .iter()
                .any(|suffix| suffix.as_ref().to_lowercase() == bare)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop abbreviation dots (and the space after them), lowercased for comparison
pub fn fold_abbreviations(key: &str) -> String {
    let folded = ABBREVIATION_DOT.replace_all(key, "");
    normalize(&folded)
}

// ============================================================================
// TESTS
// ============================================================================
