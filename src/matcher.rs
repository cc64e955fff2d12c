// 🔍 Fuzzy Matcher - Decide which contributor a declared name refers to
//
// Four tiers, highest precision first. Every tier re-scans the full candidate
// list before the next tier is tried:
//   1. Exact               - normalized keys are identical
//   2. Substring           - one contains the other, or case-insensitive equality
//   3. SuffixStripped      - tier 2 after removing organizational markers
//   4. AbbreviationFolded  - tier 2 after folding initials ("A. B." → "ab")

use crate::config::{MatchingConfig, TieBreak};
use crate::normalizer::{fold_abbreviations, normalize, strip_org_suffixes};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// MATCH TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchTier {
    Exact,
    Substring,
    SuffixStripped,
    AbbreviationFolded,
}

impl MatchTier {
    pub const ALL: [MatchTier; 4] = [
        MatchTier::Exact,
        MatchTier::Substring,
        MatchTier::SuffixStripped,
        MatchTier::AbbreviationFolded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Substring => "substring",
            MatchTier::SuffixStripped => "suffix-stripped",
            MatchTier::AbbreviationFolded => "abbreviation-folded",
        }
    }
}

// ============================================================================
// NAME MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch<'a> {
    /// The matched candidate key
    pub candidate: &'a str,

    /// Position of the candidate in the list handed to `find`
    pub index: usize,

    /// Which tier produced the match
    pub tier: MatchTier,
}

// ============================================================================
// TIER PREDICATES (pure, total, over already-normalized keys)
// ============================================================================

/// Tier 1: identical keys
pub fn exact_match(query: &str, candidate: &str) -> bool {
    !query.is_empty() && query == candidate
}

/// Tier 2: containment either way, or equality ignoring case
///
/// An empty operand is contained in everything, so it never matches.
pub fn substring_match(query: &str, candidate: &str) -> bool {
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    query.contains(candidate)
        || candidate.contains(query)
        || query.to_lowercase() == candidate.to_lowercase()
}

/// Tier 3: tier 2 on both sides with organizational markers removed
pub fn suffix_stripped_match<S: AsRef<str>>(query: &str, candidate: &str, suffixes: &[S]) -> bool {
    substring_match(
        &strip_org_suffixes(query, suffixes),
        &strip_org_suffixes(candidate, suffixes),
    )
}

/// Tier 4: tier 2 on both sides with abbreviation dots folded away (case-insensitive)
pub fn abbreviation_match(query: &str, candidate: &str) -> bool {
    substring_match(&fold_abbreviations(query), &fold_abbreviations(candidate))
}

// ============================================================================
// FUZZY MATCHER
// ============================================================================

pub struct FuzzyMatcher {
    org_suffixes: Vec<String>,
    tie_break: TieBreak,
}

impl FuzzyMatcher {
    /// Matcher with the default suffix list and first-seen tie-break
    pub fn new() -> Self {
        Self::from_config(&MatchingConfig::default())
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        FuzzyMatcher {
            org_suffixes: config.org_suffixes.clone(),
            tie_break: config.tie_break,
        }
    }

    /// Check one tier for a (query, candidate) pair
    pub fn tier_matches(&self, tier: MatchTier, query: &str, candidate: &str) -> bool {
        match tier {
            MatchTier::Exact => exact_match(query, candidate),
            MatchTier::Substring => substring_match(query, candidate),
            MatchTier::SuffixStripped => {
                suffix_stripped_match(query, candidate, &self.org_suffixes)
            }
            MatchTier::AbbreviationFolded => abbreviation_match(query, candidate),
        }
    }

    /// Find the candidate a free-text name refers to
    ///
    /// `candidates` are normalized keys in ledger order. The query is normalized here;
    /// an empty query never matches.
    pub fn find<'a, S: AsRef<str>>(&self, query: &str, candidates: &'a [S]) -> Option<NameMatch<'a>> {
        let query = normalize(query);
        if query.is_empty() || candidates.is_empty() {
            return None;
        }

        for tier in MatchTier::ALL {
            let mut hits = candidates
                .iter()
                .map(|candidate| candidate.as_ref())
                .enumerate()
                .filter(|(_, candidate)| self.tier_matches(tier, &query, candidate));

            let winner = match self.tie_break {
                TieBreak::FirstSeen => hits.next(),
                // max_by_key keeps the last maximum, so compare with reversed index
                TieBreak::LongestCandidate => hits.max_by_key(|(index, candidate)| {
                    (candidate.chars().count(), std::cmp::Reverse(*index))
                }),
            };

            if let Some((index, candidate)) = winner {
                debug!(query = %query, candidate, tier = tier.as_str(), "name matched");
                return Some(NameMatch {
                    candidate,
                    index,
                    tier,
                });
            }
        }

        debug!(query = %query, "no candidate matched");
        None
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
