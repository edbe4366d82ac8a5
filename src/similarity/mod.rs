// src/similarity/mod.rs
//
// Decides whether two addresses are visually confusable. Real poisoning
// addresses are brute-forced vanity addresses whose first and last few
// characters match the target, with an arbitrary middle, so both policies
// look only at the boundaries of the string.
//
// Known limitation carried over from the data pipeline: inputs are compared
// as-is, so a wrong-length or non-hex string still goes through best-effort
// string comparison instead of being rejected.

use serde::{Deserialize, Serialize};

/// Policy A window: hex characters after `0x` compared at the front.
const EXACT_PREFIX_LEN: usize = 3;
/// Policy A window: characters compared at the back.
const EXACT_SUFFIX_LEN: usize = 4;

/// The two detection strategies. They disagree on purpose and are never
/// mixed: `ExactBoundary` is cheap and precise, `WeightedOverlap` is more
/// permissive and catches partial vanity matches at the cost of more false
/// positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityPolicy {
    ExactBoundary,
    WeightedOverlap,
}

/// Knobs for the `WeightedOverlap` policy. The defaults are the empirically
/// chosen constants from the field data; they are configuration, not law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Exact-match override window at each end of the full string.
    pub boundary_window: usize,
    /// Position-wise comparison window at each end of the full string.
    pub scan_window: usize,
    /// Minimum combined position-wise matches to call a pair similar.
    pub overlap_threshold: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            boundary_window: 5,
            scan_window: 10,
            overlap_threshold: 10,
        }
    }
}

pub struct SimilarityEngine {
    policy: SimilarityPolicy,
    config: SimilarityConfig,
}

impl SimilarityEngine {
    pub fn new(policy: SimilarityPolicy) -> Self {
        Self {
            policy,
            config: SimilarityConfig::default(),
        }
    }

    pub fn with_config(policy: SimilarityPolicy, config: SimilarityConfig) -> Self {
        Self { policy, config }
    }

    /// The active policy. Callers report this alongside results so a verdict
    /// is never detached from the strategy that produced it.
    pub fn policy(&self) -> SimilarityPolicy {
        self.policy
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Label a pair as confusable or not.
    ///
    /// Missing or empty inputs are "not similar" rather than an error:
    /// absence of data is absence of evidence. An address is never similar
    /// to itself (case-insensitive).
    pub fn is_similar(&self, a: Option<&str>, b: Option<&str>) -> bool {
        let (a, b) = match (a, b) {
            (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => return false,
        };

        let a = a.to_ascii_lowercase();
        let b = b.to_ascii_lowercase();
        if a == b {
            return false;
        }

        match self.policy {
            SimilarityPolicy::ExactBoundary => exact_boundary(&a, &b),
            SimilarityPolicy::WeightedOverlap => weighted_overlap(&a, &b, &self.config),
        }
    }
}

/// Policy A: first `EXACT_PREFIX_LEN` hex characters (after `0x`) and last
/// `EXACT_SUFFIX_LEN` characters must both match exactly.
fn exact_boundary(a: &str, b: &str) -> bool {
    let a = a.strip_prefix("0x").unwrap_or(a);
    let b = b.strip_prefix("0x").unwrap_or(b);

    take_prefix(a, EXACT_PREFIX_LEN) == take_prefix(b, EXACT_PREFIX_LEN)
        && take_suffix(a, EXACT_SUFFIX_LEN) == take_suffix(b, EXACT_SUFFIX_LEN)
}

/// Policy B: exact boundary-window match overrides, otherwise the combined
/// position-wise overlap in the scan windows must reach the threshold.
/// Windows run over the full string including `0x`, matching the original
/// field tooling.
fn weighted_overlap(a: &str, b: &str, config: &SimilarityConfig) -> bool {
    if take_prefix(a, config.boundary_window) == take_prefix(b, config.boundary_window)
        && take_suffix(a, config.boundary_window) == take_suffix(b, config.boundary_window)
    {
        return true;
    }

    let prefix_score = count_matching_chars(
        &take_prefix(a, config.scan_window),
        &take_prefix(b, config.scan_window),
    );
    let suffix_score = count_matching_chars(
        &take_suffix(a, config.scan_window),
        &take_suffix(b, config.scan_window),
    );

    prefix_score + suffix_score >= config.overlap_threshold
}

/// Position-wise equality count over the shorter of the two strings.
/// A mismatch followed by a match still counts the match.
fn count_matching_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x == y).count()
}

/// First `n` characters, clamped to available length.
fn take_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Last `n` characters, clamped to available length.
fn take_suffix(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}
