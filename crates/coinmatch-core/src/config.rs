//! Runtime knobs for candidate generation and reporting.

use crate::matching::guards::{
    clamp_score, clamp_top_n, DEFAULT_HIGH_CONFIDENCE, DEFAULT_MEDIUM_CONFIDENCE, DEFAULT_TOP_N,
    KEYWORD_SCORE_CEILING,
};

pub const TOP_N_ENV: &str = "COINMATCH_TOP_N";
pub const KEYWORD_CEILING_ENV: &str = "COINMATCH_KEYWORD_CEILING";
pub const HIGH_CONFIDENCE_ENV: &str = "COINMATCH_HIGH_CONFIDENCE";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatcherConfig {
    /// Candidates kept per listing.
    pub top_n: usize,
    /// Maximum score reachable by keyword overlap alone.
    pub keyword_ceiling: f64,
    /// Confidence at or above which a match counts as high confidence.
    pub high_confidence: f64,
    /// Confidence at or above which a match counts as medium confidence.
    pub medium_confidence: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            keyword_ceiling: KEYWORD_SCORE_CEILING,
            high_confidence: DEFAULT_HIGH_CONFIDENCE,
            medium_confidence: DEFAULT_MEDIUM_CONFIDENCE,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

impl MatcherConfig {
    /// Defaults overridden by `COINMATCH_*` environment variables. Unparseable
    /// values are ignored; parsed values are clamped to their legal range.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            top_n: env_parse::<i64>(TOP_N_ENV)
                .map(clamp_top_n)
                .unwrap_or(defaults.top_n),
            keyword_ceiling: env_parse::<f64>(KEYWORD_CEILING_ENV)
                .map(clamp_score)
                .unwrap_or(defaults.keyword_ceiling),
            high_confidence: env_parse::<f64>(HIGH_CONFIDENCE_ENV)
                .map(clamp_score)
                .unwrap_or(defaults.high_confidence),
            medium_confidence: defaults.medium_confidence,
        }
    }
}
