//! Candidate generation and scoring.
//!
//! Two strategies, chosen by what the listing states:
//!
//! 1. **Coordinate-anchored** when year and mint are both known. Every
//!    variant at `(year, mint)` is scored from a 0.5 floor upward.
//! 2. **Keyword overlap** otherwise, over the inverted index of variant
//!    classification text. Scores are capped by the keyword ceiling (0.7 by
//!    default), which sits below any plain-base coordinate score.
//!
//! The strategy is picked from the features, never by comparing scores. A
//! coordinate listing whose variant keywords hit no row at its coordinate
//! scores only `0.5 + priority`, which can fall under the keyword ceiling;
//! it still resolves through the coordinate.

use std::collections::HashMap;

use crate::config::MatcherConfig;
use crate::matching::guards::{
    clamp_score, COORDINATE_BASE_WEIGHT, PLAIN_BASE_BONUS, PRIORITY_SCALE, PRIORITY_WEIGHT,
    VARIANT_KEYWORD_BONUS,
};
use crate::matching::index::CatalogIndex;
use crate::models::{Candidate, Features, MatchMethod};

/// Ranked candidates and the strategy that produced them.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateSet {
    pub strategy: MatchMethod,
    pub candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn top(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn score_of(&self, variant_id: &str) -> Option<f64> {
        self.candidates
            .iter()
            .find(|c| c.variant_id == variant_id)
            .map(|c| c.score)
    }
}

pub fn generate(index: &CatalogIndex, features: &Features, config: &MatcherConfig) -> CandidateSet {
    let (strategy, scored) = match (features.year, features.mint_mark.as_deref()) {
        (Some(year), Some(mint)) => (
            MatchMethod::ExactCoordinate,
            score_coordinate(index, features, year, mint),
        ),
        _ => (
            MatchMethod::KeywordFallback,
            score_keywords(index, &features.free_keywords, config.keyword_ceiling),
        ),
    };
    CandidateSet {
        strategy,
        candidates: rank(index, scored, config.top_n),
    }
}

fn base_type_matches(base_type: &str, coin_type: &str) -> bool {
    let base_type = base_type.trim().to_lowercase();
    base_type == coin_type || base_type.contains(coin_type) || coin_type.contains(&base_type)
}

pub(crate) fn score_coordinate(
    index: &CatalogIndex,
    features: &Features,
    year: i32,
    mint_mark: &str,
) -> Vec<(usize, f64)> {
    let mut rows: Vec<usize> = index.positions_at(year, mint_mark).to_vec();

    if let Some(coin_type) = &features.coin_type {
        let coin_type = coin_type.trim().to_lowercase();
        let typed: Vec<usize> = rows
            .iter()
            .copied()
            .filter(|&pos| base_type_matches(&index.at(pos).base_type, &coin_type))
            .collect();
        if !typed.is_empty() {
            rows = typed;
        }
    }

    let keywords = &features.variant_keywords;
    rows.into_iter()
        .map(|pos| {
            let variant = index.at(pos);
            let mut score = COORDINATE_BASE_WEIGHT;
            let matched = keywords
                .iter()
                .filter(|kw| index.has_keyword(pos, kw))
                .count();
            score += VARIANT_KEYWORD_BONUS * matched as f64;
            if keywords.is_empty() && variant.is_base_variant {
                score += PLAIN_BASE_BONUS;
            }
            score += PRIORITY_WEIGHT * (variant.priority_score as f64 / PRIORITY_SCALE);
            (pos, clamp_score(score))
        })
        .collect()
}

pub(crate) fn score_keywords(
    index: &CatalogIndex,
    free_keywords: &[String],
    ceiling: f64,
) -> Vec<(usize, f64)> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for keyword in free_keywords {
        for &pos in index.keyword_postings(keyword) {
            *counts.entry(pos).or_insert(0) += 1;
        }
    }
    let Some(&max_count) = counts.values().max() else {
        return Vec::new();
    };
    counts
        .into_iter()
        .map(|(pos, count)| (pos, clamp_score(count as f64 / max_count as f64 * ceiling)))
        .collect()
}

/// Descending score, ties by catalog position, capped at `top_n`.
fn rank(index: &CatalogIndex, mut scored: Vec<(usize, f64)>, top_n: usize) -> Vec<Candidate> {
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(top_n);
    scored
        .into_iter()
        .map(|(pos, score)| Candidate {
            variant_id: index.at(pos).variant_id.clone(),
            score,
        })
        .collect()
}
