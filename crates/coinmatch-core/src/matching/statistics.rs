//! Aggregate reporting over match results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MatcherConfig;
use crate::models::{DataQualityIssue, Listing, MatchMethod, ParsedListing};

/// Anything that carries a match decision.
pub trait MatchOutcome {
    fn matched_variant(&self) -> Option<&str>;
    fn confidence(&self) -> f64;
    fn method(&self) -> Option<MatchMethod>;
    fn quality_issues(&self) -> &[DataQualityIssue];
}

impl MatchOutcome for Listing {
    fn matched_variant(&self) -> Option<&str> {
        self.final_match.as_deref()
    }

    fn confidence(&self) -> f64 {
        self.match_confidence
    }

    fn method(&self) -> Option<MatchMethod> {
        self.match_method
    }

    fn quality_issues(&self) -> &[DataQualityIssue] {
        &self.data_quality
    }
}

impl MatchOutcome for ParsedListing {
    fn matched_variant(&self) -> Option<&str> {
        self.variant_id.as_deref()
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn method(&self) -> Option<MatchMethod> {
        self.match_method
    }

    fn quality_issues(&self) -> &[DataQualityIssue] {
        &self.data_quality
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub match_rate: f64,
    pub high_confidence_count: usize,
    pub medium_confidence_count: usize,
    pub low_confidence_count: usize,
    /// Mean confidence over matched results.
    pub average_confidence: f64,
    pub by_method: BTreeMap<MatchMethod, usize>,
    /// Issue kind -> occurrences across all results.
    pub data_quality_flags: BTreeMap<String, usize>,
}

/// Statistics with the default confidence thresholds.
pub fn get_statistics<T: MatchOutcome>(results: &[T]) -> Statistics {
    get_statistics_with(results, &MatcherConfig::default())
}

pub fn get_statistics_with<T: MatchOutcome>(results: &[T], config: &MatcherConfig) -> Statistics {
    let mut stats = Statistics {
        total: results.len(),
        ..Statistics::default()
    };
    let mut confidence_sum = 0.0;

    for result in results {
        for issue in result.quality_issues() {
            *stats
                .data_quality_flags
                .entry(issue.kind().to_string())
                .or_insert(0) += 1;
        }
        if result.matched_variant().is_none() {
            stats.unmatched += 1;
            continue;
        }
        stats.matched += 1;
        let confidence = result.confidence();
        confidence_sum += confidence;
        if confidence >= config.high_confidence {
            stats.high_confidence_count += 1;
        } else if confidence >= config.medium_confidence {
            stats.medium_confidence_count += 1;
        } else {
            stats.low_confidence_count += 1;
        }
        if let Some(method) = result.method() {
            *stats.by_method.entry(method).or_insert(0) += 1;
        }
    }

    if stats.total > 0 {
        stats.match_rate = stats.matched as f64 / stats.total as f64;
    }
    if stats.matched > 0 {
        stats.average_confidence = confidence_sum / stats.matched as f64;
    }
    stats
}
