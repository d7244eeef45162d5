//! Fuzzy matcher for free-form marketplace listings.

use std::convert::Infallible;

use tracing::debug;

use crate::config::MatcherConfig;
use crate::matching::candidates::generate;
use crate::matching::guards::truncate_listing;
use crate::matching::hierarchy::resolve_to_base_traced;
use crate::matching::index::CatalogIndex;
use crate::models::{Listing, MatchMethod};
use crate::text::Lexicon;

pub(crate) fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Normalize, extract, score, and optionally resolve the winner to its base.
///
/// With `require_base`, the top candidate is walked up to its base variant.
/// The method becomes `BaseResolution` only when that changed the id; the
/// confidence is then the base's own candidate score when it was ranked, or
/// the top candidate's score otherwise.
pub fn match_listing_impl(
    index: &CatalogIndex,
    lexicon: &Lexicon,
    config: &MatcherConfig,
    raw_text: &str,
    require_base: bool,
) -> Listing {
    let text = truncate_listing(raw_text);
    let normalized_text = lexicon.normalize(text);
    let extracted_features = lexicon.extract(&normalized_text);
    let set = generate(index, &extracted_features, config);

    let mut listing = Listing {
        raw_text: raw_text.to_string(),
        normalized_text,
        extracted_features,
        ..Listing::default()
    };

    if let Some(top) = set.top() {
        let mut final_match = top.variant_id.clone();
        let mut confidence = top.score;
        let mut method = set.strategy;

        if require_base {
            let resolution = infallible(resolve_to_base_traced(index, &top.variant_id));
            if resolution.variant_id != top.variant_id {
                confidence = set.score_of(&resolution.variant_id).unwrap_or(top.score);
                method = MatchMethod::BaseResolution;
                final_match = resolution.variant_id;
            }
            listing.data_quality = resolution.issues;
        }

        debug!(
            top = %top.variant_id,
            final_match = %final_match,
            method = %method,
            confidence,
            candidates = set.candidates.len(),
            "listing matched"
        );
        listing.final_match = Some(final_match);
        listing.match_confidence = confidence;
        listing.match_method = Some(method);
    } else {
        debug!(strategy = %set.strategy, "listing unmatched");
    }

    listing.candidates = set.candidates;
    listing
}
