//! Single-pass parser for structured auction-house titles.
//!
//! Auction titles reliably state year and mint, so this path only scores
//! the coordinate. A title without both yields no match.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::MatcherConfig;
use crate::matching::candidates::generate;
use crate::matching::guards::truncate_listing;
use crate::matching::index::CatalogIndex;
use crate::models::{MatchMethod, ParsedListing};
use crate::text::Lexicon;

static CERT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:certification|cert|#)\s*(?:no\.?|number)?\s*[#:]?\s*(\d{6,10})\b").unwrap()
});

static CAC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bcac\b").unwrap());

static DETAILS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:details|cleaned|damaged|holed|scratched|environmental|bent|tooled)\b")
        .unwrap()
});

pub fn parse_listing_impl(
    index: &CatalogIndex,
    lexicon: &Lexicon,
    config: &MatcherConfig,
    title: &str,
    description: Option<&str>,
) -> ParsedListing {
    let combined = match description {
        Some(d) if !d.trim().is_empty() => format!("{title} {d}"),
        _ => title.to_string(),
    };
    let text = truncate_listing(&combined);
    let lowered = text.to_lowercase();

    let normalized_text = lexicon.normalize(text);
    let features = lexicon.extract(&normalized_text);

    let mut parsed = ParsedListing {
        title: title.to_string(),
        description: description.map(str::to_string),
        grading_service: lexicon.grading_service(text),
        cert_number: CERT_RE.captures(&lowered).map(|c| c[1].to_string()),
        has_cac: CAC_RE.is_match(&lowered),
        is_details_grade: DETAILS_RE.is_match(&lowered),
        ..ParsedListing::default()
    };

    if features.has_coordinates() {
        let set = generate(index, &features, config);
        if let Some(top) = set.top() {
            parsed.variant_id = Some(top.variant_id.clone());
            parsed.confidence = top.score;
            parsed.match_method = Some(MatchMethod::ExactCoordinate);
        }
    }
    debug!(
        title = %parsed.title,
        variant_id = ?parsed.variant_id,
        confidence = parsed.confidence,
        "auction title parsed"
    );

    parsed.normalized_text = normalized_text;
    parsed.features = features;
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::priority::PriorityTable;
    use crate::models::{Variant, LEVEL_STRIKE_TYPE};

    fn index() -> CatalogIndex {
        let morgan = Variant::base("md-1893-cc", "Morgan Dollar", 1893, "CC");
        let large = Variant::base("tc-1864-lm", "Two Cent", 1864, "P")
            .with_type("Major Variety", "Large Motto")
            .with_priority(60);
        let proof = Variant::child_of("tc-1864-lm-pf", &large, LEVEL_STRIKE_TYPE)
            .with_type("Proof", "Large Motto Proof");
        CatalogIndex::build(
            vec![morgan, large, proof],
            &PriorityTable::default(),
            Lexicon::builtin(),
        )
        .unwrap()
    }

    fn parse(title: &str, description: Option<&str>) -> ParsedListing {
        parse_listing_impl(
            &index(),
            Lexicon::builtin(),
            &MatcherConfig::default(),
            title,
            description,
        )
    }

    #[test]
    fn parses_slabbed_title() {
        let parsed = parse("1893-CC Morgan Dollar PCGS MS63 CAC", Some("Cert #12345678"));
        assert_eq!(parsed.features.year, Some(1893));
        assert_eq!(parsed.features.mint_mark.as_deref(), Some("CC"));
        assert_eq!(parsed.features.grade.as_deref(), Some("MS-63"));
        assert_eq!(parsed.grading_service.as_deref(), Some("PCGS"));
        assert_eq!(parsed.cert_number.as_deref(), Some("12345678"));
        assert!(parsed.has_cac);
        assert!(!parsed.is_details_grade);
        assert_eq!(parsed.variant_id.as_deref(), Some("md-1893-cc"));
        assert_eq!(parsed.match_method, Some(MatchMethod::ExactCoordinate));
        assert!(parsed.confidence > 0.8);
    }

    #[test]
    fn proof_title_matches_child() {
        let parsed = parse("1864 2C Large Motto PR64 RB NGC", None);
        assert_eq!(parsed.variant_id.as_deref(), Some("tc-1864-lm-pf"));
        assert_eq!(parsed.grading_service.as_deref(), Some("NGC"));
        assert_eq!(parsed.cert_number, None);
    }

    #[test]
    fn details_grade_flagged() {
        let parsed = parse("1893-CC Morgan Dollar NGC XF Details Cleaned", None);
        assert!(parsed.is_details_grade);
        assert!(!parsed.has_cac);
    }

    #[test]
    fn missing_year_is_no_match() {
        let parsed = parse("Morgan Dollar PCGS MS65", None);
        assert_eq!(parsed.variant_id, None);
        assert_eq!(parsed.confidence, 0.0);
        assert_eq!(parsed.match_method, None);
        assert_eq!(parsed.title, "Morgan Dollar PCGS MS65");
    }
}
