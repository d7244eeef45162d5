//! Shared typed models used across extraction, storage, and matching layers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Catalog constants
// ---------------------------------------------------------------------------

/// Priority assigned to catalog rows that carry no curated value.
pub const DEFAULT_PRIORITY_SCORE: i64 = 50;

/// Resolution levels, from least to most specific.
pub const LEVEL_BASE: u8 = 1;
pub const LEVEL_MAJOR_VARIETY: u8 = 2;
pub const LEVEL_SPECIAL_VARIETY: u8 = 3;
pub const LEVEL_STRIKE_TYPE: u8 = 4;

/// Mint mark used when a listing names a year but no mint.
pub const DEFAULT_MINT_MARK: &str = "P";

// ---------------------------------------------------------------------------
// 1. Variant
// ---------------------------------------------------------------------------

/// A catalog node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub variant_id: String,
    pub base_type: String,
    pub year: i32,
    pub mint_mark: String,
    pub variant_type: Option<String>,
    pub variant_description: Option<String>,
    pub is_base_variant: bool,
    pub parent_variant_id: Option<String>,
    pub resolution_level: u8,
    pub priority_score: i64,
}

impl Variant {
    /// A base variant with default priority and no classification text.
    pub fn base(variant_id: &str, base_type: &str, year: i32, mint_mark: &str) -> Self {
        Self {
            variant_id: variant_id.to_string(),
            base_type: base_type.to_string(),
            year,
            mint_mark: mint_mark.to_string(),
            variant_type: None,
            variant_description: None,
            is_base_variant: true,
            parent_variant_id: None,
            resolution_level: LEVEL_BASE,
            priority_score: DEFAULT_PRIORITY_SCORE,
        }
    }

    /// A child node that specializes `parent` at the given level.
    pub fn child_of(variant_id: &str, parent: &Variant, resolution_level: u8) -> Self {
        Self {
            variant_id: variant_id.to_string(),
            base_type: parent.base_type.clone(),
            year: parent.year,
            mint_mark: parent.mint_mark.clone(),
            variant_type: None,
            variant_description: None,
            is_base_variant: false,
            parent_variant_id: Some(parent.variant_id.clone()),
            resolution_level,
            priority_score: DEFAULT_PRIORITY_SCORE,
        }
    }

    pub fn with_type(mut self, variant_type: &str, description: &str) -> Self {
        self.variant_type = Some(variant_type.to_string());
        self.variant_description = Some(description.to_string());
        self
    }

    pub fn with_priority(mut self, priority_score: i64) -> Self {
        self.priority_score = priority_score;
        self
    }

    /// `variant_type` and `variant_description` joined for keyword matching.
    pub fn classification_text(&self) -> String {
        let mut text = String::new();
        if let Some(t) = &self.variant_type {
            text.push_str(t);
        }
        if let Some(d) = &self.variant_description {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(d);
        }
        text
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(&self.base_type, self.year, &self.mint_mark)
    }
}

// ---------------------------------------------------------------------------
// 2. Coordinate
// ---------------------------------------------------------------------------

/// The `(base_type, year, mint_mark)` triple that defines a base variant.
///
/// Base type is compared case-insensitively and mint marks upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub base_type: String,
    pub year: i32,
    pub mint_mark: String,
}

/// Upper-cased mint mark; blank means Philadelphia.
pub fn canonical_mint_mark(mint_mark: &str) -> String {
    let mint_mark = mint_mark.trim();
    if mint_mark.is_empty() {
        DEFAULT_MINT_MARK.to_string()
    } else {
        mint_mark.to_uppercase()
    }
}

impl Coordinate {
    pub fn new(base_type: &str, year: i32, mint_mark: &str) -> Self {
        Self {
            base_type: base_type.trim().to_lowercase(),
            year,
            mint_mark: canonical_mint_mark(mint_mark),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Features
// ---------------------------------------------------------------------------

/// Fixed-shape record produced by the feature extractor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub year: Option<i32>,
    pub mint_mark: Option<String>,
    pub coin_type: Option<String>,
    pub grade: Option<String>,
    pub variant_keywords: Vec<String>,
    pub free_keywords: Vec<String>,
}

impl Features {
    /// True when both year and mint are known, selecting the
    /// coordinate-anchored strategy.
    pub fn has_coordinates(&self) -> bool {
        self.year.is_some() && self.mint_mark.is_some()
    }
}

// ---------------------------------------------------------------------------
// 4. Candidate / MatchMethod
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub variant_id: String,
    pub score: f64,
}

/// Which resolution path produced a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ExactCoordinate,
    KeywordFallback,
    BaseResolution,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::ExactCoordinate => "exact_coordinate",
            MatchMethod::KeywordFallback => "keyword_fallback",
            MatchMethod::BaseResolution => "base_resolution",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// 5. Data-quality flags
// ---------------------------------------------------------------------------

/// A catalog inconsistency met while resolving or auditing.
///
/// These are reported alongside results; they never abort resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// `parent_variant_id` names a variant that does not exist.
    DanglingParent {
        variant_id: String,
        parent_variant_id: String,
    },
    /// The parent is not strictly less specific than the child.
    LevelNotDecreasing {
        variant_id: String,
        parent_variant_id: String,
    },
    /// Following parents from this variant revisits a node.
    Cycle { variant_id: String },
    /// A base variant that also carries a parent.
    ParentedBase { variant_id: String },
    /// Several bases share a coordinate with no priority spread.
    AmbiguousBase {
        coordinate: Coordinate,
        variant_ids: Vec<String>,
    },
    /// Neither a parent chain nor the coordinate yields a base.
    UnresolvedBase { variant_id: String },
}

impl DataQualityIssue {
    /// The serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DataQualityIssue::DanglingParent { .. } => "dangling_parent",
            DataQualityIssue::LevelNotDecreasing { .. } => "level_not_decreasing",
            DataQualityIssue::Cycle { .. } => "cycle",
            DataQualityIssue::ParentedBase { .. } => "parented_base",
            DataQualityIssue::AmbiguousBase { .. } => "ambiguous_base",
            DataQualityIssue::UnresolvedBase { .. } => "unresolved_base",
        }
    }
}

// ---------------------------------------------------------------------------
// 6. Listing (marketplace path)
// ---------------------------------------------------------------------------

/// Per-request unit of work for the fuzzy marketplace matcher.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub raw_text: String,
    pub normalized_text: String,
    pub extracted_features: Features,
    pub candidates: Vec<Candidate>,
    pub final_match: Option<String>,
    pub match_confidence: f64,
    pub match_method: Option<MatchMethod>,
    pub data_quality: Vec<DataQualityIssue>,
}

// ---------------------------------------------------------------------------
// 7. ParsedListing (auction path)
// ---------------------------------------------------------------------------

/// Result of a single-pass auction title parse.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedListing {
    pub title: String,
    pub description: Option<String>,
    pub normalized_text: String,
    pub features: Features,
    pub grading_service: Option<String>,
    pub cert_number: Option<String>,
    pub has_cac: bool,
    pub is_details_grade: bool,
    pub variant_id: Option<String>,
    pub confidence: f64,
    pub match_method: Option<MatchMethod>,
    pub data_quality: Vec<DataQualityIssue>,
}

// ---------------------------------------------------------------------------
// 8. VariantHierarchy
// ---------------------------------------------------------------------------

/// A variant with its immediate parent and children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantHierarchy {
    pub variant: Variant,
    pub parent: Option<Variant>,
    pub children: Vec<Variant>,
}
