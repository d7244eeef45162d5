//! Coinmatch core library: rule-based resolution of coin listing text to
//! catalog variants.
//!
//! Listing text flows through a fixed pipeline:
//!
//! 1. [`text`] normalizes typos, abbreviations and grade tokens, then
//!    extracts year, mint, coin type, grade and variant keywords.
//! 2. [`matching::candidates`] scores catalog variants, anchored on the
//!    `(year, mint)` coordinate when both are known and on keyword overlap
//!    otherwise.
//! 3. [`matching::hierarchy`] optionally walks the winner up to its base
//!    variant.
//!
//! The catalog is a read-only SQLite database ([`store`]) scanned once into
//! an immutable [`matching::index::CatalogIndex`] by [`Resolver`].

pub mod config;
pub mod errors;
pub mod grade;
pub mod matching;
pub mod models;
pub mod resolver;
pub mod store;
pub mod text;
pub mod vocabulary;

pub use config::MatcherConfig;
pub use errors::{CoinMatchError, CoinMatchResult};
pub use grade::{extract_grade, normalize_grade, validate_grade, GradeError};
pub use matching::hierarchy::{Resolution, VariantSource};
pub use matching::index::{CatalogIndex, CatalogReport};
pub use matching::priority::{PriorityEntry, PriorityTable};
pub use matching::statistics::{get_statistics, get_statistics_with, MatchOutcome, Statistics};
pub use models::{
    Candidate, Coordinate, DataQualityIssue, Features, Listing, MatchMethod, ParsedListing,
    Variant, VariantHierarchy,
};
pub use resolver::{Resolver, ResolverHandle};
pub use text::{extract, normalize, Lexicon};
pub use vocabulary::Vocabulary;
