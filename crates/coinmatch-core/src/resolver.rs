//! Resolver facade: one immutable catalog index plus the compiled lexicon.
//!
//! A [`Resolver`] is built once from a full catalog scan and is then shared
//! read-only across threads. [`ResolverHandle`] adds atomic reloads on top:
//! requests already holding an `Arc<Resolver>` finish against the old index.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rayon::prelude::*;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::MatcherConfig;
use crate::errors::CoinMatchResult;
use crate::matching::auction::parse_listing_impl;
use crate::matching::hierarchy::{self, Resolution};
use crate::matching::index::{CatalogIndex, CatalogReport};
use crate::matching::marketplace::{infallible, match_listing_impl};
use crate::matching::priority::PriorityTable;
use crate::matching::statistics::{get_statistics_with, MatchOutcome, Statistics};
use crate::models::{Features, Listing, ParsedListing, Variant, VariantHierarchy};
use crate::store::catalog::{self, Catalog};
use crate::text::Lexicon;
use crate::vocabulary::Vocabulary;

#[derive(Debug)]
pub struct Resolver {
    index: CatalogIndex,
    lexicon: Lexicon,
    vocabulary: Vocabulary,
    config: MatcherConfig,
}

impl Resolver {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Open the catalog at `db_path` with vocabulary, priorities and knobs
    /// taken from the `COINMATCH_*` environment (built-in defaults otherwise).
    pub fn open(db_path: impl AsRef<Path>) -> CoinMatchResult<Self> {
        let vocabulary = Vocabulary::from_env_or_builtin()?;
        let priorities = PriorityTable::from_env_or_builtin()?;
        Self::from_catalog_path(db_path, &vocabulary, &priorities, MatcherConfig::from_env())
    }

    pub fn from_catalog_path(
        db_path: impl AsRef<Path>,
        vocabulary: &Vocabulary,
        priorities: &PriorityTable,
        config: MatcherConfig,
    ) -> CoinMatchResult<Self> {
        let catalog = Catalog::open(db_path)?;
        info!(path = %catalog.db_path().display(), "loading catalog");
        Self::from_variants(catalog.load_variants()?, vocabulary, priorities, config)
    }

    pub fn from_connection(
        conn: &Connection,
        vocabulary: &Vocabulary,
        priorities: &PriorityTable,
        config: MatcherConfig,
    ) -> CoinMatchResult<Self> {
        Self::from_variants(catalog::load_variants(conn)?, vocabulary, priorities, config)
    }

    pub fn from_variants(
        variants: Vec<Variant>,
        vocabulary: &Vocabulary,
        priorities: &PriorityTable,
        config: MatcherConfig,
    ) -> CoinMatchResult<Self> {
        let lexicon = Lexicon::compile(vocabulary)?;
        let index = CatalogIndex::build(variants, priorities, &lexicon)?;
        Ok(Self {
            index,
            lexicon,
            vocabulary: vocabulary.clone(),
            config,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn catalog_report(&self) -> &CatalogReport {
        self.index.report()
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    pub fn normalize(&self, text: &str) -> String {
        self.lexicon.normalize(text)
    }

    pub fn extract(&self, normalized: &str) -> Features {
        self.lexicon.extract(normalized)
    }

    // -----------------------------------------------------------------------
    // Matching
    // -----------------------------------------------------------------------

    pub fn parse_listing(&self, title: &str, description: Option<&str>) -> ParsedListing {
        parse_listing_impl(&self.index, &self.lexicon, &self.config, title, description)
    }

    pub fn match_listing(&self, raw_text: &str, require_base: bool) -> Listing {
        match_listing_impl(
            &self.index,
            &self.lexicon,
            &self.config,
            raw_text,
            require_base,
        )
    }

    /// Parse many `(title, description)` pairs in parallel; output order
    /// follows input order.
    pub fn batch_parse_listings<T, D>(&self, items: &[(T, Option<D>)]) -> Vec<ParsedListing>
    where
        T: AsRef<str> + Sync,
        D: AsRef<str> + Sync,
    {
        items
            .par_iter()
            .map(|(title, description)| {
                self.parse_listing(title.as_ref(), description.as_ref().map(|d| d.as_ref()))
            })
            .collect()
    }

    /// Match many listings in parallel; output order follows input order.
    pub fn batch_match_listings<S>(&self, texts: &[S], require_base: bool) -> Vec<Listing>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|text| self.match_listing(text.as_ref(), require_base))
            .collect()
    }

    /// Statistics using this resolver's confidence thresholds.
    pub fn get_statistics<T: MatchOutcome>(&self, results: &[T]) -> Statistics {
        get_statistics_with(results, &self.config)
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    pub fn resolve_to_base(&self, variant_id: &str) -> String {
        infallible(hierarchy::resolve_to_base(&self.index, variant_id))
    }

    pub fn resolve_to_base_traced(&self, variant_id: &str) -> Resolution {
        infallible(hierarchy::resolve_to_base_traced(&self.index, variant_id))
    }

    pub fn resolve_ambiguous_base(
        &self,
        base_type: &str,
        year: i32,
        mint_mark: &str,
    ) -> Option<String> {
        infallible(hierarchy::resolve_ambiguous_base(
            &self.index,
            base_type,
            year,
            mint_mark,
        ))
    }

    pub fn get_variant_hierarchy(&self, variant_id: &str) -> Option<VariantHierarchy> {
        infallible(hierarchy::get_variant_hierarchy(&self.index, variant_id))
    }
}

// ---------------------------------------------------------------------------
// ResolverHandle
// ---------------------------------------------------------------------------

/// Shared, swappable resolver.
#[derive(Debug)]
pub struct ResolverHandle {
    current: RwLock<Arc<Resolver>>,
}

impl ResolverHandle {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            current: RwLock::new(Arc::new(resolver)),
        }
    }

    /// The resolver to use for one request.
    pub fn current(&self) -> Arc<Resolver> {
        Arc::clone(&self.current.read())
    }

    /// Install `resolver`, returning the one it replaced.
    pub fn swap(&self, resolver: Resolver) -> Arc<Resolver> {
        std::mem::replace(&mut *self.current.write(), Arc::new(resolver))
    }

    /// Rescan the catalog at `db_path` with a new priority table, keeping
    /// the current vocabulary and config. On failure the current resolver
    /// stays in place.
    pub fn reload(
        &self,
        db_path: impl AsRef<Path>,
        priorities: &PriorityTable,
    ) -> CoinMatchResult<Arc<Resolver>> {
        let current = self.current();
        let db_path = db_path.as_ref();
        let fresh = Resolver::from_catalog_path(
            db_path,
            current.vocabulary(),
            priorities,
            *current.config(),
        )
        .inspect_err(|e| {
            warn!(path = %db_path.display(), error = %e, "catalog reload failed; keeping current resolver");
        })?;
        info!(
            path = %db_path.display(),
            fingerprint = %fresh.catalog_report().fingerprint,
            "catalog reloaded"
        );
        self.swap(fresh);
        Ok(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoinMatchError;
    use crate::matching::statistics::get_statistics;
    use crate::models::{MatchMethod, LEVEL_SPECIAL_VARIETY, LEVEL_STRIKE_TYPE};
    use crate::store::catalog::insert_variants;
    use crate::store::schema::init_schema;

    fn fixture_variants() -> Vec<Variant> {
        let buffalo = Variant::base("bn-1918-d", "Buffalo Nickel", 1918, "D");
        let overdate = Variant::child_of("bn-1918-d-87", &buffalo, LEVEL_SPECIAL_VARIETY)
            .with_type("Overdate", "8/7 Overdate");
        let small = Variant::base("tc-1864-sm", "Two Cent", 1864, "P")
            .with_type("Major Variety", "Small Motto");
        let large = Variant::base("tc-1864-lm", "Two Cent", 1864, "P")
            .with_type("Major Variety", "Large Motto");
        let proof = Variant::child_of("tc-1864-lm-pf", &large, LEVEL_STRIKE_TYPE)
            .with_type("Proof", "Large Motto Proof");
        let morgan = Variant::base("md-1921-p", "Morgan Dollar", 1921, "P");
        vec![buffalo, overdate, small, large, proof, morgan]
    }

    fn resolver() -> Resolver {
        Resolver::from_variants(
            fixture_variants(),
            &Vocabulary::builtin(),
            &PriorityTable::builtin(),
            MatcherConfig::default(),
        )
        .unwrap()
    }

    fn write_catalog(path: &Path, variants: &[Variant]) {
        let conn = Connection::open(path).unwrap();
        init_schema(&conn).unwrap();
        insert_variants(&conn, variants).unwrap();
    }

    #[test]
    fn overdate_listing_resolves_to_base() {
        let listing = resolver().match_listing("1918d buffallo nickle 8 over 7", true);
        assert!(listing.normalized_text.contains("buffalo"));
        assert!(listing.normalized_text.contains("nickel"));
        let f = &listing.extracted_features;
        assert_eq!(f.year, Some(1918));
        assert_eq!(f.mint_mark.as_deref(), Some("D"));
        assert_eq!(f.coin_type.as_deref(), Some("buffalo nickel"));
        assert_eq!(f.variant_keywords, vec!["8/7".to_string()]);
        assert_eq!(listing.final_match.as_deref(), Some("bn-1918-d"));
        assert_eq!(listing.match_method, Some(MatchMethod::BaseResolution));
    }

    #[test]
    fn two_cent_proof_listing_picks_child() {
        let listing = resolver().match_listing("1864 Two Cent Piece Large Motto Proof", false);
        let f = &listing.extracted_features;
        assert_eq!(f.mint_mark.as_deref(), Some("P"));
        assert_eq!(
            f.variant_keywords,
            vec!["proof".to_string(), "large motto".to_string()]
        );
        assert_eq!(listing.final_match.as_deref(), Some("tc-1864-lm-pf"));
        assert!(listing.match_confidence >= 0.5 + 0.2 + 0.2 - 1e-9);
    }

    #[test]
    fn yearless_listing_capped() {
        let listing = resolver().match_listing("nice buffalo nickel coin", false);
        assert_eq!(listing.extracted_features.year, None);
        assert!(listing.match_confidence <= 0.7);
    }

    #[test]
    fn plain_two_cent_uses_priority_table() {
        let r = resolver();
        assert_eq!(
            r.resolve_ambiguous_base("Two Cent", 1864, "P").as_deref(),
            Some("tc-1864-lm")
        );
        let listing = r.match_listing("1864 two cent piece", true);
        assert_eq!(listing.final_match.as_deref(), Some("tc-1864-lm"));
        assert!(r.catalog_report().is_clean());
    }

    #[test]
    fn hierarchy_utilities() {
        let r = resolver();
        assert_eq!(r.resolve_to_base("tc-1864-lm-pf"), "tc-1864-lm");
        assert_eq!(r.resolve_to_base("unknown"), "unknown");
        let tree = r.get_variant_hierarchy("tc-1864-lm").unwrap();
        assert_eq!(tree.children[0].variant_id, "tc-1864-lm-pf");
        assert!(r.get_variant_hierarchy("unknown").is_none());
    }

    #[test]
    fn base_resolution_closure_over_catalog() {
        let r = resolver();
        for v in r.index().variants() {
            let base = r.resolve_to_base(&v.variant_id);
            let resolved = r.index().get(&base).unwrap();
            assert!(resolved.is_base_variant, "{} -> {base}", v.variant_id);
            assert_eq!(r.resolve_to_base(&base), base);
        }
    }

    #[test]
    fn batch_preserves_order_and_feeds_statistics() {
        let r = resolver();
        let texts = vec![
            "1921 morgan dollar MS63",
            "nice buffalo nickel coin",
            "1918-D buffalo 8/7",
            "1864 2c lg motto proof",
        ];
        let listings = r.batch_match_listings(&texts, false);
        assert_eq!(listings.len(), texts.len());
        for (listing, text) in listings.iter().zip(&texts) {
            assert_eq!(&listing.raw_text, text);
        }
        assert_eq!(listings[0].final_match.as_deref(), Some("md-1921-p"));
        assert_eq!(listings[2].final_match.as_deref(), Some("bn-1918-d-87"));

        let stats = r.get_statistics(&listings);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.matched, 3);
        assert_eq!(stats, get_statistics(&listings));
    }

    #[test]
    fn batch_parse_listings_in_order() {
        let r = resolver();
        let items = vec![
            ("1921 Morgan Dollar PCGS MS64", None),
            ("1918-D Buffalo Nickel 8/7", Some("NGC VF30 cert 1234567")),
            ("Two Cent Piece", None),
        ];
        let parsed = r.batch_parse_listings(&items);
        assert_eq!(parsed[0].variant_id.as_deref(), Some("md-1921-p"));
        assert_eq!(parsed[1].variant_id.as_deref(), Some("bn-1918-d-87"));
        assert_eq!(parsed[1].cert_number.as_deref(), Some("1234567"));
        assert_eq!(parsed[2].variant_id, None);
    }

    #[test]
    fn from_catalog_path_and_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        write_catalog(&path, &fixture_variants());

        let r = Resolver::from_catalog_path(
            &path,
            &Vocabulary::builtin(),
            &PriorityTable::builtin(),
            MatcherConfig::default(),
        )
        .unwrap();
        assert_eq!(r.index().len(), 6);
        assert_eq!(r.catalog_report().fingerprint, resolver().catalog_report().fingerprint);

        let missing = Resolver::from_catalog_path(
            dir.path().join("missing.db"),
            &Vocabulary::builtin(),
            &PriorityTable::builtin(),
            MatcherConfig::default(),
        );
        assert!(matches!(missing, Err(CoinMatchError::Catalog(_))));
    }

    #[test]
    fn from_connection_reads_catalog_order() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        insert_variants(&conn, &fixture_variants()).unwrap();
        let r = Resolver::from_connection(
            &conn,
            &Vocabulary::builtin(),
            &PriorityTable::default(),
            MatcherConfig::default(),
        )
        .unwrap();
        assert_eq!(r.index().variants()[0].variant_id, "bn-1918-d");
        // Without priorities the two-cent bases tie.
        assert!(!r.catalog_report().is_clean());
    }

    #[test]
    fn handle_reload_swaps_and_survives_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        write_catalog(&path, &fixture_variants());

        let handle = ResolverHandle::new(resolver());
        let before = handle.current();

        let extra = Variant::base("md-1921-d", "Morgan Dollar", 1921, "D");
        {
            let conn = Connection::open(&path).unwrap();
            insert_variants(&conn, &[extra]).unwrap();
        }
        let after = handle.reload(&path, &PriorityTable::builtin()).unwrap();
        assert_eq!(after.index().len(), 7);
        assert_eq!(before.index().len(), 6);
        assert_eq!(handle.current().index().len(), 7);

        assert!(handle
            .reload(dir.path().join("gone.db"), &PriorityTable::builtin())
            .is_err());
        assert_eq!(handle.current().index().len(), 7);
    }

    #[test]
    fn duplicate_ids_abort_construction() {
        let mut variants = fixture_variants();
        variants.push(Variant::base("md-1921-p", "Morgan Dollar", 1921, "P"));
        let result = Resolver::from_variants(
            variants,
            &Vocabulary::builtin(),
            &PriorityTable::default(),
            MatcherConfig::default(),
        );
        assert!(matches!(result, Err(CoinMatchError::Catalog(_))));
    }

    #[test]
    fn blank_mint_in_memory_matches_philadelphia() {
        let r = Resolver::from_variants(
            vec![Variant::base("md-1921", "Morgan Dollar", 1921, " ")],
            &Vocabulary::builtin(),
            &PriorityTable::default(),
            MatcherConfig::default(),
        )
        .unwrap();
        assert_eq!(r.index().get("md-1921").unwrap().mint_mark, "P");

        let listing = r.match_listing("1921 morgan dollar", true);
        assert_eq!(listing.final_match.as_deref(), Some("md-1921"));
        assert_eq!(listing.match_method, Some(MatchMethod::ExactCoordinate));
        assert_eq!(
            r.resolve_ambiguous_base("Morgan Dollar", 1921, "").as_deref(),
            Some("md-1921")
        );
    }
}

