//! Immutable in-memory index over the catalog.
//!
//! Built once per resolver from a full catalog scan; every lookup the
//! matchers need afterwards is a hash lookup. The index also audits the
//! catalog while it is built and keeps the findings in a [`CatalogReport`].

use std::collections::HashMap;
use std::convert::Infallible;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::errors::{CoinMatchError, CoinMatchResult};
use crate::matching::hierarchy::VariantSource;
use crate::matching::priority::PriorityTable;
use crate::models::{canonical_mint_mark, Coordinate, DataQualityIssue, Variant};
use crate::text::{keyword_tokens, Lexicon};

/// Integrity audit of a loaded catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub variant_count: usize,
    pub base_count: usize,
    /// Hex SHA-256 over the effective catalog rows, priorities applied.
    pub fingerprint: String,
    pub issues: Vec<DataQualityIssue>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Pre-computed classification text forms used for keyword matching.
#[derive(Clone, Debug, Default)]
struct SearchText {
    raw: String,
    normalized: String,
    tags: Vec<String>,
}

#[derive(Debug)]
pub struct CatalogIndex {
    variants: Vec<Variant>,
    by_id: HashMap<String, usize>,
    by_year_mint: HashMap<(i32, String), Vec<usize>>,
    bases_by_coordinate: HashMap<Coordinate, Vec<usize>>,
    children: HashMap<String, Vec<usize>>,
    keyword_index: HashMap<String, Vec<usize>>,
    search_texts: Vec<SearchText>,
    report: CatalogReport,
}

impl CatalogIndex {
    /// Index `variants` (catalog order) after applying `priorities`.
    ///
    /// Fails on duplicate variant ids; every other inconsistency is recorded
    /// in the report.
    pub fn build(
        mut variants: Vec<Variant>,
        priorities: &PriorityTable,
        lexicon: &Lexicon,
    ) -> CoinMatchResult<Self> {
        for v in &mut variants {
            v.mint_mark = canonical_mint_mark(&v.mint_mark);
        }
        let overridden = priorities.apply(&mut variants);

        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(variants.len());
        let mut by_year_mint: HashMap<(i32, String), Vec<usize>> = HashMap::new();
        let mut bases_by_coordinate: HashMap<Coordinate, Vec<usize>> = HashMap::new();
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        let mut keyword_index: HashMap<String, Vec<usize>> = HashMap::new();
        let mut search_texts: Vec<SearchText> = Vec::with_capacity(variants.len());

        for (pos, v) in variants.iter().enumerate() {
            if by_id.insert(v.variant_id.clone(), pos).is_some() {
                return Err(CoinMatchError::Catalog(format!(
                    "duplicate variant_id '{}'",
                    v.variant_id
                )));
            }
            by_year_mint
                .entry((v.year, v.mint_mark.clone()))
                .or_default()
                .push(pos);
            if v.is_base_variant {
                bases_by_coordinate.entry(v.coordinate()).or_default().push(pos);
            }
            if let Some(parent) = &v.parent_variant_id {
                children.entry(parent.clone()).or_default().push(pos);
            }

            let raw = v.classification_text().to_lowercase();
            let normalized = lexicon.normalize(&raw);
            for token in keyword_tokens(&normalized) {
                keyword_index.entry(token).or_default().push(pos);
            }
            let tags = lexicon.extractor.variant_tags(&normalized);
            search_texts.push(SearchText {
                raw,
                normalized,
                tags,
            });
        }

        // Stable sort keeps catalog order among equal priorities.
        for positions in bases_by_coordinate.values_mut() {
            positions.sort_by_key(|&pos| std::cmp::Reverse(variants[pos].priority_score));
        }

        let mut index = Self {
            variants,
            by_id,
            by_year_mint,
            bases_by_coordinate,
            children,
            keyword_index,
            search_texts,
            report: CatalogReport::default(),
        };
        index.report = index.audit();

        info!(
            variants = index.report.variant_count,
            bases = index.report.base_count,
            priority_overrides = overridden,
            issues = index.report.issues.len(),
            fingerprint = %index.report.fingerprint,
            "catalog indexed"
        );
        Ok(index)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    pub fn get(&self, variant_id: &str) -> Option<&Variant> {
        self.by_id.get(variant_id).map(|&pos| &self.variants[pos])
    }

    pub(crate) fn at(&self, pos: usize) -> &Variant {
        &self.variants[pos]
    }

    /// Catalog positions of every variant at `(year, mint)`, in catalog order.
    pub(crate) fn positions_at(&self, year: i32, mint_mark: &str) -> &[usize] {
        self.by_year_mint
            .get(&(year, canonical_mint_mark(mint_mark)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Catalog positions whose classification text contains `token`.
    pub(crate) fn keyword_postings(&self, token: &str) -> &[usize] {
        self.keyword_index
            .get(token)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether a canonical variant keyword describes the variant at `pos`:
    /// a substring of its raw or normalized classification text, or one of
    /// its own variant tags.
    pub(crate) fn has_keyword(&self, pos: usize, keyword: &str) -> bool {
        let text = &self.search_texts[pos];
        if text.raw.is_empty() {
            return false;
        }
        let keyword = keyword.to_lowercase();
        text.raw.contains(&keyword)
            || text.normalized.contains(&keyword.replace(['-', '/'], " "))
            || text.tags.iter().any(|t| *t == keyword)
    }

    pub fn bases_at(&self, coordinate: &Coordinate) -> impl Iterator<Item = &Variant> {
        self.bases_by_coordinate
            .get(coordinate)
            .into_iter()
            .flatten()
            .map(|&pos| &self.variants[pos])
    }

    pub fn children(&self, variant_id: &str) -> impl Iterator<Item = &Variant> {
        self.children
            .get(variant_id)
            .into_iter()
            .flatten()
            .map(|&pos| &self.variants[pos])
    }

    pub fn report(&self) -> &CatalogReport {
        &self.report
    }

    // -----------------------------------------------------------------------
    // Audit
    // -----------------------------------------------------------------------

    fn audit(&self) -> CatalogReport {
        let mut issues = Vec::new();

        for v in &self.variants {
            let Some(parent_id) = &v.parent_variant_id else {
                continue;
            };
            if v.is_base_variant {
                issues.push(DataQualityIssue::ParentedBase {
                    variant_id: v.variant_id.clone(),
                });
            }
            match self.get(parent_id) {
                None => issues.push(DataQualityIssue::DanglingParent {
                    variant_id: v.variant_id.clone(),
                    parent_variant_id: parent_id.clone(),
                }),
                Some(parent) if parent.resolution_level >= v.resolution_level => {
                    issues.push(DataQualityIssue::LevelNotDecreasing {
                        variant_id: v.variant_id.clone(),
                        parent_variant_id: parent_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        issues.extend(self.find_cycles());
        issues.extend(self.find_ambiguous_bases());

        for issue in &issues {
            warn!(issue = ?issue, "catalog integrity issue");
        }

        CatalogReport {
            variant_count: self.variants.len(),
            base_count: self.variants.iter().filter(|v| v.is_base_variant).count(),
            fingerprint: fingerprint(&self.variants),
            issues,
        }
    }

    /// One `Cycle` per parent cycle, named by its first node in catalog order.
    fn find_cycles(&self) -> Vec<DataQualityIssue> {
        const UNSEEN: u8 = 0;
        const ON_PATH: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNSEEN; self.variants.len()];
        let mut cycles = Vec::new();

        for start in 0..self.variants.len() {
            let mut path: Vec<usize> = Vec::new();
            let mut cursor = Some(start);
            while let Some(pos) = cursor {
                match state[pos] {
                    DONE => break,
                    ON_PATH => {
                        let from = path.iter().position(|&p| p == pos).unwrap_or(0);
                        if let Some(&first) = path[from..].iter().min() {
                            cycles.push(DataQualityIssue::Cycle {
                                variant_id: self.variants[first].variant_id.clone(),
                            });
                        }
                        break;
                    }
                    _ => {
                        state[pos] = ON_PATH;
                        path.push(pos);
                        cursor = self.variants[pos]
                            .parent_variant_id
                            .as_deref()
                            .and_then(|p| self.by_id.get(p).copied());
                    }
                }
            }
            for pos in path {
                state[pos] = DONE;
            }
        }
        cycles
    }

    /// Coordinates whose top-priority bases tie, in first-seen catalog order.
    fn find_ambiguous_bases(&self) -> Vec<DataQualityIssue> {
        let mut grouped: IndexMap<&Coordinate, Vec<String>> = IndexMap::new();
        let mut coordinates: Vec<(usize, &Coordinate)> = self
            .bases_by_coordinate
            .iter()
            .filter_map(|(c, positions)| positions.iter().min().map(|&p| (p, c)))
            .collect();
        coordinates.sort();

        for (_, coordinate) in coordinates {
            let positions = &self.bases_by_coordinate[coordinate];
            let top = self.variants[positions[0]].priority_score;
            let tied: Vec<String> = positions
                .iter()
                .map(|&p| &self.variants[p])
                .take_while(|v| v.priority_score == top)
                .map(|v| v.variant_id.clone())
                .collect();
            if tied.len() > 1 {
                grouped.insert(coordinate, tied);
            }
        }

        grouped
            .into_iter()
            .map(|(coordinate, variant_ids)| DataQualityIssue::AmbiguousBase {
                coordinate: coordinate.clone(),
                variant_ids,
            })
            .collect()
    }
}

fn fingerprint(variants: &[Variant]) -> String {
    let mut hasher = Sha256::new();
    for v in variants {
        // Serializing a plain struct of strings and integers cannot fail.
        if let Ok(bytes) = serde_json::to_vec(v) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

impl VariantSource for CatalogIndex {
    type Error = Infallible;

    fn variant(&self, variant_id: &str) -> Result<Option<Variant>, Infallible> {
        Ok(self.get(variant_id).cloned())
    }

    fn base_variants_at(&self, coordinate: &Coordinate) -> Result<Vec<Variant>, Infallible> {
        Ok(self.bases_at(coordinate).cloned().collect())
    }

    fn children_of(&self, variant_id: &str) -> Result<Vec<Variant>, Infallible> {
        Ok(self.children(variant_id).cloned().collect())
    }
}
