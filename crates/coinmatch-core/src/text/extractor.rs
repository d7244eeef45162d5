//! Feature extraction from normalized listing text.

use std::collections::HashMap;
use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use tracing::debug;

use crate::errors::CoinMatchResult;
use crate::grade::{extract_grade_span, normalize_grade};
use crate::models::{Features, DEFAULT_MINT_MARK};
use crate::text::normalizer::word_alternation;
use crate::vocabulary::Vocabulary;

/// Years 1850-1899, 1900-1999 and 2000-2029.
const YEAR_PATTERN: &str = r"18[5-9]\d|19\d\d|20[0-2]\d";

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b({YEAR_PATTERN})\b")).unwrap());

/// Tokens longer than two characters, trimmed of surrounding punctuation and
/// de-duplicated in order of appearance.
pub fn keyword_tokens(text: &str) -> Vec<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    for raw in text.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if token.chars().count() > 2 {
            seen.insert(token.to_lowercase());
        }
    }
    seen.into_iter().collect()
}

struct CoinTypeAlias {
    pattern: Regex,
    alias: String,
    canonical: String,
}

#[derive(Clone, Debug)]
struct VariantKeyword {
    pattern: Regex,
    tag: String,
}

/// Pulls year, mint, coin type, grade and variant keywords out of normalized
/// text. Extraction never fails; missing signals stay `None`/empty.
pub struct FeatureExtractor {
    fused_year_mint_re: Regex,
    year_then_mint_re: Regex,
    mint_word_re: Regex,
    mint_city_re: Option<Regex>,
    mint_cities: HashMap<String, String>,
    coin_types: Vec<CoinTypeAlias>,
    variant_keywords: Vec<VariantKeyword>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("coin_types", &self.coin_types.len())
            .field("variant_keywords", &self.variant_keywords.len())
            .finish()
    }
}

impl FeatureExtractor {
    pub fn new(vocabulary: &Vocabulary) -> CoinMatchResult<Self> {
        let mut marks: Vec<String> = vocabulary
            .mint_marks
            .iter()
            .map(|m| regex::escape(&m.to_lowercase()))
            .collect();
        marks.sort_by_key(|m| std::cmp::Reverse(m.len()));
        let marks = marks.join("|");

        let fused_year_mint_re = Regex::new(&format!(r"\b({YEAR_PATTERN})({marks})\b"))?;
        let year_then_mint_re = Regex::new(&format!(r"\b({YEAR_PATTERN})\s+({marks})\b"))?;
        let mint_word_re = Regex::new(&format!(r"\b({marks})\s+mint\b"))?;

        let mint_cities: HashMap<String, String> = vocabulary
            .mint_cities
            .iter()
            .map(|(city, mark)| (city.to_lowercase(), mark.to_uppercase()))
            .collect();
        let mint_city_re = word_alternation(mint_cities.keys().cloned())
            .map(|pattern| Regex::new(&pattern))
            .transpose()?;

        let coin_types = vocabulary
            .coin_types
            .iter()
            .map(|(alias, canonical)| {
                let alias = alias.to_lowercase();
                Ok(CoinTypeAlias {
                    pattern: Regex::new(&format!(r"\b{}\b", regex::escape(&alias)))?,
                    alias,
                    canonical: canonical.to_lowercase(),
                })
            })
            .collect::<CoinMatchResult<Vec<_>>>()?;

        let variant_keywords = vocabulary
            .variant_keywords
            .iter()
            .map(|kw| {
                Ok(VariantKeyword {
                    pattern: Regex::new(&kw.pattern)?,
                    tag: kw.tag.clone(),
                })
            })
            .collect::<CoinMatchResult<Vec<_>>>()?;

        Ok(Self {
            fused_year_mint_re,
            year_then_mint_re,
            mint_word_re,
            mint_city_re,
            mint_cities,
            coin_types,
            variant_keywords,
        })
    }

    pub fn extract(&self, normalized: &str) -> Features {
        let mut features = Features::default();

        // 1. Grade first; its digits must not be read as anything else.
        let mut working = normalized.to_string();
        if let Some((raw, span)) = extract_grade_span(normalized) {
            match normalize_grade(&raw) {
                Ok(grade) => features.grade = Some(grade),
                Err(e) => debug!(grade = %raw, error = %e, "dropping unparseable grade"),
            }
            working.replace_range(span, " ");
        }

        // 2. Year, possibly fused with a mint letter.
        let mut year_token: Option<String> = None;
        if let Some(caps) = self.fused_year_mint_re.captures(&working) {
            features.year = caps[1].parse().ok();
            features.mint_mark = Some(caps[2].to_uppercase());
            year_token = Some(caps[0].to_string());
        } else if let Some(caps) = YEAR_RE.captures(&working) {
            features.year = caps[1].parse().ok();
            year_token = Some(caps[1].to_string());
        }

        // 3. Mint mark.
        if features.mint_mark.is_none() {
            features.mint_mark = self.find_mint(&working, features.year);
        }
        if features.mint_mark.is_none() && features.year.is_some() {
            features.mint_mark = Some(DEFAULT_MINT_MARK.to_string());
        }

        // 4. Coin type: most specific alias relative to the text.
        features.coin_type = self.find_coin_type(normalized);

        // 5. Variant keywords, ordered by the pattern table.
        features.variant_keywords = self.variant_tags(normalized);

        // 6. Free keywords.
        features.free_keywords = keyword_tokens(&working)
            .into_iter()
            .filter(|t| year_token.as_deref() != Some(t.as_str()))
            .collect();

        features
    }

    /// Canonical variant tags present in `normalized`, in pattern order.
    pub fn variant_tags(&self, normalized: &str) -> Vec<String> {
        let mut tags: IndexSet<String> = IndexSet::new();
        for kw in &self.variant_keywords {
            if kw.pattern.is_match(normalized) {
                tags.insert(kw.tag.clone());
            }
        }
        tags.into_iter().collect()
    }

    fn find_mint(&self, text: &str, year: Option<i32>) -> Option<String> {
        if let Some(year) = year {
            for caps in self.year_then_mint_re.captures_iter(text) {
                if caps[1].parse::<i32>().ok() == Some(year) {
                    return Some(caps[2].to_uppercase());
                }
            }
        }
        if let Some(caps) = self.mint_word_re.captures(text) {
            return Some(caps[1].to_uppercase());
        }
        let city_re = self.mint_city_re.as_ref()?;
        let city = city_re.find(text)?;
        self.mint_cities.get(city.as_str()).cloned()
    }

    fn find_coin_type(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let text_len = text.len() as f64;
        let mut best: Option<(f64, &CoinTypeAlias)> = None;
        for alias in &self.coin_types {
            if !alias.pattern.is_match(text) {
                continue;
            }
            let score = alias.alias.len() as f64 / text_len;
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, alias));
            }
        }
        best.map(|(_, alias)| alias.canonical.clone())
    }
}
