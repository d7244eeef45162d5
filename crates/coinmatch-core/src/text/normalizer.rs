//! Typo, abbreviation, and grade-token canonicalization.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::errors::CoinMatchResult;
use crate::grade::TEXT_GRADE_NAMES;
use crate::vocabulary::Vocabulary;

/// Grade abbreviations glued to (or separated from) a number. Runs before the
/// generic abbreviation table so `pr69` keeps its number.
static GRADE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut prefixes: Vec<String> = TEXT_GRADE_NAMES
        .iter()
        .map(|(abbr, _)| abbr.to_lowercase())
        .collect();
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
    Regex::new(&format!(r"\b({})[\s\-/]*(\d{{1,2}})\b", prefixes.join("|"))).unwrap()
});

fn grade_name(prefix: &str) -> &'static str {
    TEXT_GRADE_NAMES
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(prefix))
        .map(|(_, name)| *name)
        .unwrap_or("")
}

/// Build a whole-word alternation over `words`, longest first.
pub(crate) fn word_alternation(words: impl IntoIterator<Item = String>) -> Option<String> {
    let mut words: Vec<String> = words.into_iter().filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Some(format!(r"\b(?:{})\b", escaped.join("|")))
}

/// Deterministic, idempotent text normalizer compiled from a [`Vocabulary`].
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    typos: Vec<(String, String)>,
    abbreviations: HashMap<String, String>,
    abbreviation_re: Option<Regex>,
}

impl TextNormalizer {
    pub fn new(vocabulary: &Vocabulary) -> CoinMatchResult<Self> {
        let mut typos: Vec<(String, String)> = vocabulary
            .typos
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
            .collect();
        // Longer misspellings first so a short key never pre-empts a longer one.
        typos.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));

        let abbreviations: HashMap<String, String> = vocabulary
            .abbreviations
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
            .collect();
        let abbreviation_re = word_alternation(abbreviations.keys().cloned())
            .map(|pattern| Regex::new(&pattern))
            .transpose()?;

        Ok(Self {
            typos,
            abbreviations,
            abbreviation_re,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut out = text.to_lowercase();

        for (wrong, right) in &self.typos {
            if out.contains(wrong.as_str()) {
                out = out.replace(wrong.as_str(), right);
            }
        }

        out = GRADE_TOKEN_RE
            .replace_all(&out, |caps: &Captures<'_>| {
                format!("{} {}", grade_name(&caps[1]), &caps[2])
            })
            .into_owned();

        if let Some(re) = &self.abbreviation_re {
            out = re
                .replace_all(&out, |caps: &Captures<'_>| {
                    let word = &caps[0];
                    self.abbreviations
                        .get(word)
                        .cloned()
                        .unwrap_or_else(|| word.to_string())
                })
                .into_owned();
        }

        out.replace(['-', '/'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
