//! Versionable vocabulary tables driving normalization and extraction.
//!
//! Typos, abbreviations, mint names, coin-type aliases and variant keyword
//! patterns are plain data. The matching algorithm never special-cases a
//! string; growing the vocabulary means editing these tables (or a JSON file
//! with the same shape), not the resolver.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::{CoinMatchError, CoinMatchResult};
use crate::grade::TEXT_GRADE_NAMES;

/// Environment variable naming a JSON vocabulary file.
pub const VOCABULARY_ENV: &str = "COINMATCH_VOCABULARY";

/// A regex pattern over normalized text and the tag it canonicalizes to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPattern {
    pub pattern: String,
    pub tag: String,
}

impl KeywordPattern {
    fn new(pattern: &str, tag: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            tag: tag.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Misspelling -> correction, applied as substring substitution.
    pub typos: IndexMap<String, String>,
    /// Whole-word abbreviation -> expansion.
    pub abbreviations: IndexMap<String, String>,
    /// Mint letters recognised after a year or before "mint".
    pub mint_marks: Vec<String>,
    /// Mint city name -> mint letter.
    pub mint_cities: IndexMap<String, String>,
    /// Coin-type alias -> canonical coin type.
    pub coin_types: IndexMap<String, String>,
    /// Ordered variant keyword patterns; output order follows this list.
    pub variant_keywords: Vec<KeywordPattern>,
    /// Third-party grading services recognised in auction titles.
    pub grading_services: Vec<String>,
}

fn pairs(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Vocabulary {
    /// The vocabulary shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            typos: pairs(&[
                ("buffallo", "buffalo"),
                ("bufalo", "buffalo"),
                ("buffelo", "buffalo"),
                ("nickle", "nickel"),
                ("nikle", "nickel"),
                ("nickal", "nickel"),
                ("morgen", "morgan"),
                ("libery", "liberty"),
                ("liberity", "liberty"),
                ("lincon", "lincoln"),
                ("indain", "indian"),
                ("washinton", "washington"),
                ("jeffersen", "jefferson"),
                ("kennedey", "kennedy"),
                ("peice", "piece"),
                ("quater", "quarter"),
                ("dollor", "dollar"),
                ("doller", "dollar"),
                ("dimme", "dime"),
                ("mottto", "motto"),
                ("doubeled", "doubled"),
                ("dubbled", "doubled"),
            ]),
            abbreviations: pairs(&[
                ("unc", "uncirculated"),
                ("bu", "brilliant uncirculated"),
                ("pf", "proof"),
                ("pr", "proof"),
                ("prf", "proof"),
                ("cam", "cameo"),
                ("dcam", "deep cameo"),
                ("ddo", "doubled die obverse"),
                ("dbl", "doubled"),
                ("lg", "large"),
                ("sm", "small"),
                ("sml", "small"),
                ("var", "variety"),
                ("obv", "obverse"),
                ("rev", "reverse"),
                ("ctr", "center"),
                ("od", "overdate"),
                ("1c", "one cent"),
                ("2c", "two cent"),
                ("3c", "three cent"),
                ("5c", "five cent"),
                ("10c", "ten cent"),
                ("25c", "twenty five cent"),
                ("50c", "fifty cent"),
                ("hd", "half dollar"),
                ("cents", "cent"),
            ]),
            mint_marks: ["cc", "d", "s", "o", "p", "w"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            mint_cities: pairs(&[
                ("denver", "D"),
                ("san francisco", "S"),
                ("philadelphia", "P"),
                ("carson city", "CC"),
                ("new orleans", "O"),
                ("west point", "W"),
            ]),
            coin_types: pairs(&[
                ("buffalo nickel", "buffalo nickel"),
                ("indian head nickel", "buffalo nickel"),
                ("buffalo", "buffalo nickel"),
                ("jefferson nickel", "jefferson nickel"),
                ("liberty nickel", "liberty nickel"),
                ("shield nickel", "shield nickel"),
                ("two cent piece", "two cent"),
                ("two cent", "two cent"),
                ("three cent nickel", "three cent nickel"),
                ("indian head cent", "indian cent"),
                ("indian cent", "indian cent"),
                ("lincoln wheat cent", "lincoln cent"),
                ("lincoln cent", "lincoln cent"),
                ("wheat cent", "lincoln cent"),
                ("flying eagle cent", "flying eagle cent"),
                ("mercury dime", "mercury dime"),
                ("winged liberty dime", "mercury dime"),
                ("roosevelt dime", "roosevelt dime"),
                ("barber dime", "barber dime"),
                ("standing liberty quarter", "standing liberty quarter"),
                ("washington quarter", "washington quarter"),
                ("barber quarter", "barber quarter"),
                ("walking liberty half dollar", "walking liberty half dollar"),
                ("walking liberty half", "walking liberty half dollar"),
                ("franklin half dollar", "franklin half dollar"),
                ("kennedy half dollar", "kennedy half dollar"),
                ("morgan dollar", "morgan dollar"),
                ("morgan", "morgan dollar"),
                ("peace dollar", "peace dollar"),
                ("seated liberty dollar", "seated liberty dollar"),
                ("american silver eagle", "silver eagle"),
                ("silver eagle", "silver eagle"),
            ]),
            variant_keywords: vec![
                KeywordPattern::new(r"\b8 (?:over )?7\b", "8/7"),
                KeywordPattern::new(r"\b(?:42 over 41|2 over 1)\b", "2/1"),
                KeywordPattern::new(r"\bproof\b", "proof"),
                KeywordPattern::new(r"\blarge motto\b", "large motto"),
                KeywordPattern::new(r"\bsmall motto\b", "small motto"),
                KeywordPattern::new(r"\b(?:three|3) leg(?:ged)?\b", "three leg"),
                KeywordPattern::new(r"\b(?:doubled die|ddo)\b", "ddo"),
                KeywordPattern::new(r"\btype (?:1|i|one)\b", "type 1"),
                KeywordPattern::new(r"\btype (?:2|ii|two)\b", "type 2"),
                KeywordPattern::new(r"\bvdb\b", "vdb"),
                KeywordPattern::new(r"\bfull bands?\b", "full bands"),
                KeywordPattern::new(r"\bdeep mirror proof ?like\b|\bdmpl\b", "dmpl"),
            ],
            grading_services: ["pcgs", "ngc", "anacs", "icg", "cacg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> CoinMatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> CoinMatchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Load the file named by `COINMATCH_VOCABULARY`, or fall back to the
    /// built-in tables when the variable is unset.
    pub fn from_env_or_builtin() -> CoinMatchResult<Self> {
        match std::env::var_os(VOCABULARY_ENV) {
            Some(path) => Self::from_json_file(Path::new(&path)),
            None => Ok(Self::builtin()),
        }
    }

    /// Reject tables that would make normalization non-idempotent: no
    /// replacement text may reintroduce a typo key or an abbreviation, and
    /// typo keys may not span separators that normalization rewrites.
    pub fn validate(&self) -> CoinMatchResult<()> {
        for key in self.typos.keys() {
            if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '-' || c == '/') {
                return Err(CoinMatchError::Config(format!(
                    "typo key '{key}' must be a non-empty run without separators"
                )));
            }
        }
        let outputs = self
            .typos
            .values()
            .chain(self.abbreviations.values())
            .map(|v| v.to_lowercase())
            .chain(TEXT_GRADE_NAMES.iter().map(|(_, name)| name.to_string()));
        for output in outputs {
            for key in self.typos.keys() {
                if output.contains(&key.to_lowercase()) {
                    return Err(CoinMatchError::Config(format!(
                        "replacement '{output}' contains typo key '{key}'"
                    )));
                }
            }
        }
        for (key, value) in &self.abbreviations {
            let key = key.to_lowercase();
            if value
                .to_lowercase()
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| {
                    self.abbreviations.contains_key(word)
                        || TEXT_GRADE_NAMES
                            .iter()
                            .any(|(abbr, _)| abbr.eq_ignore_ascii_case(word))
                })
            {
                return Err(CoinMatchError::Config(format!(
                    "abbreviation '{key}' expands to text containing another abbreviation"
                )));
            }
        }
        for (city, mark) in &self.mint_cities {
            if !self
                .mint_marks
                .iter()
                .any(|m| m.eq_ignore_ascii_case(mark))
            {
                return Err(CoinMatchError::Config(format!(
                    "mint city '{city}' maps to unknown mint mark '{mark}'"
                )));
            }
        }
        Ok(())
    }
}
