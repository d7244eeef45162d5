//! Curated priority overrides for coordinates with several base variants.
//!
//! Some issues exist as more than one base at the same `(base_type, year,
//! mint)` coordinate, for example the 1864 two-cent piece in Small Motto and
//! Large Motto. The catalog's `priority_score` breaks those ties; this table
//! lets the preference be maintained outside the catalog and reloaded
//! without re-importing it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CoinMatchError, CoinMatchResult};
use crate::models::Variant;

/// Environment variable naming a JSON priority table.
pub const PRIORITIES_ENV: &str = "COINMATCH_PRIORITIES";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub base_type: String,
    pub year: i32,
    /// Any mint when absent.
    #[serde(default)]
    pub mint_mark: Option<String>,
    /// Case-insensitive substring of the variant's type or description.
    /// Empty matches every base at the coordinate.
    #[serde(default, rename = "match")]
    pub matches: String,
    pub priority: i64,
}

impl PriorityEntry {
    pub fn applies_to(&self, variant: &Variant) -> bool {
        if !variant.is_base_variant || variant.year != self.year {
            return false;
        }
        if !variant
            .base_type
            .trim()
            .eq_ignore_ascii_case(self.base_type.trim())
        {
            return false;
        }
        if let Some(mint) = &self.mint_mark {
            if !variant.mint_mark.trim().eq_ignore_ascii_case(mint.trim()) {
                return false;
            }
        }
        let needle = self.matches.trim().to_lowercase();
        needle.is_empty() || variant.classification_text().to_lowercase().contains(&needle)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorityTable {
    entries: Vec<PriorityEntry>,
}

impl PriorityTable {
    pub fn new(entries: Vec<PriorityEntry>) -> Self {
        Self { entries }
    }

    /// Known multi-base coordinates shipped with the crate.
    pub fn builtin() -> Self {
        let entry = |base_type: &str, year: i32, mint: Option<&str>, matches: &str, priority| {
            PriorityEntry {
                base_type: base_type.to_string(),
                year,
                mint_mark: mint.map(str::to_string),
                matches: matches.to_string(),
                priority,
            }
        };
        Self::new(vec![
            entry("Two Cent", 1864, Some("P"), "large motto", 60),
            entry("Two Cent", 1864, Some("P"), "small motto", 40),
            entry("Lincoln Cent", 1909, None, "vdb", 45),
            entry("Buffalo Nickel", 1913, None, "type 1", 60),
            entry("Buffalo Nickel", 1913, None, "type 2", 40),
        ])
    }

    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> CoinMatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> CoinMatchResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Load the file named by `COINMATCH_PRIORITIES`, or the built-in table
    /// when the variable is unset.
    pub fn from_env_or_builtin() -> CoinMatchResult<Self> {
        match std::env::var(PRIORITIES_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(Path::new(path.trim()))
                .map_err(|e| {
                    CoinMatchError::Config(format!("{PRIORITIES_ENV}={}: {e}", path.trim()))
                }),
            _ => Ok(Self::builtin()),
        }
    }

    /// The override for `variant`, if any. Later entries win.
    pub fn priority_for(&self, variant: &Variant) -> Option<i64> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.applies_to(variant))
            .map(|e| e.priority)
    }

    /// Overwrite `priority_score` in place. Returns the number of variants
    /// that received an override.
    pub fn apply(&self, variants: &mut [Variant]) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let mut applied = 0;
        for variant in variants.iter_mut() {
            if let Some(priority) = self.priority_for(variant) {
                if priority != variant.priority_score {
                    debug!(
                        variant_id = %variant.variant_id,
                        from = variant.priority_score,
                        to = priority,
                        "priority override"
                    );
                }
                variant.priority_score = priority;
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn two_cent_bases() -> Vec<Variant> {
        vec![
            Variant::base("tc-1864-sm", "Two Cent", 1864, "P")
                .with_type("Major Variety", "Small Motto"),
            Variant::base("tc-1864-lm", "Two Cent", 1864, "P")
                .with_type("Major Variety", "Large Motto"),
        ]
    }

    #[test]
    fn builtin_breaks_two_cent_tie() {
        let mut variants = two_cent_bases();
        let applied = PriorityTable::builtin().apply(&mut variants);
        assert_eq!(applied, 2);
        assert_eq!(variants[0].priority_score, 40);
        assert_eq!(variants[1].priority_score, 60);
    }

    #[test]
    fn children_and_other_coordinates_untouched() {
        let base = Variant::base("tc-1864-lm", "Two Cent", 1864, "P")
            .with_type("Major Variety", "Large Motto");
        let proof = Variant::child_of("tc-1864-lm-pf", &base, 4).with_type("Proof", "Large Motto");
        let other = Variant::base("tc-1865", "Two Cent", 1865, "P");
        let mut variants = vec![proof, other];
        assert_eq!(PriorityTable::builtin().apply(&mut variants), 0);
        assert_eq!(variants[0].priority_score, 50);
    }

    #[test]
    fn json_entry_without_mint_or_match() {
        let table = PriorityTable::from_json_str(
            r#"[{"base_type": "morgan dollar", "year": 1921, "priority": 70}]"#,
        )
        .unwrap();
        let mut variants = vec![
            Variant::base("md-1921-p", "Morgan Dollar", 1921, "P"),
            Variant::base("md-1921-d", "Morgan Dollar", 1921, "D"),
        ];
        assert_eq!(table.apply(&mut variants), 2);
        assert!(variants.iter().all(|v| v.priority_score == 70));
    }

    #[test]
    fn later_entries_take_precedence() {
        let table = PriorityTable::from_json_str(
            r#"[
                {"base_type": "Two Cent", "year": 1864, "match": "motto", "priority": 10},
                {"base_type": "Two Cent", "year": 1864, "match": "large", "priority": 90}
            ]"#,
        )
        .unwrap();
        let mut variants = two_cent_bases();
        table.apply(&mut variants);
        assert_eq!(variants[0].priority_score, 10);
        assert_eq!(variants[1].priority_score, 90);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"base_type": "Two Cent", "year": 1864, "mint_mark": "p", "match": "Small", "priority": 99}}]"#
        )
        .unwrap();
        let table = PriorityTable::from_json_file(file.path()).unwrap();
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.priority_for(&two_cent_bases()[0]), Some(99));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            PriorityTable::from_json_str("{not json"),
            Err(CoinMatchError::Json(_))
        ));
    }
}
