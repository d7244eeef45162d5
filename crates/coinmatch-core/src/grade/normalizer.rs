//! Canonical grade formatting and grade-token extraction from listing text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::{GradeError, TEXT_GRADE_NAMES, VALID_ABBREVIATIONS};

static GRADE_INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,2})[\s-]?(\d{1,2})$").unwrap());

static GRADE_ABBREV_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut prefixes: Vec<&str> = TEXT_GRADE_NAMES.iter().map(|(abbr, _)| *abbr).collect();
    prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
    Regex::new(&format!(
        r"(?i)\b({})[\s-]?(\d{{1,2}})\b",
        prefixes.join("|")
    ))
    .unwrap()
});

static GRADE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    let mut names: Vec<&str> = Vec::new();
    for (_, name) in TEXT_GRADE_NAMES {
        if !names.contains(name) {
            names.push(name);
        }
    }
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    Regex::new(&format!(r"(?i)\b({})\s+(\d{{1,2}})\b", names.join("|"))).unwrap()
});

/// Words that turn a preceding number into a denomination (`proof 3 cent`).
const DENOMINATION_WORDS: &[&str] = &[
    "cent", "cents", "penny", "pennies", "dime", "dimes", "dollar", "dollars", "mil", "mils",
];

fn followed_by_denomination(text: &str, end: usize) -> bool {
    text[end..]
        .split_whitespace()
        .next()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .is_some_and(|word| DENOMINATION_WORDS.contains(&word.as_str()))
}

/// Canonicalize `MS65`, `MS 65` or `ms-65` to `MS-65`.
///
/// Fails when the upper-cased input is not a one- or two-letter prefix
/// followed by a one- or two-digit number, or when the prefix is not a known
/// grade abbreviation.
pub fn normalize_grade(input: &str) -> Result<String, GradeError> {
    let upper = input.trim().to_uppercase();
    let caps = GRADE_INPUT_RE
        .captures(&upper)
        .ok_or_else(|| GradeError::InvalidFormat {
            input: input.to_string(),
        })?;
    let prefix = &caps[1];
    if !VALID_ABBREVIATIONS.contains(&prefix) {
        return Err(GradeError::UnknownPrefix {
            prefix: prefix.to_string(),
            input: input.to_string(),
        });
    }
    let number: u8 = caps[2].parse().map_err(|_| GradeError::InvalidFormat {
        input: input.to_string(),
    })?;
    Ok(format!("{prefix}-{number}"))
}

fn abbreviation_for_name(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    TEXT_GRADE_NAMES
        .iter()
        .find(|(_, n)| *n == lowered)
        .map(|(abbr, _)| *abbr)
}

/// Locate the first grade token in `text` and return it as `PREFIX NUM`
/// together with the byte span it occupied.
///
/// Both abbreviated (`ms65`, `vf-30`) and spelled-out (`mint state 65`,
/// `very fine 30`) forms are recognised; the earliest match wins. A
/// spelled-out name whose number is followed by a denomination word is a
/// coin description, not a grade.
pub fn extract_grade_span(text: &str) -> Option<(String, Range<usize>)> {
    let abbrev = GRADE_ABBREV_RE.captures(text).and_then(|caps| {
        let whole = caps.get(0)?;
        Some((
            format!("{} {}", caps[1].to_uppercase(), &caps[2]),
            whole.range(),
        ))
    });
    let named = GRADE_NAME_RE.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if followed_by_denomination(text, whole.end()) {
            return None;
        }
        let abbr = abbreviation_for_name(&caps[1])?;
        Some((format!("{} {}", abbr, &caps[2]), whole.range()))
    });
    match (abbrev, named) {
        (Some(a), Some(n)) => {
            if n.1.start <= a.1.start {
                Some(n)
            } else {
                Some(a)
            }
        }
        (a, n) => a.or(n),
    }
}

/// Grade token found in `text`, ready for [`normalize_grade`].
pub fn extract_grade(text: &str) -> Option<String> {
    extract_grade_span(text).map(|(grade, _)| grade)
}
