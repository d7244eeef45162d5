//! Grade validation: format, Sheldon range, and modifier compatibility.
//!
//! Each check returns `(passed, reason)` instead of an error so that batch
//! validation can report every violation at once.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::table::{is_proof_like, is_reference_grade, SHELDON_MAX, SHELDON_MIN};
use super::{normalize_grade, GradeError};

static CANONICAL_GRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(P|FR|AG|G|VG|F|VF|XF|EF|AU|MS|PR|PF|SP)-(\d{1,2})$").unwrap()
});

static DESIGNATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{1,2}[\s-]?\d{1,2})(\+?)((?:\s+[A-Z]+)*)$").unwrap()
});

const COLOR_DESIGNATIONS: &[&str] = &["RD", "RB", "BN"];
const CAMEO_TIERS: &[&str] = &["CAM", "DCAM"];
const OTHER_MODIFIERS: &[&str] = &["PL", "DMPL", "FB", "FBL", "FS", "FH", "FT"];

// ---------------------------------------------------------------------------
// GradeDesignation
// ---------------------------------------------------------------------------

/// A full grade string split into its parts, e.g. `PR-69 DCAM` or `MS-64+ RD`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDesignation {
    /// Canonical grade, `MS-65`.
    pub grade: String,
    pub plus: bool,
    pub modifiers: Vec<String>,
}

impl GradeDesignation {
    pub fn parse(input: &str) -> Result<Self, GradeError> {
        let upper = input.trim().to_uppercase();
        let caps = DESIGNATION_RE
            .captures(&upper)
            .ok_or_else(|| GradeError::InvalidFormat {
                input: input.to_string(),
            })?;
        let grade = normalize_grade(&caps[1])?;
        let modifiers: Vec<String> = caps[3].split_whitespace().map(str::to_string).collect();
        for modifier in &modifiers {
            let known = COLOR_DESIGNATIONS.contains(&modifier.as_str())
                || CAMEO_TIERS.contains(&modifier.as_str())
                || OTHER_MODIFIERS.contains(&modifier.as_str());
            if !known {
                return Err(GradeError::UnknownModifier {
                    modifier: modifier.clone(),
                    input: input.to_string(),
                });
            }
        }
        Ok(Self {
            grade,
            plus: &caps[2] == "+",
            modifiers,
        })
    }

    pub fn prefix(&self) -> &str {
        self.grade.split('-').next().unwrap_or("")
    }

    pub fn number(&self) -> Option<u8> {
        self.grade.rsplit('-').next().and_then(|n| n.parse().ok())
    }
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

/// The canonical string matches the grade pattern and the reference table.
pub fn check_format(canonical: &str) -> (bool, String) {
    if !CANONICAL_GRADE_RE.is_match(canonical) {
        return (
            false,
            format!("'{canonical}' does not match the canonical PREFIX-NUMBER format"),
        );
    }
    if !is_reference_grade(canonical) {
        return (
            false,
            format!("'{canonical}' is not in the reference grade table"),
        );
    }
    (true, "format ok".to_string())
}

/// The numeric component lies on the Sheldon scale.
pub fn check_range(canonical: &str) -> (bool, String) {
    let number = canonical
        .rsplit('-')
        .next()
        .and_then(|n| n.parse::<u8>().ok());
    match number {
        Some(n) if (SHELDON_MIN..=SHELDON_MAX).contains(&n) => (true, "range ok".to_string()),
        Some(n) => (
            false,
            format!("grade number {n} is outside the Sheldon range {SHELDON_MIN}-{SHELDON_MAX}"),
        ),
        None => (false, format!("'{canonical}' has no numeric component")),
    }
}

fn with_modifiers<'a>(designation: &'a GradeDesignation, group: &[&str]) -> Vec<&'a str> {
    designation
        .modifiers
        .iter()
        .map(String::as_str)
        .filter(|m| group.contains(m))
        .collect()
}

fn outcome(problems: Vec<String>, ok: &str) -> (bool, String) {
    if problems.is_empty() {
        (true, ok.to_string())
    } else {
        (false, problems.join("; "))
    }
}

/// Cameo tiers only on proof-like strikes, and at most one of them.
pub fn check_cameo(designation: &GradeDesignation) -> (bool, String) {
    let cameos = with_modifiers(designation, CAMEO_TIERS);
    let mut problems = Vec::new();
    if let Some(first) = cameos.first() {
        if !is_proof_like(designation.prefix()) {
            problems.push(format!(
                "cameo modifier {first} is only valid on proof or specimen grades, not {}",
                designation.grade
            ));
        }
    }
    if cameos.len() > 1 {
        problems.push(format!(
            "cameo tiers are mutually exclusive: {}",
            cameos.join(", ")
        ));
    }
    outcome(problems, "cameo ok")
}

/// At most one color designation.
pub fn check_color(designation: &GradeDesignation) -> (bool, String) {
    let colors = with_modifiers(designation, COLOR_DESIGNATIONS);
    if colors.len() > 1 {
        return (
            false,
            format!("color designations are mutually exclusive: {}", colors.join(", ")),
        );
    }
    (true, "color ok".to_string())
}

/// Every modifier rule at once; the reason lists each failed rule.
pub fn check_modifiers(designation: &GradeDesignation) -> (bool, String) {
    let problems = [check_cameo(designation), check_color(designation)]
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, reason)| reason)
        .collect();
    outcome(problems, "modifiers ok")
}

// ---------------------------------------------------------------------------
// Aggregate validation
// ---------------------------------------------------------------------------

/// A single failed check for one input grade.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeViolation {
    pub input: String,
    pub check: String,
    pub reason: String,
}

fn run_checks(input: &str) -> Vec<GradeViolation> {
    let violation = |check: &str, reason: String| GradeViolation {
        input: input.to_string(),
        check: check.to_string(),
        reason,
    };
    let designation = match GradeDesignation::parse(input) {
        Ok(d) => d,
        Err(e) => return vec![violation("parse", e.to_string())],
    };

    let mut violations = Vec::new();
    let (ok, reason) = check_format(&designation.grade);
    if !ok {
        violations.push(violation("format", reason));
    }
    let (ok, reason) = check_range(&designation.grade);
    if !ok {
        violations.push(violation("range", reason));
    }
    let (ok, reason) = check_cameo(&designation);
    if !ok {
        violations.push(violation("cameo", reason));
    }
    let (ok, reason) = check_color(&designation);
    if !ok {
        violations.push(violation("color", reason));
    }
    violations
}

/// Validate one grade string, optionally carrying modifiers (`PR-69 DCAM`).
///
/// Returns the first failing reason, or `(true, "valid")`.
pub fn validate_grade(grade: &str) -> (bool, String) {
    match run_checks(grade).into_iter().next() {
        Some(v) => (false, v.reason),
        None => (true, "valid".to_string()),
    }
}

/// Validate many grades and collect every violation, in input order.
pub fn validate_grade_batch<S: AsRef<str>>(grades: &[S]) -> Vec<GradeViolation> {
    grades
        .iter()
        .flat_map(|g| run_checks(g.as_ref()))
        .collect()
}
