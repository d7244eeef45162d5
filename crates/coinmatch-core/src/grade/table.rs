//! Static reference grade table.

use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Numeric points recognised on the Sheldon scale.
pub const SHELDON_VALUES: &[u8] = &[
    1, 2, 3, 4, 6, 8, 10, 12, 15, 20, 25, 30, 35, 40, 45, 50, 53, 55, 58, 60, 61, 62, 63, 64, 65,
    66, 67, 68, 69, 70,
];

pub const SHELDON_MIN: u8 = 1;
pub const SHELDON_MAX: u8 = 70;

/// Sheldon points each circulation prefix may carry. Proof and specimen
/// strikes may be graded anywhere on the scale.
const PREFIX_RANGES: &[(&str, u8, u8)] = &[
    ("P", 1, 1),
    ("FR", 2, 2),
    ("AG", 3, 3),
    ("G", 4, 6),
    ("VG", 8, 10),
    ("F", 12, 15),
    ("VF", 20, 35),
    ("XF", 40, 45),
    ("EF", 40, 45),
    ("AU", 50, 58),
    ("MS", 60, 70),
    ("PR", 1, 70),
    ("PF", 1, 70),
    ("SP", 1, 70),
];

static REFERENCE_GRADES: LazyLock<BTreeSet<String>> = LazyLock::new(|| {
    let mut grades = BTreeSet::new();
    for (prefix, low, high) in PREFIX_RANGES {
        for value in SHELDON_VALUES.iter().filter(|v| (*low..=*high).contains(*v)) {
            grades.insert(format!("{prefix}-{value}"));
        }
    }
    grades
});

/// Every canonical grade in the reference table.
pub fn reference_grades() -> &'static BTreeSet<String> {
    &REFERENCE_GRADES
}

pub fn is_reference_grade(canonical: &str) -> bool {
    REFERENCE_GRADES.contains(canonical)
}

/// Proof and specimen strikes, the only grades that may carry cameo tiers.
pub fn is_proof_like(prefix: &str) -> bool {
    matches!(prefix, "PR" | "PF" | "SP")
}
