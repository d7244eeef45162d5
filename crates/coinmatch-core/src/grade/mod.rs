//! Grade normalization and validation on the Sheldon scale.

pub mod normalizer;
pub mod table;
pub mod validator;

pub use normalizer::{extract_grade, extract_grade_span, normalize_grade};
pub use validator::{
    check_cameo, check_color, check_format, check_modifiers, check_range, validate_grade,
    validate_grade_batch, GradeDesignation, GradeViolation,
};

/// Letter prefixes accepted by the grade normalizer.
pub const VALID_ABBREVIATIONS: &[&str] = &[
    "P", "FR", "AG", "G", "VG", "F", "VF", "XF", "EF", "AU", "MS", "PR", "PF", "SP",
];

/// Grade abbreviations that are spelled out when they appear in listing text
/// next to a number. `P` is left alone: a bare `p` next to digits is far more
/// often a Philadelphia mint mark than a Poor grade.
///
/// Where two abbreviations share a name (`PR`/`PF`, `XF`/`EF`) the first one
/// listed is the one recovered by [`extract_grade`].
pub const TEXT_GRADE_NAMES: &[(&str, &str)] = &[
    ("MS", "mint state"),
    ("PR", "proof"),
    ("PF", "proof"),
    ("SP", "specimen"),
    ("AU", "about uncirculated"),
    ("XF", "extremely fine"),
    ("EF", "extremely fine"),
    ("VF", "very fine"),
    ("VG", "very good"),
    ("AG", "about good"),
    ("FR", "fair"),
    ("F", "fine"),
    ("G", "good"),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradeError {
    #[error("invalid grade '{input}': expected a letter prefix and a number such as MS-65, MS 65 or MS65")]
    InvalidFormat { input: String },

    #[error("unknown grade abbreviation '{prefix}' in '{input}'")]
    UnknownPrefix { prefix: String, input: String },

    #[error("unknown grade modifier '{modifier}' in '{input}'")]
    UnknownModifier { modifier: String, input: String },
}
