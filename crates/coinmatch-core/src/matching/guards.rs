//! Scoring weights and input bounds shared by the matchers.

// Input guards
pub const MAX_LISTING_LENGTH: usize = 2048;
pub const DEFAULT_TOP_N: usize = 10;
pub const MAX_TOP_N: i64 = 100;

// Coordinate-anchored scoring
pub const COORDINATE_BASE_WEIGHT: f64 = 0.5;
pub const VARIANT_KEYWORD_BONUS: f64 = 0.2;
pub const PLAIN_BASE_BONUS: f64 = 0.3;
pub const PRIORITY_WEIGHT: f64 = 0.2;
pub const PRIORITY_SCALE: f64 = 100.0;

// Keyword-overlap scoring
pub const KEYWORD_SCORE_CEILING: f64 = 0.7;

// Reporting
pub const DEFAULT_HIGH_CONFIDENCE: f64 = 0.8;
pub const DEFAULT_MEDIUM_CONFIDENCE: f64 = 0.5;

pub fn clamp_int(value: i64, minimum: i64, maximum: i64) -> i64 {
    value.max(minimum).min(maximum)
}

pub fn clamp_top_n(value: i64) -> usize {
    clamp_int(value, 1, MAX_TOP_N) as usize
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Trim and cap listing text at `MAX_LISTING_LENGTH` bytes without splitting
/// a character.
pub fn truncate_listing(text: &str) -> &str {
    let stripped = text.trim();
    if stripped.len() <= MAX_LISTING_LENGTH {
        return stripped;
    }
    let mut end = MAX_LISTING_LENGTH;
    while !stripped.is_char_boundary(end) {
        end -= 1;
    }
    &stripped[..end]
}
