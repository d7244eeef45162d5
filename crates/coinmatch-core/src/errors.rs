//! Error types for the coinmatch core library.

use crate::grade::GradeError;

/// Top-level error enum for the coinmatch core library.
///
/// Under-specified listings are never errors: they produce a result with no
/// final match. Only construction-time failures (catalog, vocabulary) and
/// explicit grade normalization surface here.
#[derive(Debug, thiserror::Error)]
pub enum CoinMatchError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Grade error: {0}")]
    Grade(#[from] GradeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type CoinMatchResult<T> = Result<T, CoinMatchError>;
