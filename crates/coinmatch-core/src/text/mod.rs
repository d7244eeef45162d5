//! Text normalization and feature extraction.

pub mod extractor;
pub mod normalizer;

use std::sync::LazyLock;

use regex::Regex;

pub use extractor::{keyword_tokens, FeatureExtractor};
pub use normalizer::TextNormalizer;

use crate::errors::CoinMatchResult;
use crate::models::Features;
use crate::vocabulary::Vocabulary;

static BUILTIN: LazyLock<Lexicon> = LazyLock::new(|| {
    Lexicon::compile(&Vocabulary::builtin()).expect("built-in vocabulary compiles")
});

/// A validated vocabulary compiled into its normalizer and extractor.
#[derive(Debug)]
pub struct Lexicon {
    pub normalizer: TextNormalizer,
    pub extractor: FeatureExtractor,
    grading_service_re: Option<Regex>,
}

impl Lexicon {
    pub fn compile(vocabulary: &Vocabulary) -> CoinMatchResult<Self> {
        vocabulary.validate()?;
        let grading_service_re = normalizer::word_alternation(
            vocabulary.grading_services.iter().map(|s| s.to_lowercase()),
        )
        .map(|pattern| Regex::new(&pattern))
        .transpose()?;
        Ok(Self {
            normalizer: TextNormalizer::new(vocabulary)?,
            extractor: FeatureExtractor::new(vocabulary)?,
            grading_service_re,
        })
    }

    /// The lexicon compiled from [`Vocabulary::builtin`].
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    pub fn normalize(&self, text: &str) -> String {
        self.normalizer.normalize(text)
    }

    pub fn extract(&self, normalized: &str) -> Features {
        self.extractor.extract(normalized)
    }

    /// First grading service named in `text`, upper-cased.
    pub fn grading_service(&self, text: &str) -> Option<String> {
        let re = self.grading_service_re.as_ref()?;
        re.find(&text.to_lowercase())
            .map(|m| m.as_str().to_uppercase())
    }
}

/// Normalize with the built-in vocabulary.
pub fn normalize(text: &str) -> String {
    BUILTIN.normalize(text)
}

/// Extract features with the built-in vocabulary.
pub fn extract(normalized: &str) -> Features {
    BUILTIN.extract(normalized)
}
