//! Text analysis: transforms a text into a sequence of normalized terms

use std::collections::{BTreeMap, HashSet};

use derivative::Derivative;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{base::Frequency, error::AnalysisError};

/// Transforms a text into an ordered sequence of terms
///
/// Implementations must be deterministic: documents and queries are
/// analyzed with the same analyzer.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<Vec<String>, AnalysisError>;
}

/// Wraps a closure as an analyzer
pub struct FnAnalyzer<F>(pub F);

impl<F> Analyzer for FnAnalyzer<F>
where
    F: Fn(&str) -> Result<Vec<String>, AnalysisError> + Send + Sync,
{
    fn analyze(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        (self.0)(text)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Russian,
}

impl Language {
    fn algorithm(&self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::Russian => Algorithm::Russian,
        }
    }

    fn stopwords(&self) -> Vec<String> {
        let language = match self {
            Language::English => stop_words::LANGUAGE::English,
            Language::Russian => stop_words::LANGUAGE::Russian,
        };
        stop_words::get(language)
            .iter()
            .map(|word| word.to_lowercase())
            .collect()
    }
}

#[derive(Derivative, Serialize, Deserialize, Clone, Debug)]
#[derivative(Default)]
pub struct TokenizerConfig {
    #[derivative(Default(value = "true"))]
    pub lowercase: bool,

    /// Tokens with fewer characters are discarded
    #[derivative(Default(value = "3"))]
    pub min_token_length: usize,

    /// Languages whose stopwords are removed
    #[derivative(Default(value = "vec![Language::Russian, Language::English]"))]
    pub stopword_languages: Vec<Language>,

    /// Snowball stemmer (none to keep words as is)
    #[derivative(Default(value = "Some(Language::Russian)"))]
    pub stemmer: Option<Language>,
}

/// Word tokenizer with stopword removal and stemming
///
/// Stopword lists and the stemmer are built once, when the
/// tokenizer is created.
pub struct Tokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        let stemmer = config
            .stemmer
            .map(|language| Stemmer::create(language.algorithm()));

        let stopwords = config
            .stopword_languages
            .iter()
            .flat_map(|language| language.stopwords())
            .collect();

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().all(char::is_alphanumeric)
            && token.chars().count() >= self.config.min_token_length
            && !self.stopwords.contains(token)
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        text.unicode_words()
            .filter(|token| self.keep(token))
            .map(|token| match &self.stemmer {
                Some(stemmer) => stemmer.stem(token).into_owned(),
                None => token.to_string(),
            })
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

impl Analyzer for Tokenizer {
    fn analyze(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        Ok(self.tokenize(text))
    }
}

/// Counts the occurrences of each term
pub fn term_counts(terms: &[String]) -> BTreeMap<&str, Frequency> {
    let mut counts = BTreeMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }
    counts
}
