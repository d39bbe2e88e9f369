use std::{cmp::min, sync::Arc};

use rand::{Rng, RngCore};
use rand_distr::{Distribution, Poisson};

use elias_index::{
    analysis::{Analyzer, FnAnalyzer},
    base::DocId,
    document::Document,
    error::AnalysisError,
};

/// Synthetic vocabulary (w0, w1, ...)
pub fn vocabulary(size: usize) -> Vec<String> {
    (0..size).map(|ix| format!("w{}", ix)).collect()
}

/// Splits on white spaces, leaving the words untouched
pub fn whitespace_analyzer() -> Arc<dyn Analyzer> {
    Arc::new(FnAnalyzer(|text: &str| {
        Ok::<_, AnalysisError>(text.split_whitespace().map(str::to_string).collect())
    }))
}

/// Creates a document whose words are drawn (with repetitions) from the
/// vocabulary
pub fn create_document(
    doc_id: DocId,
    lambda_words: f32,
    max_words: usize,
    vocabulary: &[String],
    rng: &mut dyn RngCore,
) -> Document {
    let poi = Poisson::new(lambda_words).unwrap();
    let num_words = min(1 + poi.sample(rng) as usize, max_words);

    let words: Vec<&str> = (0..num_words)
        .map(|_| vocabulary[rng.gen_range(0..vocabulary.len())].as_str())
        .collect();

    Document::new(doc_id, words.join(" "))
}
