use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::documents::{create_document, vocabulary};
use elias_index::{
    base::{DocId, Frequency},
    document::Document,
    index::InvertedIndex,
    search::ScoredDocument,
};

/// A random corpus, with the postings and frequencies an index should have
pub struct TestCorpus {
    pub vocabulary: Vec<String>,
    pub documents: Vec<Document>,
    pub postings: BTreeMap<String, BTreeSet<DocId>>,
    pub frequencies: HashMap<String, HashMap<DocId, Frequency>>,
}

impl TestCorpus {
    /// Creates `document_count` documents with increasing IDs separated by
    /// random gaps of at most `max_gap`
    pub fn new(
        vocabulary_size: usize,
        document_count: usize,
        lambda_words: f32,
        max_words: usize,
        max_gap: DocId,
        seed: Option<u64>,
    ) -> Self {
        let mut rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };

        let vocabulary = vocabulary(vocabulary_size);
        let mut documents = Vec::with_capacity(document_count);
        let mut postings = BTreeMap::<String, BTreeSet<DocId>>::new();
        let mut frequencies = HashMap::<String, HashMap<DocId, Frequency>>::new();

        let mut doc_id: DocId = rng.gen_range(0..=max_gap);
        for _ in 0..document_count {
            let document = create_document(doc_id, lambda_words, max_words, &vocabulary, &mut rng);
            for word in document.text.split_whitespace() {
                postings.entry(word.to_string()).or_default().insert(doc_id);
                *frequencies
                    .entry(word.to_string())
                    .or_default()
                    .entry(doc_id)
                    .or_insert(0) += 1;
            }
            documents.push(document);
            doc_id += rng.gen_range(1..=max_gap.max(1));
        }
        debug!(
            "Created {} documents over {} terms",
            documents.len(),
            postings.len()
        );

        Self {
            vocabulary,
            documents,
            postings,
            frequencies,
        }
    }

    /// Ranked conjunctive search by enumerating all documents
    pub fn search(&self, terms: &[&str]) -> Vec<ScoredDocument> {
        let mut results = Vec::new();
        if terms.is_empty() {
            return results;
        }
        for document in self.documents.iter() {
            let mut score = 0;
            let mut matches = true;
            for term in terms {
                match self
                    .frequencies
                    .get(*term)
                    .and_then(|f| f.get(&document.id))
                {
                    Some(&frequency) => score += frequency as u64,
                    None => {
                        matches = false;
                        break;
                    }
                }
            }
            if matches {
                results.push(ScoredDocument {
                    doc_id: document.id,
                    score,
                });
            }
        }
        results.sort();
        results
    }
}

/// Checks that the index contains exactly the corpus postings and frequencies
pub fn check_corpus(corpus: &TestCorpus, index: &InvertedIndex) {
    assert_eq!(index.num_terms(), corpus.postings.len());
    for (term, expected) in corpus.postings.iter() {
        let observed = index.doc_ids(term).expect("could not decode postings");
        assert!(
            observed.iter().eq(expected.iter()),
            "Postings differ for term {}: {:?} vs {:?}",
            term,
            observed,
            expected
        );
        for doc_id in expected.iter() {
            assert_eq!(
                index.term_frequency(term, *doc_id),
                corpus.frequencies[term][doc_id],
                "Frequency differ for term {} in document {}",
                term,
                doc_id
            );
        }
    }
}

/// Test if two indices are the same
pub fn check_same_index(expected: &InvertedIndex, observed: &InvertedIndex) {
    assert_eq!(expected.mode(), observed.mode());
    assert_eq!(expected.len(), observed.len());
    assert_eq!(expected.num_terms(), observed.num_terms());

    let (expected, observed) = (expected.layout(), observed.layout());
    for (term, postings) in expected.postings.iter() {
        assert_eq!(
            Some(postings),
            observed.postings.get(term),
            "Postings bytes differ for term {}",
            term
        );
    }
    assert_eq!(expected.term_frequencies, observed.term_frequencies);
    for (doc_id, document) in expected.documents.iter() {
        assert_eq!(Some(document), observed.documents.get(doc_id));
    }
}
