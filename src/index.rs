//! Main data structure: the inverted index with compressed postings

use std::{
    collections::{BTreeSet, HashMap},
    path::Path,
    sync::Arc,
};

use derivative::Derivative;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::{term_counts, Analyzer, Tokenizer},
    base::{load_cbor, save_cbor, DocId, Frequency},
    compress::{decode_postings, encode_sorted_postings, CompressionMode},
    document::Document,
    error::IndexError,
    search::{intersect_sorted, ScoredDocument},
};

/// What happens when a search fails (e.g. corrupted postings)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchPolicy {
    /// The failure is logged and the search returns no document
    Lenient,
    /// The failure is returned to the caller
    Strict,
}

/// What happens when a document ID is indexed twice
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReinsertPolicy {
    /// The stored document is overwritten, but postings of terms that
    /// only appear in the previous text still contain the document
    Append,
    /// The previous document is removed before indexing the new one
    Replace,
}

#[derive(Derivative, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[derivative(Default)]
pub struct IndexOptions {
    /// Postings codec, fixed for the lifetime of the index
    #[derivative(Default(value = "CompressionMode::Gamma"))]
    pub compression: CompressionMode,

    #[derivative(Default(value = "SearchPolicy::Lenient"))]
    pub search_policy: SearchPolicy,

    #[derivative(Default(value = "ReinsertPolicy::Append"))]
    pub reinsert_policy: ReinsertPolicy,
}

impl IndexOptions {
    pub fn with_compression(compression: CompressionMode) -> Self {
        Self {
            compression,
            ..Default::default()
        }
    }
}

/// Everything an index stores
///
/// This is also the persisted layout: any serialization of this
/// structure must keep the postings bytes and the frequencies as is.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct IndexLayout {
    pub options: IndexOptions,

    /// Term -> compressed postings
    pub postings: HashMap<String, Vec<u8>>,

    pub documents: HashMap<DocId, Document>,

    /// Term -> document -> number of occurrences
    pub term_frequencies: HashMap<String, HashMap<DocId, Frequency>>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexStatistics {
    pub documents: usize,
    pub terms: usize,
    /// Total size of the compressed postings
    pub postings_bytes: usize,
    /// Size of the terms (UTF-8) and of their postings
    pub index_size: usize,
}

impl IndexStatistics {
    /// How many times smaller this index is than `baseline` (`None` when
    /// this index is empty)
    pub fn compression_ratio(&self, baseline: &IndexStatistics) -> Option<f64> {
        if self.index_size == 0 {
            return None;
        }
        Some(baseline.index_size as f64 / self.index_size as f64)
    }
}

/// Postings updates that are applied only when all of them were encoded
type PendingPostings = Vec<(String, Option<Vec<u8>>)>;

pub struct InvertedIndex {
    layout: IndexLayout,
    analyzer: Arc<dyn Analyzer>,
}

impl InvertedIndex {
    pub fn new(options: IndexOptions, analyzer: Arc<dyn Analyzer>) -> Self {
        Self::from_layout(
            IndexLayout {
                options,
                ..Default::default()
            },
            analyzer,
        )
    }

    /// Creates an empty index with the default tokenizer
    pub fn with_mode(mode: CompressionMode) -> Self {
        Self::new(
            IndexOptions::with_compression(mode),
            Arc::new(Tokenizer::default()),
        )
    }

    pub fn from_layout(layout: IndexLayout, analyzer: Arc<dyn Analyzer>) -> Self {
        Self { layout, analyzer }
    }

    pub fn layout(&self) -> &IndexLayout {
        &self.layout
    }

    pub fn into_layout(self) -> IndexLayout {
        self.layout
    }

    pub fn options(&self) -> &IndexOptions {
        &self.layout.options
    }

    pub fn mode(&self) -> CompressionMode {
        self.layout.options.compression
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.layout.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.documents.is_empty()
    }

    pub fn num_terms(&self) -> usize {
        self.layout.postings.len()
    }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> {
        self.layout.documents.get(&doc_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.layout.documents.values()
    }

    /// Compressed postings of a term
    pub fn postings(&self, term: &str) -> Option<&[u8]> {
        self.layout.postings.get(term).map(Vec::as_slice)
    }

    /// Decoded postings of a term (empty if the term is not indexed)
    pub fn doc_ids(&self, term: &str) -> Result<Vec<DocId>, IndexError> {
        self.decode_term(term)
    }

    pub fn term_frequency(&self, term: &str, doc_id: DocId) -> Frequency {
        self.layout
            .term_frequencies
            .get(term)
            .and_then(|frequencies| frequencies.get(&doc_id))
            .copied()
            .unwrap_or(0)
    }

    fn decode_term(&self, term: &str) -> Result<Vec<DocId>, IndexError> {
        match self.layout.postings.get(term) {
            Some(data) => {
                decode_postings(data, self.mode()).map_err(|source| IndexError::Decode {
                    term: term.to_string(),
                    source,
                })
            }
            None => Ok(Vec::new()),
        }
    }

    fn encode_term(&self, term: &str, doc_ids: &[DocId]) -> Result<Vec<u8>, IndexError> {
        encode_sorted_postings(doc_ids, self.mode()).map_err(|source| IndexError::Encode {
            term: term.to_string(),
            source,
        })
    }

    /// Terms associated with a document (including terms of previous
    /// versions of the document that were not retracted)
    fn terms_of(&self, doc_id: DocId) -> Vec<String> {
        self.layout
            .term_frequencies
            .iter()
            .filter(|(_, frequencies)| frequencies.contains_key(&doc_id))
            .map(|(term, _)| term.clone())
            .collect()
    }

    /// Computes the new postings of `term` without `doc_id` (`None` if
    /// they become empty)
    fn postings_without(&self, term: &str, doc_id: DocId) -> Result<Option<Vec<u8>>, IndexError> {
        let mut doc_ids = self.decode_term(term)?;
        doc_ids.retain(|&other| other != doc_id);
        if doc_ids.is_empty() {
            Ok(None)
        } else {
            self.encode_term(term, &doc_ids).map(Some)
        }
    }

    fn commit_postings(&mut self, pending: PendingPostings) {
        for (term, postings) in pending {
            match postings {
                Some(postings) => {
                    self.layout.postings.insert(term, postings);
                }
                None => {
                    self.layout.postings.remove(&term);
                }
            }
        }
    }

    fn clear_frequencies(&mut self, doc_id: DocId, terms: &[String]) {
        for term in terms {
            if let Some(frequencies) = self.layout.term_frequencies.get_mut(term) {
                frequencies.remove(&doc_id);
                if frequencies.is_empty() {
                    self.layout.term_frequencies.remove(term);
                }
            }
        }
    }

    /// Adds a document to the index
    ///
    /// If a document with the same ID exists, it is overwritten. On
    /// failure, the index is left unchanged.
    pub fn add_document(&mut self, document: Document) -> Result<(), IndexError> {
        let doc_id = document.id;
        self.try_add_document(document).map_err(|e| {
            error!("Failed to add document {}: {}", doc_id, e);
            IndexError::Indexation {
                doc_id,
                source: Box::new(e),
            }
        })
    }

    fn try_add_document(&mut self, document: Document) -> Result<(), IndexError> {
        let doc_id = document.id;
        let terms = self.analyzer.analyze(&document.text)?;
        let counts = term_counts(&terms);

        let exists = self.layout.documents.contains_key(&doc_id);
        let replace = exists && self.layout.options.reinsert_policy == ReinsertPolicy::Replace;
        let previous_terms = if replace {
            self.terms_of(doc_id)
        } else {
            Vec::new()
        };

        let mut pending = PendingPostings::new();
        for term in previous_terms
            .iter()
            .filter(|term| !counts.contains_key(term.as_str()))
        {
            pending.push((term.clone(), self.postings_without(term, doc_id)?));
        }

        for &term in counts.keys() {
            let mut doc_ids = self.decode_term(term)?;
            if let Err(position) = doc_ids.binary_search(&doc_id) {
                doc_ids.insert(position, doc_id);
                debug!(
                    "Adding document {} to the postings of '{}' ({} documents)",
                    doc_id,
                    term,
                    doc_ids.len()
                );
                pending.push((term.to_string(), Some(self.encode_term(term, &doc_ids)?)));
            }
        }

        // Everything has been encoded: update the index
        if exists {
            warn!("Document with ID {} already exists. Overwriting.", doc_id);
        }
        self.commit_postings(pending);
        if replace {
            self.clear_frequencies(doc_id, &previous_terms);
        }
        for (term, count) in counts {
            *self
                .layout
                .term_frequencies
                .entry(term.to_string())
                .or_default()
                .entry(doc_id)
                .or_insert(0) += count;
        }
        self.layout.documents.insert(doc_id, document);

        Ok(())
    }

    /// Removes a document and retracts it from all the postings
    pub fn remove_document(&mut self, doc_id: DocId) -> Result<Option<Document>, IndexError> {
        if !self.layout.documents.contains_key(&doc_id) {
            return Ok(None);
        }

        let terms = self.terms_of(doc_id);
        let mut pending = PendingPostings::new();
        for term in terms.iter() {
            pending.push((term.clone(), self.postings_without(term, doc_id)?));
        }

        self.commit_postings(pending);
        self.clear_frequencies(doc_id, &terms);
        debug!("Removed document {} from {} terms", doc_id, terms.len());
        Ok(self.layout.documents.remove(&doc_id))
    }

    /// Returns the documents containing all the query terms, by
    /// decreasing sum of term frequencies
    pub fn search(&self, query: &str) -> Result<Vec<&Document>, IndexError> {
        Ok(self
            .search_scored(query)?
            .iter()
            .filter_map(|scored| self.layout.documents.get(&scored.doc_id))
            .collect())
    }

    /// Same as `search`, but returns document IDs and scores
    pub fn search_scored(&self, query: &str) -> Result<Vec<ScoredDocument>, IndexError> {
        match self.try_search(query) {
            Ok(results) => Ok(results),
            Err(e) => match self.layout.options.search_policy {
                SearchPolicy::Lenient => {
                    error!("Search failed for query '{}': {}", query, e);
                    Ok(Vec::new())
                }
                SearchPolicy::Strict => Err(e),
            },
        }
    }

    fn try_search(&self, query: &str) -> Result<Vec<ScoredDocument>, IndexError> {
        let terms = self.analyzer.analyze(query)?;
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        // Boolean AND: one unknown term is enough to match nothing
        if let Some(term) = terms
            .iter()
            .find(|term| !self.layout.postings.contains_key(term.as_str()))
        {
            debug!("Term '{}' is not indexed (query '{}')", term, query);
            return Ok(Vec::new());
        }

        let distinct: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
        let mut candidates: Option<Vec<DocId>> = None;
        for term in distinct {
            let doc_ids = self.decode_term(term)?;
            candidates = Some(match candidates {
                None => doc_ids,
                Some(candidates) => intersect_sorted(&candidates, &doc_ids),
            });
        }
        let candidates = candidates.unwrap_or_default();
        debug!(
            "{} documents contain all the terms of '{}'",
            candidates.len(),
            query
        );

        let mut results = Vec::with_capacity(candidates.len());
        for doc_id in candidates {
            if !self.layout.documents.contains_key(&doc_id) {
                return Err(IndexError::MissingDocument(doc_id));
            }
            let score: u64 = terms
                .iter()
                .map(|term| self.term_frequency(term, doc_id) as u64)
                .sum();
            results.push(ScoredDocument { doc_id, score });
        }
        results.sort();

        Ok(results)
    }

    pub fn statistics(&self) -> IndexStatistics {
        let postings_bytes = self.layout.postings.values().map(Vec::len).sum();
        let terms_bytes: usize = self.layout.postings.keys().map(String::len).sum();
        IndexStatistics {
            documents: self.layout.documents.len(),
            terms: self.layout.postings.len(),
            postings_bytes,
            index_size: terms_bytes + postings_bytes,
        }
    }

    /// Saves the index within the given folder
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        save_cbor(&self.layout, path)
    }

    /// Loads an index saved with `save`
    pub fn load(path: &Path, analyzer: Arc<dyn Analyzer>) -> Result<Self, IndexError> {
        let layout: IndexLayout = load_cbor(path)?;
        Ok(Self::from_layout(layout, analyzer))
    }
}
