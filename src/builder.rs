use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use log::{error, info, warn};

use crate::{
    analysis::{term_counts, Analyzer},
    base::{DocId, Frequency},
    compress::{check_first_doc_id, encode_sorted_postings},
    document::Document,
    error::IndexError,
    index::{IndexLayout, IndexOptions, InvertedIndex, ReinsertPolicy},
};

/*
* ---- First phase data structure
*
*/

/// The builder consumes documents and keeps the postings uncompressed;
/// they are compressed once, when the index is built
pub struct IndexBuilder {
    options: IndexOptions,
    analyzer: Arc<dyn Analyzer>,
    postings: HashMap<String, BTreeSet<DocId>>,
    documents: HashMap<DocId, Document>,
    term_frequencies: HashMap<String, HashMap<DocId, Frequency>>,
}

impl IndexBuilder {
    pub fn new(options: IndexOptions, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            options,
            analyzer,
            postings: HashMap::new(),
            documents: HashMap::new(),
            term_frequencies: HashMap::new(),
        }
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Adds a document (same semantics as `InvertedIndex::add_document`)
    ///
    /// On failure, the builder is left unchanged.
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

        // The postings where the document comes first must be encodable
        let first = counts.keys().find(|term| {
            self.postings
                .get(**term)
                .map_or(true, |doc_ids| doc_ids.range(..doc_id).next().is_none())
        });
        if let Some(term) = first {
            check_first_doc_id(doc_id, self.options.compression).map_err(|source| {
                IndexError::Encode {
                    term: term.to_string(),
                    source,
                }
            })?;
        }

        if self.documents.contains_key(&doc_id) {
            warn!("Document with ID {} already exists. Overwriting.", doc_id);
            if self.options.reinsert_policy == ReinsertPolicy::Replace {
                self.retract(doc_id);
            }
        }

        for (term, count) in counts {
            self.postings
                .entry(term.to_string())
                .or_default()
                .insert(doc_id);
            *self
                .term_frequencies
                .entry(term.to_string())
                .or_default()
                .entry(doc_id)
                .or_insert(0) += count;
        }
        self.documents.insert(doc_id, document);

        Ok(())
    }

    /// Removes a document from all postings and frequency tables
    fn retract(&mut self, doc_id: DocId) {
        let postings = &mut self.postings;
        self.term_frequencies.retain(|term, frequencies| {
            if frequencies.remove(&doc_id).is_some() {
                if let Some(doc_ids) = postings.get_mut(term) {
                    doc_ids.remove(&doc_id);
                    if doc_ids.is_empty() {
                        postings.remove(term);
                    }
                }
            }
            !frequencies.is_empty()
        });
    }

    /// Compresses all the postings and returns the index
    pub fn build(self) -> Result<InvertedIndex, IndexError> {
        let mode = self.options.compression;
        let mut postings = HashMap::with_capacity(self.postings.len());
        let mut postings_bytes = 0;

        for (term, doc_ids) in self.postings {
            let doc_ids: Vec<DocId> = doc_ids.into_iter().collect();
            let encoded =
                encode_sorted_postings(&doc_ids, mode).map_err(|source| IndexError::Encode {
                    term: term.clone(),
                    source,
                })?;
            postings_bytes += encoded.len();
            postings.insert(term, encoded);
        }

        info!(
            "Built index with {} documents and {} terms ({} compression, {} bytes of postings)",
            self.documents.len(),
            postings.len(),
            mode,
            postings_bytes
        );

        Ok(InvertedIndex::from_layout(
            IndexLayout {
                options: self.options,
                postings,
                documents: self.documents,
                term_frequencies: self.term_frequencies,
            },
            self.analyzer,
        ))
    }
}
