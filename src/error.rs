//! Error types

use thiserror::Error;

use crate::base::DocId;

/// Errors raised by the integer codecs and the postings codec
#[derive(Debug, Error)]
pub enum CodecError {
    /// Universal codes only represent strictly positive integers
    #[error("only strictly positive integers can be encoded, got {0}")]
    InvalidInput(i64),

    /// The bit stream ended in the middle of a code word
    #[error("truncated bit stream ({bits} meaningful bits left)")]
    Truncated { bits: u64 },

    /// The decoded (or encoded) value does not fit in 64 bits
    #[error("value does not fit in 64 bits")]
    Overflow,

    /// Raw document IDs were not strictly increasing
    #[error("document IDs are not strictly increasing ({previous} then {next})")]
    Unsorted { previous: DocId, next: DocId },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by an analyzer
#[derive(Debug, Error)]
#[error("text analysis failed: {0}")]
pub struct AnalysisError(pub String);

/// Errors raised when validating an external document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("a document should be a JSON object")]
    NotAnObject,

    #[error("document ID should be a non-negative integer, got {0}")]
    InvalidId(String),

    #[error("document text should be a string, got {0}")]
    InvalidText(String),

    #[error("document metadata should be an object, got {0}")]
    InvalidMetadata(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    /// Wraps any failure while adding a document: the document is not indexed
    #[error("failed to add document {doc_id}: {source}")]
    Indexation {
        doc_id: DocId,
        #[source]
        source: Box<IndexError>,
    },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("could not decode the postings of term '{term}': {source}")]
    Decode {
        term: String,
        #[source]
        source: CodecError,
    },

    #[error("could not encode the postings of term '{term}': {source}")]
    Encode {
        term: String,
        #[source]
        source: CodecError,
    },

    #[error("document {0} appears in the postings but is not stored")]
    MissingDocument(DocId),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}
