//! Full-text search over an inverted index whose postings are
//! compressed with Elias gamma or delta codes
//!
//! ```
//! use elias_index::{compress::CompressionMode, document::Document, index::InvertedIndex};
//!
//! let mut index = InvertedIndex::with_mode(CompressionMode::Delta);
//! index.add_document(Document::new(1, "cat sits on mat")).unwrap();
//! index.add_document(Document::new(3, "cat and dog are friends")).unwrap();
//!
//! let results = index.search("cat dog").unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].id, 3);
//! ```

pub mod analysis;
pub mod base;
pub mod builder;
pub mod compress;
pub mod document;
pub mod error;
pub mod index;
pub mod search;

pub use base::DocId;
pub use compress::{decode_postings, encode_postings, CompressionMode};
pub use document::Document;
pub use error::{AnalysisError, CodecError, DocumentError, IndexError};
pub use index::{IndexOptions, InvertedIndex};
