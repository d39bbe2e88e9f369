//! Methods for compressing the posting lists

use std::{fmt, io::Write, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{base::DocId, error::CodecError};

pub mod bits;
pub mod elias;
pub mod raw;

use elias::{EliasDelta, EliasGamma, UniversalCode};
use raw::RawDocIds;

//
// ---- Compression ---
//

/// Compresses a sorted list of distinct document IDs
pub trait PostingsCompressor: Sync + Send {
    fn write(&self, writer: &mut dyn Write, doc_ids: &[DocId]) -> Result<(), CodecError>;
    fn read(&self, data: &[u8]) -> Result<Vec<DocId>, CodecError>;
}

/// Encodes the gaps between document IDs with a universal code
///
/// The first gap is shifted by one, so that document 0 can be
/// represented with a code whose domain is the strictly positive integers
#[derive(Clone, Copy, Debug, Default)]
pub struct GapCompressor<C: UniversalCode>(pub C);

impl<C: UniversalCode> PostingsCompressor for GapCompressor<C> {
    fn write(&self, writer: &mut dyn Write, doc_ids: &[DocId]) -> Result<(), CodecError> {
        let gaps = to_gaps(doc_ids)?;
        writer.write_all(&self.0.encode(&gaps)?)?;
        Ok(())
    }

    fn read(&self, data: &[u8]) -> Result<Vec<DocId>, CodecError> {
        from_gaps(&self.0.decode(data)?)
    }
}

/// Transforms a strictly increasing list into its gap sequence
fn to_gaps(doc_ids: &[DocId]) -> Result<Vec<u64>, CodecError> {
    let mut gaps = Vec::with_capacity(doc_ids.len());
    let mut previous: Option<DocId> = None;
    for &docid in doc_ids {
        let gap = match previous {
            None => docid.checked_add(1).ok_or(CodecError::Overflow)?,
            Some(previous) => {
                if docid <= previous {
                    return Err(CodecError::Unsorted {
                        previous,
                        next: docid,
                    });
                }
                docid - previous
            }
        };
        gaps.push(gap);
        previous = Some(docid);
    }
    Ok(gaps)
}

/// Prefix-sums a gap sequence back into document IDs
fn from_gaps(gaps: &[u64]) -> Result<Vec<DocId>, CodecError> {
    let mut doc_ids = Vec::with_capacity(gaps.len());
    let mut current: Option<DocId> = None;
    for &gap in gaps {
        let docid = match current {
            None => gap.checked_sub(1).ok_or(CodecError::InvalidInput(0))?,
            Some(current) => current.checked_add(gap).ok_or(CodecError::Overflow)?,
        };
        doc_ids.push(docid);
        current = Some(docid);
    }
    Ok(doc_ids)
}

static RAW: RawDocIds = RawDocIds;
static GAMMA: GapCompressor<EliasGamma> = GapCompressor(EliasGamma);
static DELTA: GapCompressor<EliasDelta> = GapCompressor(EliasDelta);

/// How the postings of an index are stored
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Plain document IDs
    None,
    /// Gaps encoded with the Elias gamma code
    #[default]
    Gamma,
    /// Gaps encoded with the Elias delta code
    Delta,
}

impl CompressionMode {
    pub const ALL: [CompressionMode; 3] = [
        CompressionMode::None,
        CompressionMode::Gamma,
        CompressionMode::Delta,
    ];

    /// Returns the compressor associated with this mode
    pub fn codec(&self) -> &'static dyn PostingsCompressor {
        match self {
            CompressionMode::None => &RAW,
            CompressionMode::Gamma => &GAMMA,
            CompressionMode::Delta => &DELTA,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::Gamma => "gamma",
            CompressionMode::Delta => "delta",
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionMode::None),
            "gamma" => Ok(CompressionMode::Gamma),
            "delta" => Ok(CompressionMode::Delta),
            _ => Err(format!(
                "unknown compression mode '{}' (expected none, gamma or delta)",
                s
            )),
        }
    }
}

/// Compresses a collection of document IDs (duplicates are allowed, and
/// the order does not matter)
pub fn encode_postings(doc_ids: &[DocId], mode: CompressionMode) -> Result<Vec<u8>, CodecError> {
    let mut sorted = doc_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    encode_sorted_postings(&sorted, mode)
}

/// Compresses a strictly increasing list of document IDs
pub(crate) fn encode_sorted_postings(
    doc_ids: &[DocId],
    mode: CompressionMode,
) -> Result<Vec<u8>, CodecError> {
    let mut data = Vec::new();
    if !doc_ids.is_empty() {
        mode.codec().write(&mut data, doc_ids)?;
    }
    Ok(data)
}

/// Checks that `doc_id` can start a postings list in the given mode
pub fn check_first_doc_id(doc_id: DocId, mode: CompressionMode) -> Result<(), CodecError> {
    match mode {
        CompressionMode::None => Ok(()),
        CompressionMode::Gamma | CompressionMode::Delta => to_gaps(&[doc_id]).map(drop),
    }
}

/// Returns the strictly increasing list of document IDs
pub fn decode_postings(data: &[u8], mode: CompressionMode) -> Result<Vec<DocId>, CodecError> {
    mode.codec().read(data)
}
