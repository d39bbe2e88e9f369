//! Uncompressed document IDs (baseline for compression ratios)

use std::io::Write;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::PostingsCompressor;
use crate::{base::DocId, error::CodecError};

const DOCID_SIZE: usize = std::mem::size_of::<DocId>();

/// Stores each document ID as a big-endian 64 bits integer
#[derive(Clone, Copy, Debug, Default)]
pub struct RawDocIds;

impl PostingsCompressor for RawDocIds {
    fn write(&self, writer: &mut dyn Write, doc_ids: &[DocId]) -> Result<(), CodecError> {
        for &docid in doc_ids {
            writer.write_u64::<BigEndian>(docid)?;
        }
        Ok(())
    }

    fn read(&self, data: &[u8]) -> Result<Vec<DocId>, CodecError> {
        let chunks = data.chunks_exact(DOCID_SIZE);
        if !chunks.remainder().is_empty() {
            return Err(CodecError::Truncated {
                bits: (chunks.remainder().len() * 8) as u64,
            });
        }

        let mut doc_ids: Vec<DocId> = Vec::with_capacity(data.len() / DOCID_SIZE);
        for mut view in chunks {
            let docid = view.read_u64::<BigEndian>()?;
            if let Some(&previous) = doc_ids.last() {
                if previous >= docid {
                    return Err(CodecError::Unsorted {
                        previous,
                        next: docid,
                    });
                }
            }
            doc_ids.push(docid);
        }
        Ok(doc_ids)
    }
}
