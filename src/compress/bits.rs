//! Bit sequences used by the universal codes

use std::{fmt, io::Cursor};

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};

use crate::error::CodecError;

/// A code word, i.e. a right-aligned bit pattern of `len` bits
///
/// 128 bits are enough for both the gamma code (at most 127 bits for
/// a 64 bits integer) and the delta code (at most 76 bits).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Codeword {
    bits: u128,
    len: u32,
}

impl Codeword {
    pub(crate) fn new(bits: u128, len: u32) -> Self {
        debug_assert!(len > 0 && len <= 128);
        debug_assert!(len == 128 || bits >> len == 0);
        Self { bits, len }
    }

    /// Number of bits of the code word
    pub fn len(&self) -> u32 {
        self.len
    }

    /// The bits, right-aligned
    pub fn bits(&self) -> u128 {
        self.bits
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:0width$b}", self.bits, width = self.len as usize)
    }
}

/// A growable sequence of bits (most significant bit first)
pub struct BitSequence {
    writer: BitWriter<Vec<u8>, BigEndian>,
    len: u64,
}

impl BitSequence {
    pub fn new() -> Self {
        Self {
            writer: BitWriter::endian(Vec::new(), BigEndian),
            len: 0,
        }
    }

    /// Number of bits written so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_bit(&mut self, bit: bool) -> Result<(), CodecError> {
        self.writer.write_bit(bit)?;
        self.len += 1;
        Ok(())
    }

    /// Appends the `width` lowest bits of `value` (at most 64)
    pub fn push_bits(&mut self, width: u32, value: u64) -> Result<(), CodecError> {
        if width > 64 {
            return Err(CodecError::Overflow);
        }
        if width > 0 {
            self.writer.write(width, value)?;
            self.len += width as u64;
        }
        Ok(())
    }

    pub fn push_codeword(&mut self, codeword: &Codeword) -> Result<(), CodecError> {
        if codeword.len > 64 {
            self.push_bits(codeword.len - 64, (codeword.bits >> 64) as u64)?;
            self.push_bits(64, codeword.bits as u64)
        } else {
            self.push_bits(codeword.len, codeword.bits as u64)
        }
    }

    /// Pads the sequence with zero bits up to a multiple of 8, and
    /// returns the bytes
    pub fn into_bytes(mut self) -> Result<Vec<u8>, CodecError> {
        self.writer.byte_align()?;
        Ok(self.writer.into_writer())
    }
}

impl Default for BitSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bits from a byte slice, keeping track of the bits left
pub struct BitCursor<'a> {
    reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    remaining: u64,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BitReader::endian(Cursor::new(data), BigEndian),
            remaining: (data.len() as u64) * 8,
        }
    }

    /// Number of bits that can still be read
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn read_bit(&mut self) -> Result<bool, CodecError> {
        if self.remaining == 0 {
            return Err(CodecError::Truncated { bits: 0 });
        }
        let bit = self.reader.read_bit()?;
        self.remaining -= 1;
        Ok(bit)
    }

    /// Reads `width` bits (at most 64) as an unsigned integer
    pub fn read_bits(&mut self, width: u32) -> Result<u64, CodecError> {
        if width > 64 {
            return Err(CodecError::Overflow);
        }
        if (width as u64) > self.remaining {
            return Err(CodecError::Truncated {
                bits: self.remaining,
            });
        }
        if width == 0 {
            return Ok(0);
        }
        let value = self.reader.read::<u64>(width)?;
        self.remaining -= width as u64;
        Ok(value)
    }
}
