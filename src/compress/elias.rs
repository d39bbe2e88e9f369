//! Elias gamma and delta universal codes
//!
//! Batch encoding concatenates the code words and pads the last byte
//! with zero bits. Since every code word contains at least one `1` bit,
//! a run of fewer than 8 zero bits at the end of the stream can only be
//! padding, which makes decoding an exact inverse of encoding.

use crate::error::CodecError;

use super::bits::{BitCursor, BitSequence, Codeword};

/// Integer part of the base 2 logarithm (n > 0)
#[inline]
fn floor_log2(n: u64) -> u32 {
    63 - n.leading_zeros()
}

/// A prefix code for strictly positive integers
pub trait UniversalCode: Sync + Send {
    /// Returns the code word for `n`
    fn encode_number(&self, n: u64) -> Result<Codeword, CodecError>;

    /// Reads the next number, or returns `None` when only padding is left
    fn read_number(&self, cursor: &mut BitCursor) -> Result<Option<u64>, CodecError>;

    /// Encodes a signed integer (which should be strictly positive)
    fn encode_signed(&self, n: i64) -> Result<Codeword, CodecError> {
        if n <= 0 {
            return Err(CodecError::InvalidInput(n));
        }
        self.encode_number(n as u64)
    }

    /// Encodes a list of numbers into (zero-padded) bytes
    fn encode(&self, numbers: &[u64]) -> Result<Vec<u8>, CodecError> {
        let mut sequence = BitSequence::new();
        for &n in numbers {
            sequence.push_codeword(&self.encode_number(n)?)?;
        }
        sequence.into_bytes()
    }

    /// Decodes all the numbers contained in the bytes
    fn decode(&self, data: &[u8]) -> Result<Vec<u64>, CodecError> {
        let mut cursor = BitCursor::new(data);
        let mut numbers = Vec::new();
        while let Some(n) = self.read_number(&mut cursor)? {
            numbers.push(n);
        }
        Ok(numbers)
    }
}

/// Elias gamma code: `floor(log2 n)` zeros followed by the binary
/// representation of `n`
#[derive(Clone, Copy, Debug, Default)]
pub struct EliasGamma;

impl UniversalCode for EliasGamma {
    fn encode_number(&self, n: u64) -> Result<Codeword, CodecError> {
        if n == 0 {
            return Err(CodecError::InvalidInput(0));
        }
        // The leading zeros are the high bits of the code word
        Ok(Codeword::new(n as u128, 2 * floor_log2(n) + 1))
    }

    fn read_number(&self, cursor: &mut BitCursor) -> Result<Option<u64>, CodecError> {
        let available = cursor.remaining();
        let mut zeros: u64 = 0;
        loop {
            if cursor.is_exhausted() {
                // Only zeros until the end: padding if within the last byte
                return if available < 8 {
                    Ok(None)
                } else {
                    Err(CodecError::Truncated { bits: available })
                };
            }
            if cursor.read_bit()? {
                break;
            }
            zeros += 1;
        }

        if zeros > 63 {
            return Err(CodecError::Overflow);
        }
        let low = cursor.read_bits(zeros as u32)?;
        Ok(Some((1u64 << zeros) | low))
    }
}

/// Elias delta code: the gamma code of the bit length of `n`, followed
/// by the bits of `n` without its leading `1`
#[derive(Clone, Copy, Debug, Default)]
pub struct EliasDelta;

impl UniversalCode for EliasDelta {
    fn encode_number(&self, n: u64) -> Result<Codeword, CodecError> {
        if n == 0 {
            return Err(CodecError::InvalidInput(0));
        }
        let low_len = floor_log2(n);
        let prefix = EliasGamma.encode_number((low_len + 1) as u64)?;
        let low = (n as u128) & ((1u128 << low_len) - 1);
        Ok(Codeword::new(
            (prefix.bits() << low_len) | low,
            prefix.len() + low_len,
        ))
    }

    fn read_number(&self, cursor: &mut BitCursor) -> Result<Option<u64>, CodecError> {
        let len = match EliasGamma.read_number(cursor)? {
            Some(len) => len,
            None => return Ok(None),
        };
        if len > 64 {
            return Err(CodecError::Overflow);
        }

        let low_len = (len - 1) as u32;
        let low = cursor.read_bits(low_len)?;
        Ok(Some((1u64 << low_len) | low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_log2() {
        assert_eq!(floor_log2(1), 0);
        assert_eq!(floor_log2(2), 1);
        assert_eq!(floor_log2(3), 1);
        assert_eq!(floor_log2(1024), 10);
        assert_eq!(floor_log2(u64::MAX), 63);
    }

    #[test]
    fn test_code_lengths() {
        for n in [1u64, 2, 7, 8, 1000, u64::MAX] {
            let k = floor_log2(n);
            assert_eq!(EliasGamma.encode_number(n).unwrap().len(), 2 * k + 1);
            let gamma_len = 2 * floor_log2((k + 1) as u64) + 1;
            assert_eq!(EliasDelta.encode_number(n).unwrap().len(), gamma_len + k);
        }
    }

    #[test]
    fn test_padding_is_ignored() {
        // "1" + 7 bits of padding
        assert_eq!(EliasGamma.decode(&[0b1000_0000]).unwrap(), vec![1]);
        assert_eq!(EliasDelta.decode(&[0b1000_0000]).unwrap(), vec![1]);
    }

    #[test]
    fn test_zero_byte_is_not_padding() {
        assert!(matches!(
            EliasGamma.decode(&[0b1000_0000, 0]),
            Err(CodecError::Truncated { bits: 15 })
        ));
    }
}
