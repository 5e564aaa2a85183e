//! Bit-level I/O for the adaptive Huffman bitstream.
//!
//! Bits are packed **least-significant-bit first** within each byte: the
//! first bit written lands in bit 0 of byte 0, the ninth in bit 0 of byte 1.
//! Literal values carried inside the stream (the 8 raw bits following an
//! escape) are written MSB-first *as a sequence of single bits*, so the
//! two orders compose rather than conflict.
//!
//! # Lazy clearing
//! A write into bit 0 of a byte zeroes that byte first. Destination buffers
//! therefore never need pre-clearing, and the trailing pad bits of the last
//! byte are always zero.
//!
//! # Cursor ownership
//! There is no shared cursor. Either thread a `usize` through
//! [`put_bit`]/[`get_bit`], or let a [`BitWriter`]/[`BitReader`] own it.
//!
//! # Example
//! ```
//! use adaptive_huffman_core::bitio::{BitReader, BitWriter};
//!
//! let mut buf = [0xFFu8; 2];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.put_bits_msb(0b101, 3).unwrap();
//! assert_eq!(writer.position(), 3);
//! assert_eq!(buf[0], 0b0000_0101);
//!
//! let mut reader = BitReader::new(&buf);
//! assert_eq!(reader.get_bits_msb(3).unwrap(), 0b101);
//! ```

use crate::error::{BitIoError, Result};

/// Write one bit at `*cursor` and advance it.
///
/// # Panics
/// Panics if `*cursor / 8` is outside `buf`. Callers own capacity checks.
#[inline]
pub fn put_bit(bit: u8, buf: &mut [u8], cursor: &mut usize) {
    let byte = *cursor >> 3;
    let shift = *cursor & 7;
    if shift == 0 {
        buf[byte] = 0;
    }
    buf[byte] |= (bit & 1) << shift;
    *cursor += 1;
}

/// Read the bit at `*cursor` and advance it.
///
/// # Panics
/// Panics if `*cursor / 8` is outside `buf`.
#[inline]
pub fn get_bit(buf: &[u8], cursor: &mut usize) -> u8 {
    let bit = (buf[*cursor >> 3] >> (*cursor & 7)) & 1;
    *cursor += 1;
    bit
}

/// Writes bits LSB-first into a borrowed byte buffer.
///
/// # Invariants
/// - `position <= buf.len() * 8`
/// - once `overflowed` is set, no further bounded write succeeds
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    /// Next bit to write
    position: usize,
    /// A bounded write was refused
    overflowed: bool,
}

impl<'a> BitWriter<'a> {
    /// Create a writer starting at bit 0.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self::at(buf, 0)
    }

    /// Create a writer starting at an arbitrary bit position.
    ///
    /// Positions past the end are clamped to the buffer's bit length.
    pub fn at(buf: &'a mut [u8], position: usize) -> Self {
        let position = position.min(buf.len() * 8);
        Self {
            buf,
            position,
            overflowed: false,
        }
    }

    /// Write one bit.
    ///
    /// # Errors
    /// `BitIoError::OutOfSpace` if the buffer is full.
    pub fn put_bit(&mut self, bit: bool) -> Result<()> {
        if self.position >= self.capacity_bits() {
            return Err(BitIoError::OutOfSpace {
                position: self.position,
                capacity: self.buf.len(),
            }
            .into());
        }
        put_bit(bit as u8, self.buf, &mut self.position);
        Ok(())
    }

    /// Write one bit unless the cursor has reached `max_bits` (or the end
    /// of the buffer). Returns `false` and latches the overflow flag when the
    /// bit is refused.
    pub fn put_bit_bounded(&mut self, bit: bool, max_bits: usize) -> bool {
        let limit = max_bits.min(self.capacity_bits());
        if self.overflowed || self.position >= limit {
            self.overflowed = true;
            return false;
        }
        put_bit(bit as u8, self.buf, &mut self.position);
        true
    }

    /// Write the low `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 32
    /// - `BitIoError::OutOfSpace` if the bits do not fit
    pub fn put_bits_msb(&mut self, value: u32, count: usize) -> Result<()> {
        if count > 32 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }
        if self.position + count > self.capacity_bits() {
            return Err(BitIoError::OutOfSpace {
                position: self.position,
                capacity: self.buf.len(),
            }
            .into());
        }
        for i in (0..count).rev() {
            put_bit(((value >> i) & 1) as u8, self.buf, &mut self.position);
        }
        Ok(())
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether a bounded write has been refused.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Bytes touched so far, counting a partial final byte.
    pub fn byte_len(&self) -> usize {
        self.position.div_ceil(8)
    }

    fn capacity_bits(&self) -> usize {
        self.buf.len() * 8
    }
}

/// Reads bits LSB-first from a byte buffer.
///
/// Padding bits at the end of the buffer are indistinguishable from data;
/// the caller knows how many symbols to expect.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next bit to read
    position: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader starting at bit 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// Create a reader starting at an arbitrary bit position.
    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Read one bit.
    ///
    /// # Errors
    /// `BitIoError::UnexpectedEof` past the end of the data.
    pub fn get_bit(&mut self) -> Result<bool> {
        if self.position >= self.len_bits() {
            return Err(BitIoError::UnexpectedEof {
                position: self.position,
            }
            .into());
        }
        Ok(get_bit(self.data, &mut self.position) == 1)
    }

    /// Read `count` bits, most significant first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 32
    /// - `BitIoError::UnexpectedEof` if not enough bits remain
    pub fn get_bits_msb(&mut self, count: usize) -> Result<u32> {
        if count > 32 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }
        if count > self.bits_remaining() {
            return Err(BitIoError::UnexpectedEof {
                position: self.position,
            }
            .into());
        }
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | get_bit(self.data, &mut self.position) as u32;
        }
        Ok(value)
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor to an absolute bit position.
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Bits left before the end of the data.
    pub fn bits_remaining(&self) -> usize {
        self.len_bits().saturating_sub(self.position)
    }

    /// Total number of bits in the underlying data.
    pub fn len_bits(&self) -> usize {
        self.data.len() * 8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first_packing() {
        let mut buf = [0u8; 1];
        let mut cursor = 0;
        for bit in [1, 0, 1, 1, 0, 0, 0, 0] {
            put_bit(bit, &mut buf, &mut cursor);
        }
        assert_eq!(buf[0], 0b0000_1101);
        assert_eq!(cursor, 8);
    }

    #[test]
    fn test_lazy_clear() {
        let mut buf = [0xFFu8; 2];
        let mut cursor = 0;
        put_bit(1, &mut buf, &mut cursor);
        // first byte is cleared on its first write, second untouched
        assert_eq!(buf, [0x01, 0xFF]);

        let mut cursor = 8;
        put_bit(0, &mut buf, &mut cursor);
        assert_eq!(buf, [0x01, 0x00]);
    }

    #[test]
    fn test_free_functions_round_trip() {
        let bits = [1u8, 1, 0, 1, 0, 0, 1, 0, 1, 1, 1];
        let mut buf = [0u8; 2];
        let mut cursor = 0;
        for &b in &bits {
            put_bit(b, &mut buf, &mut cursor);
        }

        let mut cursor = 0;
        for &b in &bits {
            assert_eq!(get_bit(&buf, &mut cursor), b);
        }
        assert_eq!(cursor, bits.len());
    }

    #[test]
    fn test_literal_msb_first() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::new(&mut buf);
        writer.put_bits_msb(0x41, 8).unwrap();
        // 0x41 = 01000001 sent MSB-first, packed LSB-first
        assert_eq!(buf[0], 0x82);

        let mut reader = BitReader::new(&buf);
        assert_eq!(reader.get_bits_msb(8).unwrap(), 0x41);
    }

    #[test]
    fn test_bounded_write_latches() {
        let mut buf = [0u8; 4];
        let mut writer = BitWriter::new(&mut buf);
        assert!(writer.put_bit_bounded(true, 2));
        assert!(writer.put_bit_bounded(true, 2));
        assert!(!writer.put_bit_bounded(true, 2));
        assert!(writer.overflowed());
        // a later, larger limit does not resume a truncated stream
        assert!(!writer.put_bit_bounded(true, 32));
        assert_eq!(writer.position(), 2);
        assert_eq!(buf[0], 0b11);
    }

    #[test]
    fn test_bounded_write_respects_buffer_end() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::new(&mut buf);
        for _ in 0..8 {
            assert!(writer.put_bit_bounded(true, 1000));
        }
        assert!(!writer.put_bit_bounded(true, 1000));
        assert_eq!(writer.byte_len(), 1);
    }

    #[test]
    fn test_checked_write_out_of_space() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::at(&mut buf, 6);
        assert!(writer.put_bits_msb(0b111, 3).is_err());
        writer.put_bits_msb(0b11, 2).unwrap();
        assert!(writer.put_bit(true).is_err());
    }

    #[test]
    fn test_read_past_end() {
        let data = [0b1010_1010];
        let mut reader = BitReader::new(&data);
        assert_eq!(reader.get_bits_msb(8).unwrap(), 0b0101_0101);
        assert!(reader.get_bit().is_err());
        assert_eq!(reader.bits_remaining(), 0);
    }

    #[test]
    fn test_seek_and_position() {
        let data = [0x00, 0x80];
        let mut reader = BitReader::new(&data);
        reader.seek(15);
        assert!(reader.get_bit().unwrap());
        assert_eq!(reader.position(), 16);
    }

    #[test]
    fn test_invalid_bit_count() {
        let mut buf = [0u8; 8];
        let mut writer = BitWriter::new(&mut buf);
        assert!(writer.put_bits_msb(0, 33).is_err());
        let mut reader = BitReader::new(&buf);
        assert!(reader.get_bits_msb(33).is_err());
    }
}
