//! Whole-payload compression and decompression.
//!
//! # Wire format
//!
//! ```text
//! +----------------------+
//! | length (2 bytes)     |  u16 big-endian, uncompressed byte count
//! +----------------------+
//! | bitstream            |  adaptive Huffman codes, LSB-first per byte,
//! | (variable)           |  zero-padded to a byte boundary
//! +----------------------+
//! ```
//!
//! The first occurrence of every distinct byte is sent as the NYT code
//! followed by its 8-bit value. Decoding stops after `length` symbols, so
//! pad bits are never interpreted.
//!
//! # Modes
//! [`DecodeMode::Lenient`] reproduces the forgiving behavior of the
//! reference codec: a declared length larger than the destination is
//! clamped, a stream that runs dry is zero-filled, and output that does
//! not fit is truncated. [`DecodeMode::Strict`] reports each of these as a
//! [`SessionError`] instead.

use crate::bitio::{BitReader, BitWriter};
use crate::error::{Result, SessionError};
use crate::model::AdaptiveModel;
use crate::walk::{receive, transmit};

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_BYTES: usize = 2;

/// Largest payload the length prefix can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Default destination capacity: room for a worst-case expansion of the
/// largest payload.
pub const DEFAULT_CAPACITY: usize = 128 * 1024;

/// How a session reacts to streams and buffers that do not line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Clamp, truncate and zero-fill
    #[default]
    Lenient,
    /// Report a `SessionError`
    Strict,
}

/// Per-session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: DecodeMode,
    /// Destination size in bytes: the compressed output when compressing,
    /// the decoded payload when decompressing
    pub capacity: usize,
}

impl SessionConfig {
    /// Lenient session bounded by `capacity`.
    pub fn lenient(capacity: usize) -> Self {
        Self {
            mode: DecodeMode::Lenient,
            capacity,
        }
    }

    /// Strict session bounded by `capacity`.
    pub fn strict(capacity: usize) -> Self {
        Self {
            mode: DecodeMode::Strict,
            capacity,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == DecodeMode::Strict
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::lenient(DEFAULT_CAPACITY)
    }
}

/// What one session did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Symbols transmitted or received
    pub symbols: usize,
    /// Symbols that were sent as NYT + literal
    pub escapes: usize,
    /// Bitstream length in bits, prefix excluded
    pub bits: usize,
    /// Bytes handed to the session
    pub input_bytes: usize,
    /// Bytes produced by the session
    pub output_bytes: usize,
    /// A lenient clamp, truncation or zero-fill took place
    pub degraded: bool,
}

/// Output of a session together with its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coded {
    pub bytes: Vec<u8>,
    pub stats: SessionStats,
}

/// Compress `payload` with a fresh model; output is cut at `capacity`
/// bytes.
///
/// # Errors
/// `SessionError::PayloadTooLarge` above [`MAX_PAYLOAD`] bytes, and
/// `SessionError::OutputOverflow` if `capacity` cannot hold the prefix.
pub fn compress(payload: &[u8], capacity: usize) -> Result<Vec<u8>> {
    compress_with(payload, &SessionConfig::lenient(capacity)).map(|coded| coded.bytes)
}

/// Decompress `compressed` with a fresh model, producing at most
/// `capacity` bytes.
///
/// Lenient: damaged input degrades rather than failing.
pub fn decompress(compressed: &[u8], capacity: usize) -> Result<Vec<u8>> {
    decompress_with(compressed, &SessionConfig::lenient(capacity)).map(|coded| coded.bytes)
}

/// [`compress`] with explicit settings and statistics.
pub fn compress_with(payload: &[u8], config: &SessionConfig) -> Result<Coded> {
    encode(&mut AdaptiveModel::new(), payload, config)
}

/// [`decompress`] with explicit settings and statistics.
pub fn decompress_with(compressed: &[u8], config: &SessionConfig) -> Result<Coded> {
    decode(&mut AdaptiveModel::new(), compressed, config)
}

/// Drive `payload` through `model`, which is left holding the statistics
/// of everything observed.
pub(crate) fn encode(
    model: &mut AdaptiveModel,
    payload: &[u8],
    config: &SessionConfig,
) -> Result<Coded> {
    if payload.len() > MAX_PAYLOAD {
        return Err(SessionError::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD,
        }
        .into());
    }
    if config.capacity < LENGTH_PREFIX_BYTES {
        return Err(SessionError::OutputOverflow {
            capacity: config.capacity,
        }
        .into());
    }

    // No code is longer than 64 bits for any weight a u32 can hold, so nine
    // bytes per symbol cover code plus literal.
    let working = config
        .capacity
        .min(LENGTH_PREFIX_BYTES + payload.len() * 9 + 1);
    let mut out = vec![0u8; working];
    out[..LENGTH_PREFIX_BYTES].copy_from_slice(&(payload.len() as u16).to_be_bytes());

    let max_bits = config.capacity * 8;
    let mut stats = SessionStats {
        input_bytes: payload.len(),
        ..SessionStats::default()
    };
    let mut writer = BitWriter::at(&mut out, LENGTH_PREFIX_BYTES * 8);
    for &byte in payload {
        if !model.is_seen(byte) {
            stats.escapes += 1;
        }
        transmit(model, byte, &mut writer, max_bits);
        model.observe(byte)?;
        stats.symbols += 1;
    }

    let truncated = writer.overflowed();
    stats.bits = writer.position() - LENGTH_PREFIX_BYTES * 8;
    let len = writer.byte_len();
    out.truncate(len);
    stats.output_bytes = len;

    if truncated {
        if config.is_strict() {
            return Err(SessionError::OutputOverflow {
                capacity: config.capacity,
            }
            .into());
        }
        log::warn!(
            "compressed output truncated at {} bytes ({} symbols)",
            config.capacity,
            payload.len()
        );
        stats.degraded = true;
    }

    log::debug!(
        "compressed {} bytes into {} ({} escapes, {} bits)",
        stats.input_bytes,
        stats.output_bytes,
        stats.escapes,
        stats.bits
    );
    Ok(Coded { bytes: out, stats })
}

/// Decode `compressed` through `model`, mirroring [`encode`].
pub(crate) fn decode(
    model: &mut AdaptiveModel,
    compressed: &[u8],
    config: &SessionConfig,
) -> Result<Coded> {
    let mut stats = SessionStats {
        input_bytes: compressed.len(),
        ..SessionStats::default()
    };
    if compressed.len() < LENGTH_PREFIX_BYTES {
        if config.is_strict() {
            return Err(SessionError::MissingLengthPrefix {
                len: compressed.len(),
            }
            .into());
        }
        log::warn!("compressed input of {} bytes has no length prefix", compressed.len());
        stats.degraded = !compressed.is_empty();
        return Ok(Coded {
            bytes: Vec::new(),
            stats,
        });
    }

    let declared = u16::from_be_bytes([compressed[0], compressed[1]]) as usize;
    let count = if declared > config.capacity {
        if config.is_strict() {
            return Err(SessionError::DeclaredLengthExceedsCapacity {
                declared,
                capacity: config.capacity,
            }
            .into());
        }
        log::warn!(
            "declared length {} clamped to capacity {}",
            declared,
            config.capacity
        );
        stats.degraded = true;
        config.capacity
    } else {
        declared
    };

    let max_bits = compressed.len() * 8;
    let mut reader = BitReader::at(compressed, LENGTH_PREFIX_BYTES * 8);
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let byte = match receive(model, &mut reader, max_bits) {
            Ok(byte) => byte,
            Err(err) => {
                if config.is_strict() {
                    return Err(SessionError::Truncated {
                        decoded: out.len(),
                        declared: count,
                    }
                    .into());
                }
                log::warn!(
                    "{}; zero-filling {} of {} symbols",
                    err,
                    count - out.len(),
                    count
                );
                stats.degraded = true;
                out.resize(count, 0);
                break;
            }
        };
        if !model.is_seen(byte) {
            stats.escapes += 1;
        }
        model.observe(byte)?;
        out.push(byte);
        stats.symbols += 1;
    }

    stats.bits = reader.position() - LENGTH_PREFIX_BYTES * 8;
    stats.output_bytes = out.len();
    log::debug!(
        "decompressed {} bytes into {} ({} escapes)",
        stats.input_bytes,
        stats.output_bytes,
        stats.escapes
    );
    Ok(Coded { bytes: out, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_single_byte_vector() {
        let out = compress(&[0x41], DEFAULT_CAPACITY).unwrap();
        assert_eq!(out, vec![0x00, 0x01, 0x82]);
        assert_eq!(decompress(&out, DEFAULT_CAPACITY).unwrap(), vec![0x41]);
    }

    #[test]
    fn test_repeated_byte_vector() {
        let out = compress(&[0x41; 3], DEFAULT_CAPACITY).unwrap();
        assert_eq!(out, vec![0x00, 0x03, 0x82, 0x03]);
        assert_eq!(decompress(&out, DEFAULT_CAPACITY).unwrap(), vec![0x41; 3]);
    }

    #[test]
    fn test_empty_payload() {
        let out = compress(&[], DEFAULT_CAPACITY).unwrap();
        assert_eq!(out, vec![0x00, 0x00]);
        assert!(decompress(&out, DEFAULT_CAPACITY).unwrap().is_empty());
    }

    #[test]
    fn test_known_streams() {
        let cases: [(&[u8], &[u8]); 2] = [
            (b"ABAB", &[0x00, 0x04, 0x82, 0x84, 0x0a]),
            (
                b"abracadabra",
                &[0x00, 0x0b, 0x86, 0x8c, 0x70, 0x12, 0x63, 0x63, 0x62, 0x03],
            ),
        ];
        for (plain, packed) in cases {
            assert_eq!(compress(plain, DEFAULT_CAPACITY).unwrap(), packed);
            assert_eq!(decompress(packed, DEFAULT_CAPACITY).unwrap(), plain);
        }
    }

    #[test]
    fn test_stats() {
        let coded = compress_with(b"aab", &SessionConfig::default()).unwrap();
        assert_eq!(coded.stats.symbols, 3);
        assert_eq!(coded.stats.escapes, 2);
        assert_eq!(coded.stats.output_bytes, coded.bytes.len());
        assert!(!coded.stats.degraded);

        let decoded = decompress_with(&coded.bytes, &SessionConfig::default()).unwrap();
        assert_eq!(decoded.stats.escapes, 2);
        assert_eq!(decoded.stats.bits, coded.stats.bits);
    }

    #[test]
    fn test_payload_too_large() {
        let big = vec![0u8; MAX_PAYLOAD + 1];
        let err = compress(&big, DEFAULT_CAPACITY).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_declared_length_is_clamped() {
        let out = compress(b"abcdef", DEFAULT_CAPACITY).unwrap();
        let decoded = decompress_with(&out, &SessionConfig::lenient(4)).unwrap();
        assert_eq!(decoded.bytes, b"abcd");
        assert!(decoded.stats.degraded);

        let err = decompress_with(&out, &SessionConfig::strict(4)).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::DeclaredLengthExceedsCapacity {
                declared: 6,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_truncated_stream_zero_fills() {
        let out = compress(b"hello", DEFAULT_CAPACITY).unwrap();
        // keep the prefix and the first literal only
        let cut = &out[..3];
        let decoded = decompress(cut, DEFAULT_CAPACITY).unwrap();
        assert_eq!(decoded, vec![b'h', 0, 0, 0, 0]);

        let err = decompress_with(cut, &SessionConfig::strict(DEFAULT_CAPACITY)).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::Truncated {
                decoded: 1,
                declared: 5
            })
        ));
    }

    #[test]
    fn test_missing_prefix() {
        assert!(decompress(&[0x00], DEFAULT_CAPACITY).unwrap().is_empty());
        assert!(decompress(&[], DEFAULT_CAPACITY).unwrap().is_empty());
        let err = decompress_with(&[0x00], &SessionConfig::strict(16)).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::MissingLengthPrefix { len: 1 })
        ));
    }

    #[test]
    fn test_output_capacity() {
        let payload = b"0123456789abcdef";
        let full = compress(payload, DEFAULT_CAPACITY).unwrap();

        let cut = compress_with(payload, &SessionConfig::lenient(8)).unwrap();
        assert_eq!(cut.bytes.len(), 8);
        assert_eq!(&cut.bytes[..7], &full[..7]);
        assert!(cut.stats.degraded);

        let err = compress_with(payload, &SessionConfig::strict(8)).unwrap_err();
        assert!(matches!(
            err,
            Error::Session(SessionError::OutputOverflow { capacity: 8 })
        ));

        assert!(compress(payload, 1).is_err());
    }

    #[test]
    fn test_max_payload_round_trip() {
        let payload: Vec<u8> = (0..MAX_PAYLOAD).map(|i| (i * 7 % 251) as u8).collect();
        let out = compress(&payload, DEFAULT_CAPACITY).unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xFF]);
        assert_eq!(decompress(&out, MAX_PAYLOAD).unwrap(), payload);
    }
}
