//! Error types for the adaptive Huffman codec.
//!
//! The codec itself is lenient: in its default mode a damaged stream is
//! degraded (clamped, zero-filled, truncated) rather than rejected. These
//! types cover the places where a caller asked for strictness, where the
//! input cannot be represented at all, or where the model's internal
//! bookkeeping is found inconsistent.

use thiserror::Error;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading/writing bits from/to byte buffers
/// - Model: arena exhaustion or a broken sibling-property invariant
/// - Decode: a symbol walk that could not reach a leaf
/// - Session: length prefix and capacity problems for a whole payload
/// - I/O: file system operations
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past end of buffer)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Adaptive model bookkeeping error
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Symbol-level decode failure
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Payload-level failure in strict mode, or an unrepresentable payload
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BitIoError {
    /// Attempted to read past the end of the buffer
    #[error("unexpected end of bit stream at bit {position}")]
    UnexpectedEof { position: usize },

    /// Attempted to write past the end of the buffer
    #[error("bit position {position} is outside a {capacity}-byte buffer")]
    OutOfSpace { position: usize, capacity: usize },

    /// Invalid bit count (e.g., more than 32 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Adaptive model errors.
///
/// A correctly driven model never produces these; they exist so that
/// invariant checks and arena exhaustion are reported instead of panicking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The node arena has no free slot left
    #[error("node arena exhausted (capacity {capacity})")]
    ArenaExhausted { capacity: usize },

    /// A sibling-property or linkage invariant does not hold
    #[error("invariant violated at node {node}: {reason}")]
    Invariant { node: usize, reason: &'static str },
}

/// Failures of a single receive walk.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The bit cursor reached the caller's limit before a leaf (or before
    /// the end of an escaped literal)
    #[error("bit stream exhausted at bit {position}")]
    Exhausted { position: usize },

    /// The walk stepped onto a missing child link
    #[error("illegal tree: missing child below node {node}")]
    IllegalTree { node: usize },
}

/// Payload-level errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The payload cannot be described by the 16-bit length prefix
    #[error("payload of {len} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge { len: usize, max: usize },

    /// Compressed input is too short to carry the length prefix
    #[error("compressed input of {len} bytes has no length prefix")]
    MissingLengthPrefix { len: usize },

    /// The declared length does not fit the destination (strict mode)
    #[error("declared length {declared} exceeds destination capacity {capacity}")]
    DeclaredLengthExceedsCapacity { declared: usize, capacity: usize },

    /// The stream ended before the declared symbol count (strict mode)
    #[error("stream truncated: decoded {decoded} of {declared} symbols")]
    Truncated { decoded: usize, declared: usize },

    /// The compressed output does not fit the destination (strict mode)
    #[error("compressed output exceeds destination capacity of {capacity} bytes")]
    OutputOverflow { capacity: usize },

    /// The in-place offset lies outside the message
    #[error("offset {offset} is beyond message size {size}")]
    InvalidOffset { offset: usize, size: usize },

    /// A persistent model degraded and no longer matches its peer
    #[error("{side} model degraded and is out of step with its peer; reset both ends")]
    Desynchronized { side: &'static str },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
