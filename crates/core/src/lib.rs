//! adaptive-huffman-core: one-pass adaptive Huffman compression
//!
//! Compresses byte payloads without transmitting a code table. Encoder and
//! decoder each grow an identical Huffman tree from the symbols seen so
//! far; a byte's first occurrence is announced with the NYT (Not Yet
//! Transmitted) escape followed by its raw 8 bits.
//!
//! # Architecture
//!
//! Leaves first:
//! - `bitio`: LSB-first bit reading/writing with explicit cursors
//! - `arena`: node storage and recyclable block-head cells
//! - `model`: the adaptive tree and its sibling-property maintenance
//! - `walk`: per-symbol transmit/receive over a model
//! - `session`: whole payloads with a 16-bit length prefix
//! - `message`: in-place (de)compression of a fixed-capacity buffer
//! - `persistent`: encoder/decoder models kept across messages
//! - `metrics`: counters for runs of sessions
//!
//! # Example
//! ```
//! use adaptive_huffman_core::{compress, decompress, DEFAULT_CAPACITY};
//!
//! let packed = compress(b"AAA", DEFAULT_CAPACITY).unwrap();
//! assert_eq!(packed, [0x00, 0x03, 0x82, 0x03]);
//! assert_eq!(decompress(&packed, DEFAULT_CAPACITY).unwrap(), b"AAA");
//! ```

pub mod arena;
pub mod bitio;
pub mod error;
pub mod message;
pub mod metrics;
pub mod model;
pub mod persistent;
pub mod session;
pub mod walk;

// Re-export commonly used types
pub use arena::Symbol;
pub use error::{Error, Result};
pub use message::{compress_message, decompress_message, Message};
pub use model::AdaptiveModel;
pub use persistent::{init_persistent, HuffmanPair};
pub use session::{
    compress, compress_with, decompress, decompress_with, Coded, DecodeMode, SessionConfig,
    SessionStats, DEFAULT_CAPACITY, MAX_PAYLOAD,
};
