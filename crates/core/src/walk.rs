//! Symbol-level encode and decode over an [`AdaptiveModel`].
//!
//! A symbol's code is the path from the root to its leaf, `1` for a right
//! branch and `0` for a left one, sent root first. A byte without a leaf
//! is sent as the NYT code followed by its 8-bit value, MSB first.
//!
//! None of these functions update the model; the caller follows every
//! transmit or receive with [`AdaptiveModel::observe`] (or deliberately
//! does not, for a primed, frozen model).
//!
//! Decoding is a descent: starting at the root, each internal node consumes
//! one bit and steps to a child until a leaf is reached. A leaf ends the
//! walk with its byte; the NYT leaf ends it with an escape, after which the
//! literal follows.

use crate::arena::{NodeId, Payload, Symbol, ALPHABET_SIZE};
use crate::bitio::{BitReader, BitWriter};
use crate::error::DecodeError;
use crate::model::AdaptiveModel;

/// Width of an escaped literal.
pub const LITERAL_BITS: usize = 8;

/// Send `byte`, escaping it through NYT if the model has not seen it.
///
/// Writing stops once the writer reaches `max_bits`; the result is `false`
/// if any bit was dropped.
pub fn transmit(
    model: &AdaptiveModel,
    byte: u8,
    writer: &mut BitWriter<'_>,
    max_bits: usize,
) -> bool {
    match model.leaf(Symbol::Byte(byte)) {
        Some(leaf) => emit_path(model, leaf, writer, max_bits),
        None => {
            let escaped = emit_path(model, model.nyt(), writer, max_bits);
            let literal = (0..LITERAL_BITS)
                .rev()
                .all(|i| writer.put_bit_bounded((byte >> i) & 1 == 1, max_bits));
            escaped && literal
        }
    }
}

/// Send only the tree code of `symbol`, with no escape.
///
/// Returns `false` when the symbol has no leaf (nothing is written) or the
/// output was cut at `max_bits`.
pub fn transmit_code(
    model: &AdaptiveModel,
    symbol: Symbol,
    writer: &mut BitWriter<'_>,
    max_bits: usize,
) -> bool {
    match model.leaf(symbol) {
        Some(leaf) => emit_path(model, leaf, writer, max_bits),
        None => false,
    }
}

fn emit_path(
    model: &AdaptiveModel,
    leaf: NodeId,
    writer: &mut BitWriter<'_>,
    max_bits: usize,
) -> bool {
    // 257 leaves bound the depth at 256.
    let mut path = [false; ALPHABET_SIZE + 1];
    let mut depth = 0;
    let mut node = leaf;
    while let Some(parent) = model.node(node).parent {
        path[depth] = model.node(parent).right == Some(node);
        depth += 1;
        node = parent;
    }
    path[..depth]
        .iter()
        .rev()
        .all(|&bit| writer.put_bit_bounded(bit, max_bits))
}

/// Decode one byte, reading the literal after an NYT escape.
///
/// # Errors
/// - `DecodeError::Exhausted` if the reader reaches `max_bits` (or the end
///   of its data) first
/// - `DecodeError::IllegalTree` if the descent meets a missing child
pub fn receive(
    model: &AdaptiveModel,
    reader: &mut BitReader<'_>,
    max_bits: usize,
) -> Result<u8, DecodeError> {
    match receive_code(model, reader, max_bits)? {
        Symbol::Byte(byte) => Ok(byte),
        Symbol::Nyt => {
            let mut byte = 0u8;
            for _ in 0..LITERAL_BITS {
                byte = (byte << 1) | read_bit(reader, max_bits)? as u8;
            }
            Ok(byte)
        }
    }
}

/// Descend from the root to a leaf and return its symbol, reporting NYT
/// as [`Symbol::Nyt`] without reading a literal.
///
/// # Errors
/// As [`receive`].
pub fn receive_code(
    model: &AdaptiveModel,
    reader: &mut BitReader<'_>,
    max_bits: usize,
) -> Result<Symbol, DecodeError> {
    let mut id = model.root();
    loop {
        let node = model.node(id);
        match node.payload {
            Payload::Leaf(symbol) => return Ok(symbol),
            Payload::Internal => {
                let child = if read_bit(reader, max_bits)? {
                    node.right
                } else {
                    node.left
                };
                id = child.ok_or(DecodeError::IllegalTree { node: id.index() })?;
            }
        }
    }
}

fn read_bit(reader: &mut BitReader<'_>, max_bits: usize) -> Result<bool, DecodeError> {
    let position = reader.position();
    if position >= max_bits {
        return Err(DecodeError::Exhausted { position });
    }
    reader
        .get_bit()
        .map_err(|_| DecodeError::Exhausted { position })
}
