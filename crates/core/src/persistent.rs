//! Long-lived encoder/decoder models shared across messages.
//!
//! A [`HuffmanPair`] keeps one model per direction. Each message sent
//! through [`HuffmanPair::compress`] teaches the compressor model, and the
//! peer's [`HuffmanPair::decompress`] teaches its decompressor model the
//! same lesson, so later messages are coded with everything seen so far.
//! Both ends must process the same messages in the same order.
//!
//! A session that degrades (lenient truncation, clamping or zero-fill) or
//! fails after touching the model leaves that side out of step with its
//! peer. The side is then refused with `SessionError::Desynchronized`
//! until [`HuffmanPair::reset`] is called on both ends.
//!
//! Models can also be primed from a shared frequency table and then used
//! to pack individual symbols into a caller-managed bitstream with
//! [`HuffmanPair::transmit_at`] / [`HuffmanPair::receive_at`].

use crate::arena::{Symbol, ALPHABET_SIZE};
use crate::bitio::{BitReader, BitWriter};
use crate::error::{DecodeError, Error, Result, SessionError};
use crate::message::{self, Message};
use crate::model::AdaptiveModel;
use crate::session::{self, Coded, SessionConfig};
use crate::walk;

/// Set up a persistent pair with default settings.
pub fn init_persistent() -> HuffmanPair {
    HuffmanPair::new(SessionConfig::default())
}

/// Compressor and decompressor models that outlive a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanPair {
    compressor: AdaptiveModel,
    decompressor: AdaptiveModel,
    config: SessionConfig,
    /// The compressor no longer matches the peer's decompressor
    compressor_out_of_step: bool,
    /// The decompressor no longer matches the peer's compressor
    decompressor_out_of_step: bool,
}

impl HuffmanPair {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            compressor: AdaptiveModel::new(),
            decompressor: AdaptiveModel::new(),
            config,
            compressor_out_of_step: false,
            decompressor_out_of_step: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Compress one message, advancing the compressor model.
    ///
    /// # Errors
    /// As [`session::compress_with`], plus `SessionError::Desynchronized`
    /// once an earlier message degraded the compressor.
    pub fn compress(&mut self, payload: &[u8]) -> Result<Coded> {
        ensure_in_step(self.compressor_out_of_step, "compressor")?;
        let before = self.compressor.total_weight();
        let result = session::encode(&mut self.compressor, payload, &self.config);
        self.compressor_out_of_step =
            out_of_step(result.as_ref().map(Some), before, &self.compressor);
        result
    }

    /// Decompress one message, advancing the decompressor model.
    ///
    /// # Errors
    /// As [`session::decompress_with`], plus `SessionError::Desynchronized`
    /// once an earlier message degraded the decompressor.
    pub fn decompress(&mut self, compressed: &[u8]) -> Result<Coded> {
        ensure_in_step(self.decompressor_out_of_step, "decompressor")?;
        let before = self.decompressor.total_weight();
        let result = session::decode(&mut self.decompressor, compressed, &self.config);
        self.decompressor_out_of_step =
            out_of_step(result.as_ref().map(Some), before, &self.decompressor);
        result
    }

    /// In-place variant of [`HuffmanPair::compress`].
    pub fn compress_message(
        &mut self,
        msg: &mut Message,
        offset: usize,
    ) -> Result<Option<Coded>> {
        ensure_in_step(self.compressor_out_of_step, "compressor")?;
        let before = self.compressor.total_weight();
        let result =
            message::compress_message_with(&mut self.compressor, msg, offset, &self.config);
        self.compressor_out_of_step =
            out_of_step(result.as_ref().map(Option::as_ref), before, &self.compressor);
        result
    }

    /// In-place variant of [`HuffmanPair::decompress`].
    pub fn decompress_message(
        &mut self,
        msg: &mut Message,
        offset: usize,
    ) -> Result<Option<Coded>> {
        ensure_in_step(self.decompressor_out_of_step, "decompressor")?;
        let before = self.decompressor.total_weight();
        let result =
            message::decompress_message_with(&mut self.decompressor, msg, offset, &self.config);
        self.decompressor_out_of_step =
            out_of_step(result.as_ref().map(Option::as_ref), before, &self.decompressor);
        result
    }

    /// Whether both models can still be trusted to match their peers.
    pub fn is_in_step(&self) -> bool {
        !self.compressor_out_of_step && !self.decompressor_out_of_step
    }

    /// Observe every byte `counts[b]` times, in byte order, on both models.
    pub fn prime(&mut self, counts: &[u32; ALPHABET_SIZE]) -> Result<()> {
        for (byte, &count) in counts.iter().enumerate() {
            for _ in 0..count {
                self.compressor.observe(byte as u8)?;
                self.decompressor.observe(byte as u8)?;
            }
        }
        log::debug!(
            "primed pair with {} observations of {} symbols",
            self.compressor.total_weight(),
            self.compressor.distinct_symbols()
        );
        Ok(())
    }

    /// Write the compressor's code for `symbol` at `*cursor`, without an
    /// escape and without updating the model. Returns `false` if the symbol
    /// has no leaf or the code was cut at `max_bits`.
    pub fn transmit_at(
        &self,
        symbol: Symbol,
        buf: &mut [u8],
        cursor: &mut usize,
        max_bits: usize,
    ) -> bool {
        let mut writer = BitWriter::at(buf, *cursor);
        let complete = walk::transmit_code(&self.compressor, symbol, &mut writer, max_bits);
        *cursor = writer.position();
        complete
    }

    /// Read one code at `*cursor` with the decompressor model, without
    /// updating it. NYT comes back as [`Symbol::Nyt`]. On failure the
    /// cursor is left where the walk started.
    pub fn receive_at(
        &self,
        buf: &[u8],
        cursor: &mut usize,
        max_bits: usize,
    ) -> std::result::Result<Symbol, DecodeError> {
        let mut reader = BitReader::at(buf, *cursor);
        let symbol = walk::receive_code(&self.decompressor, &mut reader, max_bits)?;
        *cursor = reader.position();
        Ok(symbol)
    }

    pub fn compressor(&self) -> &AdaptiveModel {
        &self.compressor
    }

    pub fn decompressor(&self) -> &AdaptiveModel {
        &self.decompressor
    }

    /// Forget everything both models have learned.
    pub fn reset(&mut self) {
        self.compressor.reset();
        self.decompressor.reset();
        self.compressor_out_of_step = false;
        self.decompressor_out_of_step = false;
    }
}

impl Default for HuffmanPair {
    fn default() -> Self {
        init_persistent()
    }
}

fn ensure_in_step(out_of_step: bool, side: &'static str) -> Result<()> {
    if out_of_step {
        return Err(SessionError::Desynchronized { side }.into());
    }
    Ok(())
}

/// A degraded session, or a failed one that had already observed symbols,
/// leaves `model` ahead of or behind its peer.
fn out_of_step(
    result: std::result::Result<Option<&Coded>, &Error>,
    weight_before: u32,
    model: &AdaptiveModel,
) -> bool {
    let diverged = match result {
        Ok(coded) => coded.is_some_and(|c| c.stats.degraded),
        Err(_) => model.total_weight() != weight_before,
    };
    if diverged {
        log::warn!("persistent model degraded; refusing further messages until reset");
    }
    diverged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_carry_across_messages() {
        let mut sender = init_persistent();
        let mut receiver = init_persistent();
        let message = b"status: ok; players: 12; map: fueldump";

        let first = sender.compress(message).unwrap();
        let second = sender.compress(message).unwrap();
        // the second copy needs no escapes and shorter codes
        assert_eq!(second.stats.escapes, 0);
        assert!(second.bytes.len() < first.bytes.len());

        assert_eq!(receiver.decompress(&first.bytes).unwrap().bytes, message);
        assert_eq!(receiver.decompress(&second.bytes).unwrap().bytes, message);
        assert_eq!(sender.compressor(), receiver.decompressor());
    }

    #[test]
    fn test_fresh_session_ignores_history() {
        let mut pair = init_persistent();
        let warm = pair.compress(b"abcabc").unwrap();
        let warm_again = pair.compress(b"abcabc").unwrap();
        let cold = session::compress(b"abcabc", session::DEFAULT_CAPACITY).unwrap();
        assert_eq!(warm.bytes, cold);
        assert_ne!(warm_again.bytes, cold);
    }

    #[test]
    fn test_prime_and_offset_codes() {
        let mut counts = [0u32; ALPHABET_SIZE];
        counts[b'a' as usize] = 10;
        counts[b'b' as usize] = 3;
        counts[b'c' as usize] = 1;

        let mut pair = init_persistent();
        pair.prime(&counts).unwrap();
        assert_eq!(pair.compressor().total_weight(), 14);
        assert_eq!(pair.compressor(), pair.decompressor());

        let mut buf = [0u8; 8];
        let mut cursor = 3;
        for &b in b"abcab" {
            assert!(pair.transmit_at(Symbol::Byte(b), &mut buf, &mut cursor, 64));
        }
        assert!(pair.transmit_at(Symbol::Nyt, &mut buf, &mut cursor, 64));
        assert!(!pair.transmit_at(Symbol::Byte(b'z'), &mut buf, &mut cursor, 64));
        let end = cursor;

        let mut cursor = 3;
        for &b in b"abcab" {
            assert_eq!(pair.receive_at(&buf, &mut cursor, end), Ok(Symbol::Byte(b)));
        }
        assert_eq!(pair.receive_at(&buf, &mut cursor, end), Ok(Symbol::Nyt));
        assert_eq!(cursor, end);
        assert!(pair.receive_at(&buf, &mut cursor, end).is_err());
        assert_eq!(cursor, end);
    }

    #[test]
    fn test_in_place_pair() {
        let mut sender = init_persistent();
        let mut receiver = init_persistent();
        for round in 0..3u8 {
            let body = [b'x', b'y', round, b'x', b'y'];
            let mut msg = Message::from_bytes(&[0xEE], 64).unwrap();
            msg.write(&body).unwrap();

            sender.compress_message(&mut msg, 1).unwrap();
            receiver.decompress_message(&mut msg, 1).unwrap();
            assert_eq!(&msg.as_bytes()[1..], &body);
        }
    }

    #[test]
    fn test_degraded_session_stops_the_pair() {
        let mut sender = HuffmanPair::new(SessionConfig::lenient(8));
        let mut receiver = HuffmanPair::new(SessionConfig::lenient(64));

        let cut = sender.compress(b"abcdefghij").unwrap();
        assert!(cut.stats.degraded);
        assert!(!sender.is_in_step());
        let filled = receiver.decompress(&cut.bytes).unwrap();
        assert!(filled.stats.degraded);
        assert!(!receiver.is_in_step());

        // later messages would decode to garbage; both sides refuse them
        assert!(matches!(
            sender.compress(b"jihg"),
            Err(Error::Session(SessionError::Desynchronized { side: "compressor" }))
        ));
        assert!(matches!(
            receiver.decompress(&cut.bytes),
            Err(Error::Session(SessionError::Desynchronized { side: "decompressor" }))
        ));

        sender.reset();
        receiver.reset();
        let packed = sender.compress(b"jihg").unwrap();
        assert_eq!(receiver.decompress(&packed.bytes).unwrap().bytes, b"jihg");
        assert!(sender.is_in_step() && receiver.is_in_step());
    }

    #[test]
    fn test_degraded_message_stops_the_pair() {
        let mut sender = init_persistent();
        // eight escapes cannot fit back into eight bytes
        let mut msg = Message::from_bytes(b"abcdefgh", 8).unwrap();
        let coded = sender.compress_message(&mut msg, 0).unwrap().unwrap();
        assert!(coded.stats.degraded);
        assert!(sender.compress_message(&mut msg, 0).is_err());
    }

    #[test]
    fn test_strict_failure_after_observing_stops_the_pair() {
        let mut pair = HuffmanPair::new(SessionConfig::strict(4));
        assert!(pair.compress(b"abcdefgh").is_err());
        assert!(!pair.is_in_step());
        assert!(matches!(
            pair.compress(b"a"),
            Err(Error::Session(SessionError::Desynchronized { .. }))
        ));
    }

    #[test]
    fn test_rejected_payload_keeps_the_pair() {
        let mut pair = init_persistent();
        let oversized = vec![0u8; session::MAX_PAYLOAD + 1];
        assert!(pair.compress(&oversized).is_err());
        assert!(pair.is_in_step());
        assert!(pair.compress(b"still fine").is_ok());
    }

    #[test]
    fn test_reset() {
        let mut pair = init_persistent();
        pair.compress(b"data").unwrap();
        pair.reset();
        assert_eq!(pair, HuffmanPair::default());
    }
}
