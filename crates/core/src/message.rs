//! A fixed-capacity message buffer and in-place (de)compression.
//!
//! Network messages are often compressed only past a header: bytes
//! `[0, offset)` stay as they are and the region `[offset, cur_size)` is
//! replaced by its compressed (or decompressed) form. The destination for
//! that region is whatever room is left up to the message's maximum size.
//!
//! An empty region is left untouched in both directions.

use crate::error::{Error, Result, SessionError};
use crate::model::AdaptiveModel;
use crate::session::{self, Coded, SessionConfig};

/// A byte buffer with a current size and a hard maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    data: Vec<u8>,
    cur_size: usize,
}

impl Message {
    /// An empty message that can grow to `max_size` bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self {
            data: vec![0; max_size],
            cur_size: 0,
        }
    }

    /// A message holding `bytes`, with room up to `max_size`.
    ///
    /// # Errors
    /// `Error::Config` if `bytes` is longer than `max_size`.
    pub fn from_bytes(bytes: &[u8], max_size: usize) -> Result<Self> {
        let mut msg = Self::with_capacity(max_size);
        msg.write(bytes)?;
        Ok(msg)
    }

    /// Append `bytes`.
    ///
    /// # Errors
    /// `Error::Config` if the message would exceed its maximum size.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.cur_size + bytes.len();
        if end > self.data.len() {
            return Err(Error::Config(format!(
                "message overflow: {} bytes into {} of {} used",
                bytes.len(),
                self.cur_size,
                self.data.len()
            )));
        }
        self.data[self.cur_size..end].copy_from_slice(bytes);
        self.cur_size = end;
        Ok(())
    }

    pub fn cur_size(&self) -> usize {
        self.cur_size
    }

    pub fn max_size(&self) -> usize {
        self.data.len()
    }

    /// The used part of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.cur_size]
    }

    /// The whole buffer, used or not.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Set the used length, e.g. after filling [`Message::data_mut`].
    ///
    /// # Errors
    /// `Error::Config` past the maximum size.
    pub fn set_cur_size(&mut self, size: usize) -> Result<()> {
        if size > self.data.len() {
            return Err(Error::Config(format!(
                "size {} exceeds message capacity {}",
                size,
                self.data.len()
            )));
        }
        self.cur_size = size;
        Ok(())
    }

    /// Replace `[offset, ..)` with `bytes`, which must fit the capacity.
    fn splice(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.cur_size = offset + bytes.len();
    }

    fn region(&self, offset: usize) -> Result<Option<&[u8]>> {
        if offset > self.cur_size {
            return Err(SessionError::InvalidOffset {
                offset,
                size: self.cur_size,
            }
            .into());
        }
        if offset == self.cur_size {
            return Ok(None);
        }
        Ok(Some(&self.data[offset..self.cur_size]))
    }
}

/// Compress `msg[offset..]` in place with a fresh model.
pub fn compress_message(
    msg: &mut Message,
    offset: usize,
    config: &SessionConfig,
) -> Result<Option<Coded>> {
    compress_message_with(&mut AdaptiveModel::new(), msg, offset, config)
}

/// Decompress `msg[offset..]` in place with a fresh model.
pub fn decompress_message(
    msg: &mut Message,
    offset: usize,
    config: &SessionConfig,
) -> Result<Option<Coded>> {
    decompress_message_with(&mut AdaptiveModel::new(), msg, offset, config)
}

/// Compress through a caller-held model. The destination capacity is the
/// room left in the message; `config.capacity` is not consulted. Returns
/// `None` when the region is empty.
pub(crate) fn compress_message_with(
    model: &mut AdaptiveModel,
    msg: &mut Message,
    offset: usize,
    config: &SessionConfig,
) -> Result<Option<Coded>> {
    let bounded = SessionConfig {
        capacity: msg.max_size() - offset.min(msg.max_size()),
        ..*config
    };
    let Some(region) = msg.region(offset)? else {
        return Ok(None);
    };
    let coded = session::encode(model, region, &bounded)?;
    msg.splice(offset, &coded.bytes);
    Ok(Some(coded))
}

/// Decompress through a caller-held model; see [`compress_message_with`].
pub(crate) fn decompress_message_with(
    model: &mut AdaptiveModel,
    msg: &mut Message,
    offset: usize,
    config: &SessionConfig,
) -> Result<Option<Coded>> {
    let bounded = SessionConfig {
        capacity: msg.max_size() - offset.min(msg.max_size()),
        ..*config
    };
    let Some(region) = msg.region(offset)? else {
        return Ok(None);
    };
    let coded = session::decode(model, region, &bounded)?;
    msg.splice(offset, &coded.bytes);
    Ok(Some(coded))
}
