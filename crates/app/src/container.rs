//! File container for a sequence of compressed messages.
//!
//! ```text
//! +------------------+
//! | Magic (4 bytes)  |  "AHF1"
//! +------------------+
//! | len (4)          |  u32 little-endian, bytes in the next message
//! | message (len)    |  length prefix + adaptive Huffman bitstream
//! +------------------+
//! | ...              |  repeated until end of file
//! +------------------+
//! ```

use adaptive_huffman_core::{Error, Result};

const MAGIC: [u8; 4] = *b"AHF1";

/// Concatenate messages into a container.
pub fn write_frames<'a>(messages: impl IntoIterator<Item = &'a [u8]>) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    for msg in messages {
        out.extend_from_slice(&(msg.len() as u32).to_le_bytes());
        out.extend_from_slice(msg);
    }
    out
}

/// Split a container back into its messages.
///
/// # Errors
/// `Error::Config` on a bad magic number or a frame running past the end.
pub fn read_frames(bytes: &[u8]) -> Result<Vec<&[u8]>> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::Config("not an adhuff container".to_string()));
    }

    let mut frames = Vec::new();
    let mut pos = MAGIC.len();
    while pos < bytes.len() {
        let header = bytes
            .get(pos..pos + 4)
            .ok_or_else(|| Error::Config(format!("truncated frame header at byte {}", pos)))?;
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        pos += 4;
        let frame = bytes.get(pos..pos + len).ok_or_else(|| {
            Error::Config(format!(
                "frame of {} bytes at byte {} runs past end",
                len, pos
            ))
        })?;
        frames.push(frame);
        pos += len;
    }
    Ok(frames)
}
