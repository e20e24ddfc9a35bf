//! Chunk framing on the wire
//!
//! ```text
//! chunk:      [u32 big-endian length L > 0][L bytes: ciphertext || tag]
//! terminator: [u32 big-endian 0]
//! ```
//!
//! The declared length is checked against the caller's ceiling before any
//! buffer of that size is allocated or any payload byte is read.

use std::io::{self, ErrorKind, Read, Write};

use crate::error::{CryptoError, CryptoResult};

const LEN_PREFIX_SIZE: usize = 4;

/// One decoded frame.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame {
    /// A sealed chunk payload (ciphertext || tag).
    Chunk(Vec<u8>),
    /// The explicit zero-length terminator.
    Terminator,
    /// Input ended cleanly where a length prefix was expected.
    EndOfInput,
}

/// Write one chunk: big-endian length prefix, then the payload.
///
/// Returns the number of bytes written. Empty payloads are refused since a
/// zero length would read back as the terminator.
pub fn write_chunk<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> io::Result<u64> {
    if payload.is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "empty chunk payload is indistinguishable from the terminator",
        ));
    }
    let len = u32::try_from(payload.len()).map_err(|_| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("chunk payload of {} bytes exceeds u32 length prefix", payload.len()),
        )
    })?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok((LEN_PREFIX_SIZE + payload.len()) as u64)
}

/// Write the end-of-stream terminator. Returns the number of bytes written.
pub fn write_terminator<W: Write + ?Sized>(writer: &mut W) -> io::Result<u64> {
    writer.write_all(&0u32.to_be_bytes())?;
    Ok(LEN_PREFIX_SIZE as u64)
}

/// Read the next frame, rejecting declared lengths above `max_len`.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R, max_len: usize) -> CryptoResult<Frame> {
    let mut prefix = [0u8; LEN_PREFIX_SIZE];
    let mut filled = 0;
    while filled < LEN_PREFIX_SIZE {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(Frame::EndOfInput),
            Ok(0) => return Err(CryptoError::Truncated("chunk length prefix")),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_be_bytes(prefix);
    if len == 0 {
        return Ok(Frame::Terminator);
    }
    if len as u64 > max_len as u64 {
        tracing::warn!(len, max = max_len, "rejecting oversized chunk");
        return Err(CryptoError::ChunkTooLarge {
            len: len as u64,
            max: max_len as u64,
        });
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => CryptoError::Truncated("chunk payload"),
        _ => CryptoError::Io(e),
    })?;
    Ok(Frame::Chunk(payload))
}
