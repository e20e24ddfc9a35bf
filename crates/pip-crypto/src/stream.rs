//! Stream cipher engine: plaintext stream ⇄ framed AES-256-GCM chunk stream
//!
//! Encrypt: write a fresh file salt, then seal each 64 KiB plaintext window
//! under its own nonce and frame it, then write the terminator.
//!
//! Decrypt: read the file salt, then open frames in order until the
//! terminator. Memory use is one window plus one sealed chunk, independent of
//! stream length.

use std::io::{ErrorKind, Read, Write};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use secrecy::SecretString;
use tracing::{debug, trace, warn};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::frame::{read_frame, write_chunk, write_terminator, Frame};
use crate::kdf::{KdfParams, MasterKey};
use crate::keys::{derive_file_key, generate_salt, FileKey, Salt};
use crate::nonce::NonceSequence;
use crate::session::ArchiveSession;
use crate::{CHUNK_SIZE, MAX_CHUNK_LEN, SALT_SIZE};

/// Byte and chunk counts for one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Data chunks sealed or opened (terminator not counted)
    pub chunks: u64,
    /// Plaintext bytes read (encrypt) or written (decrypt)
    pub plaintext_bytes: u64,
    /// Ciphertext bytes written (encrypt) or consumed (decrypt), salt and framing included
    pub ciphertext_bytes: u64,
}

/// Encrypt one stream with a password and the archive's master salt.
///
/// Derives the master key on every call; use [`ArchiveSession`] to derive it
/// once for many streams. On error the sink holds partial output and must be
/// discarded.
pub fn encrypt_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    password: &SecretString,
    master_salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<StreamSummary> {
    ArchiveSession::open(password, master_salt, params)?.encrypt(reader, writer)
}

/// Decrypt one stream with a password and the archive's master salt.
///
/// Any error means the stream cannot be trusted, including plaintext already
/// written to the sink.
pub fn decrypt_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    password: &SecretString,
    master_salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<StreamSummary> {
    ArchiveSession::open(password, master_salt, params)?.decrypt(reader, writer)
}

fn stream_cipher(file_key: &FileKey) -> Aes256Gcm {
    Aes256Gcm::new(file_key.as_bytes().into())
}

pub(crate) fn seal_stream<R: Read, W: Write>(
    master: &MasterKey,
    mut reader: R,
    mut writer: W,
) -> CryptoResult<StreamSummary> {
    let file_salt = generate_salt()?;
    writer.write_all(&file_salt)?;

    let cipher = stream_cipher(&derive_file_key(master, &file_salt)?);
    let mut nonces = NonceSequence::new();
    let mut summary = StreamSummary {
        ciphertext_bytes: SALT_SIZE as u64,
        ..StreamSummary::default()
    };

    debug!("encrypting stream");

    let mut window = vec![0u8; CHUNK_SIZE];
    let result: CryptoResult<()> = loop {
        let n = match fill_window(&mut reader, &mut window) {
            Ok(n) => n,
            Err(e) => break Err(e),
        };
        if n == 0 {
            break Ok(());
        }

        let Some(nonce) = nonces.next() else {
            break Err(CryptoError::Encryption);
        };
        let sealed = match cipher.encrypt(Nonce::from_slice(&nonce), &window[..n]) {
            Ok(sealed) => sealed,
            Err(_) => break Err(CryptoError::Encryption),
        };
        match write_chunk(&mut writer, &sealed) {
            Ok(written) => summary.ciphertext_bytes += written,
            Err(e) => break Err(e.into()),
        }

        summary.chunks += 1;
        summary.plaintext_bytes += n as u64;
        trace!(chunk = summary.chunks - 1, len = sealed.len(), "sealed chunk");

        if n < CHUNK_SIZE {
            break Ok(());
        }
    };
    window.zeroize();
    result?;

    summary.ciphertext_bytes += write_terminator(&mut writer)?;
    writer.flush()?;

    debug_assert_eq!(summary.chunks, nonces.issued());
    debug!(
        chunks = summary.chunks,
        plaintext_bytes = summary.plaintext_bytes,
        ciphertext_bytes = summary.ciphertext_bytes,
        "stream encrypted"
    );
    Ok(summary)
}

pub(crate) fn open_stream<R: Read, W: Write>(
    master: &MasterKey,
    mut reader: R,
    mut writer: W,
) -> CryptoResult<StreamSummary> {
    let mut file_salt: Salt = [0u8; SALT_SIZE];
    reader.read_exact(&mut file_salt).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => CryptoError::Truncated("file salt header"),
        _ => CryptoError::Io(e),
    })?;

    let cipher = stream_cipher(&derive_file_key(master, &file_salt)?);
    let mut nonces = NonceSequence::new();
    let mut summary = StreamSummary {
        ciphertext_bytes: SALT_SIZE as u64,
        ..StreamSummary::default()
    };

    debug!("decrypting stream");

    loop {
        let sealed = match read_frame(&mut reader, MAX_CHUNK_LEN)? {
            Frame::Chunk(sealed) => sealed,
            Frame::Terminator => {
                summary.ciphertext_bytes += 4;
                break;
            }
            Frame::EndOfInput => {
                warn!(
                    chunks = summary.chunks,
                    "stream ended without terminator; accepting clean end of input"
                );
                break;
            }
        };

        let nonce = nonces.next().ok_or(CryptoError::Decryption)?;
        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| CryptoError::Decryption)?;

        let written = writer.write_all(&plaintext);
        let len = plaintext.len();
        plaintext.zeroize();
        written?;

        summary.chunks += 1;
        summary.plaintext_bytes += len as u64;
        summary.ciphertext_bytes += 4 + sealed.len() as u64;
        trace!(chunk = summary.chunks - 1, len, "opened chunk");
    }
    writer.flush()?;

    debug!(
        chunks = summary.chunks,
        plaintext_bytes = summary.plaintext_bytes,
        ciphertext_bytes = summary.ciphertext_bytes,
        "stream decrypted"
    );
    Ok(summary)
}

/// Read until `window` is full or the reader reports end of input.
///
/// Returns the number of bytes filled; less than `window.len()` only at end of
/// input, so window boundaries do not depend on how the reader splits reads.
fn fill_window<R: Read + ?Sized>(reader: &mut R, window: &mut [u8]) -> CryptoResult<usize> {
    let mut filled = 0;
    while filled < window.len() {
        match reader.read(&mut window[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
