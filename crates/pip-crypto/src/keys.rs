//! Per-stream key separation: random file salts and HKDF file keys

use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::kdf::MasterKey;
use crate::{KEY_SIZE, SALT_SIZE};

/// A 16-byte master or file salt
pub type Salt = [u8; SALT_SIZE];

/// HKDF info string binding file keys to this stream format
const FILE_KEY_INFO: &[u8] = b"pip-stream-v1";

/// A per-stream 256-bit encryption key. Zeroized on drop.
#[derive(Clone)]
pub struct FileKey {
    bytes: [u8; KEY_SIZE],
}

impl FileKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for FileKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random salt from the OS entropy source.
///
/// Fails only if the OS RNG fails; callers must treat that as fatal.
pub fn generate_salt() -> CryptoResult<Salt> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;
    Ok(salt)
}

/// Derive the key for one stream from the master key and that stream's file salt.
///
/// HKDF-SHA256 with the file salt as HKDF salt. Cheap: only separates streams
/// sharing a master key, the password hardening already happened in Argon2id.
pub fn derive_file_key(master: &MasterKey, file_salt: &Salt) -> CryptoResult<FileKey> {
    let hkdf = Hkdf::<Sha256>::new(Some(file_salt.as_slice()), master.as_bytes());
    let mut okm = [0u8; KEY_SIZE];
    hkdf.expand(FILE_KEY_INFO, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expand failed: {e}")))?;
    let key = FileKey::from_bytes(okm);
    okm.zeroize();
    Ok(key)
}
