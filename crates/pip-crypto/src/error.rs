use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("truncated stream: {0}")]
    Truncated(&'static str),

    #[error("chunk size too large: {len} bytes exceeds {max} (potential DoS attack)")]
    ChunkTooLarge { len: u64, max: u64 },

    /// Wrong password, tampered ciphertext, and corruption all collapse here.
    #[error("decryption failed or invalid password")]
    Decryption,

    #[error("chunk encryption failed")]
    Encryption,

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
