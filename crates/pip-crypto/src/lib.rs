//! pip-crypto: streaming authenticated encryption for pip archives
//!
//! Architecture: fixed-window chunking, each window sealed independently with AES-256-GCM
//!
//! Key hierarchy:
//! ```text
//! Master Key (256-bit, Argon2id from password + per-archive master salt)
//!   └── File Key (per-stream, HKDF-SHA256 from master key + random 16-byte file salt)
//!       └── Chunk AEAD: AES-256-GCM (key=file_key, nonce=0^32 || chunk_index_be64, AAD=none)
//! ```
//!
//! Wire format of one stream (integers big-endian):
//! ```text
//! [file salt: 16 bytes]
//! { [chunk length: u32][ciphertext || tag: chunk length bytes] }*
//! [terminator: u32 = 0]
//! ```

pub mod error;
pub mod frame;
pub mod kdf;
pub mod keys;
pub mod nonce;
pub mod session;
pub mod stream;

pub use error::{CryptoError, CryptoResult};
pub use frame::{read_frame, write_chunk, write_terminator, Frame};
pub use kdf::{derive_master_key, KdfParams, MasterKey};
pub use keys::{derive_file_key, generate_salt, FileKey, Salt};
pub use nonce::chunk_nonce;
pub use session::ArchiveSession;
pub use stream::{decrypt_stream, encrypt_stream, StreamSummary};

/// Size of a master or file key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Size of master and file salts in bytes
pub const SALT_SIZE: usize = 16;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of an AES-GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Plaintext window sealed into one chunk (64 KiB)
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Slack allowed on top of `CHUNK_SIZE` for a declared chunk length
pub const CHUNK_LEN_ALLOWANCE: usize = 256;

/// Largest declared chunk length the decoder will accept
pub const MAX_CHUNK_LEN: usize = CHUNK_SIZE + CHUNK_LEN_ALLOWANCE;

const _: () = assert!(TAG_SIZE <= CHUNK_LEN_ALLOWANCE);
const _: () = assert!(MAX_CHUNK_LEN <= u32::MAX as usize);
