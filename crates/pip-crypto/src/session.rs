//! Archive session: one master key derivation shared by many streams

use std::io::{Read, Write};

use secrecy::SecretString;

use crate::error::CryptoResult;
use crate::kdf::{derive_master_key, KdfParams, MasterKey};
use crate::keys::Salt;
use crate::stream::{open_stream, seal_stream, StreamSummary};

/// Holds the derived master key for one archive.
///
/// Argon2id runs once in [`ArchiveSession::open`]; every stream processed
/// afterwards only pays for a fresh file salt and an HKDF expansion. Each
/// call owns its own cipher and chunk counter, so a session can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct ArchiveSession {
    master: MasterKey,
}

impl ArchiveSession {
    /// Derive the master key from `password` and the archive's master salt.
    pub fn open(
        password: &SecretString,
        master_salt: &Salt,
        params: &KdfParams,
    ) -> CryptoResult<Self> {
        let master = derive_master_key(password, master_salt, params)?;
        tracing::debug!(
            mem_cost_kib = params.mem_cost_kib,
            time_cost = params.time_cost,
            "derived archive master key"
        );
        Ok(Self { master })
    }

    /// Use an already derived master key.
    pub fn from_master_key(master: MasterKey) -> Self {
        Self { master }
    }

    /// Encrypt one stream under a fresh file salt.
    pub fn encrypt<R: Read, W: Write>(&self, reader: R, writer: W) -> CryptoResult<StreamSummary> {
        seal_stream(&self.master, reader, writer)
    }

    /// Decrypt one stream produced by [`ArchiveSession::encrypt`] under the same master key.
    pub fn decrypt<R: Read, W: Write>(&self, reader: R, writer: W) -> CryptoResult<StreamSummary> {
        open_stream(&self.master, reader, writer)
    }
}
