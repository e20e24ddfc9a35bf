//! Key derivation: Argon2id password → archive master key

use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::Salt;
use crate::KEY_SIZE;

/// A 256-bit archive master key derived from a password via Argon2id.
///
/// Derived once per archive and held only in memory. Zeroized on drop.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub mem_cost_kib: u32,
    /// Time cost / iterations (default: 3)
    pub time_cost: u32,
    /// Parallelism (default: 4)
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            mem_cost_kib: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

/// Derive the archive master key from a password and the master salt.
///
/// Deliberately expensive. The master salt is not secret and is stored
/// alongside the archive.
pub fn derive_master_key(
    password: &SecretString,
    master_salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<MasterKey> {
    let argon2_params = Params::new(
        params.mem_cost_kib,
        params.time_cost,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(format!("invalid Argon2id params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password.expose_secret().as_bytes(), master_salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(format!("Argon2id KDF failed: {e}")))?;

    let master = MasterKey::from_bytes(key);
    key.zeroize();
    Ok(master)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_file_key;
    use crate::session::ArchiveSession;

    fn fast_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_default_params_are_archive_strength() {
        let params = KdfParams::default();
        assert_eq!(params.mem_cost_kib, 64 * 1024);
        assert_eq!(params.time_cost, 3);
        assert_eq!(params.parallelism, 4);
    }

    #[test]
    fn test_cost_params_bind_the_key() {
        let password = SecretString::from("archive password");
        let salt = [4u8; 16];
        let slower = KdfParams {
            time_cost: 2,
            ..fast_params()
        };

        let a = derive_master_key(&password, &salt, &fast_params()).unwrap();
        let b = derive_master_key(&password, &salt, &slower).unwrap();

        assert_ne!(
            a.as_bytes(),
            b.as_bytes(),
            "an archive must be opened with the params it was sealed with"
        );
    }

    #[test]
    fn test_rederived_master_key_opens_session_stream() {
        let password = SecretString::from("archive password");
        let master_salt = [6u8; 16];

        let session = ArchiveSession::open(&password, &master_salt, &fast_params()).unwrap();
        let mut sealed = Vec::new();
        session.encrypt(&b"archived member"[..], &mut sealed).unwrap();

        let master = derive_master_key(&password, &master_salt, &fast_params()).unwrap();
        let mut opened = Vec::new();
        ArchiveSession::from_master_key(master)
            .decrypt(sealed.as_slice(), &mut opened)
            .unwrap();
        assert_eq!(opened, b"archived member");
    }

    #[test]
    fn test_password_separates_file_keys() {
        let master_salt = [6u8; 16];
        let file_salt = [9u8; 16];

        let m1 = derive_master_key(&SecretString::from("alpha"), &master_salt, &fast_params())
            .unwrap();
        let m2 = derive_master_key(&SecretString::from("bravo"), &master_salt, &fast_params())
            .unwrap();

        let k1 = derive_file_key(&m1, &file_salt).unwrap();
        let k2 = derive_file_key(&m2, &file_salt).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_kdf_rejects_invalid_params() {
        let params = KdfParams {
            mem_cost_kib: 1,
            time_cost: 0,
            parallelism: 1,
        };
        let result = derive_master_key(&SecretString::from("pw"), &[0u8; 16], &params);
        assert!(matches!(result, Err(CryptoError::KeyDerivation(_))));
    }

    #[test]
    fn test_master_key_debug_redacted() {
        let key = MasterKey::from_bytes([7u8; KEY_SIZE]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains('7'));
    }
}
