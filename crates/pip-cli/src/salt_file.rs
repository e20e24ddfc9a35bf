//! Master salt persistence: one base64 line per archive

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use pip_core::{PipError, PipResult};
use pip_crypto::{generate_salt, Salt, SALT_SIZE};

/// Generate a new master salt and write it to `path`. Never overwrites.
pub fn create_salt_file(path: &Path) -> PipResult<Salt> {
    let salt = generate_salt()?;
    let mut file = File::create_new(path).map_err(|e| {
        PipError::Salt(format!("creating salt file {}: {e}", path.display()))
    })?;
    writeln!(file, "{}", STANDARD.encode(salt))?;
    file.sync_all()?;
    Ok(salt)
}

/// Read a master salt written by [`create_salt_file`].
pub fn read_salt_file(path: &Path) -> PipResult<Salt> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| PipError::Salt(format!("reading salt file {}: {e}", path.display())))?;
    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| PipError::Salt(format!("invalid base64 in {}: {e}", path.display())))?;
    Salt::try_from(bytes.as_slice()).map_err(|_| {
        PipError::Salt(format!(
            "salt in {} is {} bytes (expected {SALT_SIZE})",
            path.display(),
            bytes.len()
        ))
    })
}
