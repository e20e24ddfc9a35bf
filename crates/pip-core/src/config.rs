use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipError, PipResult};

/// Top-level configuration (loaded from pip.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    pub crypto: CryptoConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Key derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB)
    pub argon2_mem_cost_kib: u32,
    /// Argon2id time cost (iterations, default: 3)
    pub argon2_time_cost: u32,
    /// Argon2id parallelism (default: 4)
    pub argon2_parallelism: u32,
    /// File holding the base64 master salt for this archive
    pub master_salt_file: Option<PathBuf>,
}

impl CryptoConfig {
    pub fn kdf_params(&self) -> pip_crypto::KdfParams {
        pip_crypto::KdfParams {
            mem_cost_kib: self.argon2_mem_cost_kib,
            time_cost: self.argon2_time_cost,
            parallelism: self.argon2_parallelism,
        }
    }
}

impl Default for CryptoConfig {
    fn default() -> Self {
        let params = pip_crypto::KdfParams::default();
        Self {
            argon2_mem_cost_kib: params.mem_cost_kib,
            argon2_time_cost: params.time_cost,
            argon2_parallelism: params.parallelism,
            master_salt_file: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (default: info), overridden by RUST_LOG
    pub level: String,
    /// Log format: "text" or "json"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Extension given to encrypted files (default: pip)
    pub extension: String,
    /// Show a progress bar while processing (default: true)
    pub progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            extension: "pip".into(),
            progress: true,
        }
    }
}

/// Load configuration from `path`.
///
/// Returns `Ok(None)` when the file does not exist so the caller can fall
/// back to defaults once logging is up.
pub fn load_config(path: &Path) -> PipResult<Option<PipConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| PipError::Config(format!("reading config {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| PipError::Config(format!("parsing config {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[crypto]
argon2_mem_cost_kib = 131072
argon2_time_cost = 4
argon2_parallelism = 8
master_salt_file = "/var/lib/pip/archive.salt"

[logging]
level = "debug"
format = "json"

[output]
extension = "enc"
progress = false
"#;
        let config: PipConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.crypto.argon2_mem_cost_kib, 131072);
        assert_eq!(config.crypto.argon2_time_cost, 4);
        assert_eq!(config.crypto.argon2_parallelism, 8);
        assert_eq!(
            config.crypto.master_salt_file,
            Some(PathBuf::from("/var/lib/pip/archive.salt"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.output.extension, "enc");
        assert!(!config.output.progress);
    }

    #[test]
    fn test_parse_defaults() {
        let config: PipConfig = toml::from_str("").unwrap();

        assert_eq!(config.crypto.kdf_params(), pip_crypto::KdfParams::default());
        assert_eq!(config.crypto.master_salt_file, None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.output.extension, "pip");
        assert!(config.output.progress);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[crypto]
argon2_time_cost = 1
"#;
        let config: PipConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.crypto.argon2_time_cost, 1);
        // Defaults
        assert_eq!(config.crypto.argon2_mem_cost_kib, 65536);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_params_drive_master_key() {
        let toml_str = r#"
[crypto]
argon2_mem_cost_kib = 1024
argon2_time_cost = 1
argon2_parallelism = 1
"#;
        let config: PipConfig = toml::from_str(toml_str).unwrap();
        let params = config.crypto.kdf_params();
        let password = secrecy::SecretString::from("from config");
        let salt = [3u8; 16];

        let a = pip_crypto::derive_master_key(&password, &salt, &params).unwrap();
        let b = pip_crypto::derive_master_key(&password, &salt, &params).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());

        let mut tuned = config.crypto.clone();
        tuned.argon2_time_cost = 2;
        let c = pip_crypto::derive_master_key(&password, &salt, &tuned.kdf_params()).unwrap();
        assert_ne!(a.as_bytes(), c.as_bytes(), "config cost params are part of the key");
    }

    #[test]
    fn test_reject_unknown_log_format() {
        let result: Result<PipConfig, _> = toml::from_str("[logging]\nformat = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load_config(&tmp.path().join("absent.toml")).unwrap().is_none());
    }

    #[test]
    fn test_load_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pip.toml");
        std::fs::write(&path, "[output]\nprogress = false\n").unwrap();

        let config = load_config(&path).unwrap().expect("file exists");
        assert!(!config.output.progress);
        assert_eq!(config.output.extension, "pip");
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("pip.toml");
        std::fs::write(&path, "[crypto\nbroken").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, PipError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = PipConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: PipConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.crypto.kdf_params(), parsed.crypto.kdf_params());
        assert_eq!(config.logging.format, parsed.logging.format);
        assert_eq!(config.output.extension, parsed.output.extension);
    }
}
