//! pip: encrypt and decrypt files into the pip streaming format
//!
//! Commands:
//!   salt <path>                 - generate a master salt file for a new archive
//!   encrypt <input> [-o out]    - encrypt a file to <input>.pip
//!   decrypt <input> [-o out]    - decrypt a .pip file
//!
//! The password is taken from PIP_PASSWORD or prompted on the terminal.

mod checksum;
mod paths;
mod salt_file;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use pip_core::config::{LogFormat, PipConfig};
use pip_crypto::{ArchiveSession, Salt, StreamSummary};

use checksum::{HashingReader, HashingWriter};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pip",
    version,
    about = "Streaming authenticated encryption for archives",
    long_about = "pip: encrypt and decrypt arbitrarily large files in 64 KiB AES-256-GCM chunks"
)]
struct Cli {
    /// Path to pip.toml configuration file
    #[arg(long, short = 'c', env = "PIP_CONFIG", default_value = "~/.config/pip/pip.toml")]
    config: PathBuf,

    /// Log level (overrides config; RUST_LOG takes precedence over both)
    #[arg(long, env = "PIP_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new master salt file for an archive
    Salt {
        /// Where to write the salt (refuses to overwrite)
        path: PathBuf,
    },

    /// Encrypt a file
    Encrypt {
        /// Plaintext input file
        input: PathBuf,
        /// Output path (default: <input>.pip; the extension is appended if missing)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Master salt file (overrides config)
        #[arg(long, short = 's', env = "PIP_SALT_FILE")]
        salt_file: Option<PathBuf>,
        /// Overwrite the output if it exists
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Decrypt a file
    Decrypt {
        /// Encrypted input file
        input: PathBuf,
        /// Output path (default: input without .pip)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Master salt file (overrides config)
        #[arg(long, short = 's', env = "PIP_SALT_FILE")]
        salt_file: Option<PathBuf>,
        /// Overwrite the output if it exists
        #[arg(long, short = 'f')]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = expand_tilde(&cli.config);
    let loaded = pip_core::load_config(&config_path)?;
    let config_missing = loaded.is_none();
    let config = loaded.unwrap_or_default();
    let level = cli.log.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, config.logging.format);

    if config_missing {
        tracing::warn!(
            "config file not found: {}  (using defaults)",
            config_path.display()
        );
    }

    match cli.command {
        Commands::Salt { path } => cmd_salt(&path),
        Commands::Encrypt {
            input,
            output,
            salt_file,
            force,
        } => cmd_encrypt(&config, &input, output.as_deref(), salt_file.as_deref(), force),
        Commands::Decrypt {
            input,
            output,
            salt_file,
            force,
        } => cmd_decrypt(&config, &input, output.as_deref(), salt_file.as_deref(), force),
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(format!("{home}/{rest}"))
    } else {
        path.to_path_buf()
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Resolve the master salt: CLI flag > config
fn resolve_salt(config: &PipConfig, override_path: Option<&Path>) -> Result<Salt> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(|| config.crypto.master_salt_file.as_deref().map(expand_tilde))
        .context("no master salt file: pass --salt-file or set crypto.master_salt_file")?;
    Ok(salt_file::read_salt_file(&path)?)
}

/// Read the password from PIP_PASSWORD, or prompt for it.
fn read_password(confirm: bool) -> Result<SecretString> {
    if let Ok(pw) = std::env::var("PIP_PASSWORD") {
        return Ok(SecretString::from(pw));
    }
    let password = SecretString::from(
        rpassword::prompt_password("Password: ").context("reading password")?,
    );
    if confirm {
        let again = SecretString::from(
            rpassword::prompt_password("Confirm password: ").context("reading password")?,
        );
        if password.expose_secret() != again.expose_secret() {
            anyhow::bail!("passwords do not match");
        }
    }
    Ok(password)
}

fn open_session(config: &PipConfig, salt: &Salt, confirm: bool) -> Result<ArchiveSession> {
    let password = read_password(confirm)?;
    let spinner = make_spinner("kdf", config.output.progress);
    spinner.set_message("deriving master key");
    let session = ArchiveSession::open(&password, salt, &config.crypto.kdf_params());
    spinner.finish_and_clear();
    Ok(session?)
}

/// Refuse to write over the file being read, even with `--force`.
fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let collides = paths::same_file(input, output)
        .with_context(|| format!("resolving {}", output.display()))?;
    if collides {
        anyhow::bail!(
            "output {} is the input file; choose another with -o",
            output.display()
        );
    }
    Ok(())
}

fn create_output(path: &Path, force: bool) -> Result<BufWriter<File>> {
    let file = if force {
        File::create(path)
    } else {
        File::create_new(path)
    }
    .with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Run `process` against a freshly created output file, removing it on failure.
fn with_output<T>(
    path: &Path,
    force: bool,
    process: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let mut writer = create_output(path, force)?;
    let result = process(&mut writer).and_then(|value| {
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
        Ok(value)
    });
    if result.is_err() {
        drop(writer);
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "could not remove partial output: {e}");
        }
    }
    result
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(total: u64, prefix: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{prefix:.bold} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn make_spinner(prefix: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn report(action: &str, output: &Path, summary: &StreamSummary, checksum: &checksum::Hash) {
    info!(
        output = %output.display(),
        chunks = summary.chunks,
        plaintext_bytes = summary.plaintext_bytes,
        ciphertext_bytes = summary.ciphertext_bytes,
        "{action} complete"
    );
    println!("{action}: {}", output.display());
    println!("  blake3: {}", checksum.to_hex());
}

// ── `pip salt` ────────────────────────────────────────────────────────────────

fn cmd_salt(path: &Path) -> Result<()> {
    salt_file::create_salt_file(path)?;
    info!(path = %path.display(), "master salt written");
    println!("master salt written to {}", path.display());
    Ok(())
}

// ── `pip encrypt` ─────────────────────────────────────────────────────────────

fn cmd_encrypt(
    config: &PipConfig,
    input: &Path,
    output: Option<&Path>,
    salt_override: Option<&Path>,
    force: bool,
) -> Result<()> {
    let ext = &config.output.extension;
    let output = match output {
        Some(p) => paths::ensure_extension(p, ext),
        None => paths::encrypted_output_path(input, ext),
    };
    ensure_distinct(input, &output)?;
    let salt = resolve_salt(config, salt_override)?;

    let source = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let total = source.metadata().map(|m| m.len()).unwrap_or(0);
    let session = open_session(config, &salt, true)?;

    let pb = make_progress_bar(total, "encrypt", config.output.progress);
    let result = with_output(&output, force, |writer| {
        let mut reader = HashingReader::new(pb.wrap_read(source));
        let summary = session
            .encrypt(&mut reader, writer)
            .with_context(|| format!("encrypting {}", input.display()))?;
        Ok((summary, reader.finalize()))
    });
    pb.finish_and_clear();
    let (summary, checksum) = result?;

    report("encrypted", &output, &summary, &checksum);
    Ok(())
}

// ── `pip decrypt` ─────────────────────────────────────────────────────────────

fn cmd_decrypt(
    config: &PipConfig,
    input: &Path,
    output: Option<&Path>,
    salt_override: Option<&Path>,
    force: bool,
) -> Result<()> {
    let output = match output {
        Some(p) => p.to_path_buf(),
        None => paths::decrypted_output_path(input, &config.output.extension),
    };
    ensure_distinct(input, &output)?;
    let salt = resolve_salt(config, salt_override)?;

    let source = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let total = source.metadata().map(|m| m.len()).unwrap_or(0);
    let session = open_session(config, &salt, false)?;

    let pb = make_progress_bar(total, "decrypt", config.output.progress);
    let result = with_output(&output, force, |writer| {
        let mut sink = HashingWriter::new(writer);
        let summary = session
            .decrypt(pb.wrap_read(source), &mut sink)
            .with_context(|| format!("decrypting {}", input.display()))?;
        Ok((summary, sink.finalize()))
    });
    pb.finish_and_clear();
    let (summary, checksum) = result?;

    report("decrypted", &output, &summary, &checksum);
    Ok(())
}
