use thiserror::Error;

pub type PipResult<T> = Result<T, PipError>;

#[derive(Debug, Error)]
pub enum PipError {
    #[error("config error: {0}")]
    Config(String),

    #[error("master salt error: {0}")]
    Salt(String),

    #[error(transparent)]
    Crypto(#[from] pip_crypto::CryptoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
