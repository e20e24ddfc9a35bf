pub mod config;
pub mod error;

pub use config::{load_config, PipConfig};
pub use error::{PipError, PipResult};
