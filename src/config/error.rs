//! Errors raised while loading or validating a faqsync config file.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file not found: {} (run `faqsync config init` to create one)", .0.display())]
    NotFound(PathBuf),

    /// TOML syntax error or a value of the wrong type.
    #[error("cannot parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A setting that parses but cannot be used, e.g. a zero timeout or a
    /// duplicate worker id. `field` is the dotted TOML path.
    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
