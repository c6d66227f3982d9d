use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for configuration, initialization and snapshot I/O.
///
/// Numerical corner cases (normalizing a zero vector, a collision with no
/// approach speed) are defined behaviour and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value or combination of values.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Initial placement could not satisfy the minimum-separation constraint.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The configured step budget is used up.
    #[error("simulation finished after {0} steps")]
    Finished(u64),

    /// A snapshot could not be written.
    #[error("failed to export snapshot to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed XYZ input.
    #[error("xyz parse error on line {line}: {msg}")]
    Parse { line: usize, msg: String },

    /// Malformed TOML configuration.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    /// Propagated I/O errors (configuration or snapshot reads).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
