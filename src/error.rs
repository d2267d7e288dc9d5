use thiserror::Error;

use crate::output_parser::ParseError;

/// Crate-level errors: configuration problems plus parse failures for
/// callers that want a single error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be read.
    #[error("JSON configuration failed to load: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration YAML could not be read.
    #[cfg(feature = "yaml")]
    #[error("YAML configuration failed to load: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An output parser rejected a response.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{err:#}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
