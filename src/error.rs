use thiserror::Error;

use rtp_hint_lib::HintError;

/// Main error type for the command line tool
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Hint(#[from] HintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown packing flag: {0}")]
    UnknownFlag(String),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(e: toml::ser::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CliError>;
