use thiserror::Error;

/// All errors that can occur in bookscout-core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid book id: {0:?}")]
    InvalidBookId(String),

    #[error("Unknown source: {0:?} (expected all, google or open-library)")]
    UnknownSource(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Process exit codes used by the CLI on failure; success exits with 0.
#[repr(i32)]
pub enum ExitCode {
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
}
