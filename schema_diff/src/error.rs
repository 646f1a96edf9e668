//! Error types for SchemaDiff

use thiserror::Error;

/// Result type for SchemaDiff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for SchemaDiff
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A snapshot could not be retrieved for `path` (e.g. `public.orders.triggers`).
    #[error("Fetch error for {kind} '{path}': {message}")]
    Fetch {
        kind: String,
        path: String,
        message: String,
    },

    /// A statement could not be synthesized for one object.
    #[error("Render error for {kind} '{name}': {message}")]
    Render {
        kind: String,
        name: String,
        message: String,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Incompatible servers: {0}")]
    Incompatible(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigError(_) => "config",
            Error::Fetch { .. } => "fetch",
            Error::Render { .. } => "render",
            Error::Precondition(_) => "precondition",
            Error::Incompatible(_) => "incompatible",
            Error::IoError(_) => "io",
            Error::SerializationError(_) => "serialization",
        }
    }

    pub(crate) fn render(
        kind: impl ToString,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Render {
            kind: kind.to_string(),
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn fetch(
        kind: impl ToString,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Fetch {
            kind: kind.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Convert Serde JSON errors to SchemaDiff errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert Serde YAML errors to SchemaDiff errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to SchemaDiff errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
