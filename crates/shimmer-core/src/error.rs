//! Error types for Shimmer

use thiserror::Error;

/// The main error type for Shimmer operations
#[derive(Debug, Error)]
pub enum ShimmerError {
    #[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("Callback '{name}' failed: {message}")]
    Callback { name: String, message: String },
}

impl ShimmerError {
    /// Convenience constructor for host callbacks reporting a failure
    pub fn callback(name: impl Into<String>, message: impl Into<String>) -> Self {
        ShimmerError::Callback {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Shimmer operations
pub type Result<T> = std::result::Result<T, ShimmerError>;

impl From<toml::de::Error> for ShimmerError {
    fn from(err: toml::de::Error) -> Self {
        ShimmerError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for ShimmerError {
    fn from(err: toml::ser::Error) -> Self {
        ShimmerError::TomlSer(err.to_string())
    }
}
