use std::path::PathBuf;
use thiserror::Error;

pub type SealResult<T> = Result<T, SealError>;

#[derive(Debug, Error)]
pub enum SealError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("format error: {0}")]
    Format(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("padding error: {0}")]
    Padding(String),

    #[error("hardware error: {operation} failed: {code} - {message}")]
    Hardware {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl SealError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn hardware(
        operation: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Hardware {
            operation,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Stable category name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Io { .. } => "io",
            Self::Format(_) => "format",
            Self::Crypto(_) => "crypto",
            Self::Padding(_) => "padding",
            Self::Hardware { .. } => "hardware",
            Self::Config(_) => "config",
        }
    }
}
