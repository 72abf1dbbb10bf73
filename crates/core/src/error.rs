//! Error taxonomy used by generators and the fallback dispatcher.

use std::fmt;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, independent of which backend reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// API key missing, invalid or lacking permission.
    Credential,
    /// Quota or rate limit exceeded.
    Quota,
    /// Provider-side project configuration is invalid.
    Project,
    /// Transport failure talking to a remote service.
    Network,
    /// The remote service answered with an error.
    Api,
    /// Local configuration problem, e.g. no inference session loaded.
    Config,
    /// The provider finished without producing any text.
    Empty,
    /// Failure while a model was producing tokens.
    Generation,
    /// No provider in the priority list is available.
    NoModelAvailable,
    /// The embedding backend failed.
    Embedding,
    /// Reading or writing persisted state failed.
    Io,
    /// Malformed data (JSON, images, index artifacts).
    Decode,
}

impl ErrorKind {
    /// Short lowercase label used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Quota => "quota",
            Self::Project => "project",
            Self::Network => "network",
            Self::Api => "api",
            Self::Config => "config",
            Self::Empty => "empty",
            Self::Generation => "generation",
            Self::NoModelAvailable => "no model available",
            Self::Embedding => "embedding",
            Self::Io => "io",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified pipeline error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for [`ErrorKind::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Shorthand for [`ErrorKind::Generation`].
    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generation, message)
    }

    /// The error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The error message without any kind prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message with a summary, keeping the kind.
    pub fn context(self, summary: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{summary}: {}", self.message),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}
