//! Error types for wasmcc.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating or running a build.
///
/// A compile or link stage that fails is not an error: it is reported through
/// a `BuildResult` with `success: false`. These variants cover requests that
/// never reach the toolchain and failures of the host itself.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid filename {0}")]
    InvalidFilename(String),

    /// Two client paths cannot coexist on disk, such as `a` next to `a/b.c`.
    #[error("Conflicting path {0}")]
    PathConflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build worker panicked: {0}")]
    WorkerPanicked(String),
}

impl BuildError {
    /// Whether the error stems from client input rather than the host.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidFilename(_) | Self::PathConflict(_))
    }
}

/// Errors from the language server bridge.
#[derive(Debug, thiserror::Error)]
pub enum LanguageServerError {
    #[error("Failed to spawn {command}: {reason}")]
    Spawn { command: String, reason: String },

    #[error("Language server stdio unavailable: {0}")]
    StdioUnavailable(&'static str),

    #[error("Frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid frame header: {0}")]
    InvalidHeader(String),

    #[error("Unexpected EOF while reading headers")]
    UnexpectedEof,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the listener lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Scratch directory {} is unusable: {source}", path.display())]
    ScratchDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server terminated abnormally: {0}")]
    Terminated(String),
}
