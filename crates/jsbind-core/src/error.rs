//! Error types for request handling and engine selection.

use thiserror::Error;

/// Errors raised by jsbind-core before a response envelope exists.
///
/// Engine-reported problems (syntax errors, unresolved imports) are never
/// errors at this level; they travel inside the response as messages.
#[derive(Error, Debug)]
pub enum BindError {
    /// The request was not well-formed JSON.
    #[error("Failed to parse request JSON: {0}")]
    RequestJson(#[source] serde_json::Error),

    /// The response (and its fallback envelope) could not be serialized.
    #[error("Failed to serialize response JSON: {0}")]
    ResponseJson(#[source] serde_json::Error),

    /// `JSBIND_ENGINE` or `--engine` named an engine that does not exist.
    #[error("Unknown engine: '{0}'. Available engines: auto, oxc, esbuild")]
    UnknownEngine(String),

    /// No esbuild executable at the configured path or on `PATH`.
    #[error("esbuild executable not found: {0}")]
    EsbuildNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout jsbind-core.
pub type Result<T> = std::result::Result<T, BindError>;
