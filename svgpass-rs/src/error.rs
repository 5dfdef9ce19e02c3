//! Error types for svgpass.

use thiserror::Error;

/// Result type alias for svgpass operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, optimizing or serving documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The input text is not a well-formed document.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// An action was requested in a state that does not allow it.
    #[error("{0}")]
    SessionState(String),

    /// A pipeline stage failed while mutating the working document.
    #[error("plugin {plugin} failed: {message}")]
    Transform { plugin: String, message: String },

    /// Settings referred to a plugin that is not registered.
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// The request named an action the worker does not know.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A request lacked a field its action needs.
    #[error("{action} request is missing `{field}`")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    /// A request handler panicked.
    #[error("worker handler panicked: {0}")]
    WorkerPanic(String),

    /// The worker thread is gone.
    #[error("worker channel disconnected")]
    WorkerDisconnected,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a transform error attributed to `plugin`.
    pub fn transform(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transform {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}
