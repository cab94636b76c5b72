//! Error types for mvgraph-compiler.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting or compiling a graph description.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A line starts with whitespace.
    #[error("syntax error on line {index}: lines must not start with whitespace")]
    Syntax { index: usize },

    /// A `$NAME$` token has no binding.
    #[error("parameter '{token}' is not specified (line {index})")]
    MissingParameter { token: String, index: usize },

    /// A directive names a command that does not exist.
    #[error("unknown command '{name}' on line {index}")]
    UnknownCommand { name: String, index: usize },

    /// The hierarchical document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The flat document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but does not describe a usable pipeline.
    #[error("invalid graph document: {0}")]
    Document(String),

    /// The source format could not be determined or is not supported.
    #[error("unsupported graph format: {0}")]
    UnsupportedFormat(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a document error.
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document(message.into())
    }

    /// Line index the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { index }
            | Self::MissingParameter { index, .. }
            | Self::UnknownCommand { index, .. } => Some(*index),
            _ => None,
        }
    }
}
