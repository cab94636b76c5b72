//! Error type for graph sessions.
//!
//! Every failure a session can report is an [`Error`]; the HTTP layer derives
//! its status code from [`Error::http_status`].

use mvgraph_engine::{EngineOperation, GraphState};

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The graph description did not compile.
    #[error("Compile error: {0}")]
    Compile(#[from] mvgraph_compiler::Error),

    /// An engine call reported failure. `message` is the engine's own text.
    #[error("Engine error [{operation}]: {message}")]
    Engine {
        operation: EngineOperation,
        message: String,
    },

    /// A symbolic name is already registered in this build cycle.
    #[error("Filter name already registered: {0}")]
    DuplicateName(String),

    /// No filter is registered under this symbolic name.
    #[error("Filter not found: {0}")]
    UnknownFilter(String),

    /// A directive has fewer arguments than its handler needs.
    #[error("Invalid arguments for {command} on line {line}: expected at least {expected}, got {actual}")]
    InvalidArguments {
        command: String,
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// The operation is not allowed in the current lifecycle state.
    #[error("Cannot {operation} while graph is {state}")]
    InvalidState {
        operation: &'static str,
        state: GraphState,
    },

    #[error("Graph is already playing")]
    AlreadyPlaying,

    /// No graph has been staged or built.
    #[error("No graph is loaded")]
    NoGraphLoaded,

    /// Play was requested before any run directive or explicit mode.
    #[error("No playback mode set, build a graph or set one first")]
    NoPlaybackMode,

    #[error("Invalid playback mode: {0}")]
    InvalidPlaybackMode(String),

    /// A request could not be interpreted.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The playback worker panicked or was cancelled.
    #[error("Playback worker failed: {0}")]
    Worker(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Compile(mvgraph_compiler::Error::Io(_)) => 500,
            Error::Compile(_) => 400,
            Error::Engine { .. } => 502,
            Error::DuplicateName(_) => 409,
            Error::UnknownFilter(_) => 404,
            Error::InvalidArguments { .. } => 400,
            Error::InvalidState { .. } => 400,
            Error::AlreadyPlaying => 400,
            Error::NoGraphLoaded => 404,
            Error::NoPlaybackMode => 404,
            Error::InvalidPlaybackMode(_) => 400,
            Error::InvalidRequest(_) => 400,
            Error::Worker(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::Engine`].
    pub fn engine(operation: EngineOperation, message: impl Into<String>) -> Self {
        Error::Engine {
            operation,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        assert_eq!(Error::NoGraphLoaded.http_status(), 404);
        assert_eq!(Error::UnknownFilter("cam".into()).http_status(), 404);
        assert_eq!(Error::AlreadyPlaying.http_status(), 400);
        assert_eq!(Error::DuplicateName("cam".into()).http_status(), 409);
        assert_eq!(
            Error::engine(EngineOperation::Play, "boom").http_status(),
            502
        );
        assert_eq!(
            Error::Compile(mvgraph_compiler::Error::Syntax { index: 0 }).http_status(),
            400
        );
    }

    #[test]
    fn test_engine_message_is_verbatim() {
        let err = Error::engine(EngineOperation::BuildGraph, "pin negotiation failed");
        assert_eq!(
            err.to_string(),
            "Engine error [build_graph]: pin negotiation failed"
        );
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::InvalidState {
            operation: "pause",
            state: GraphState::Stopped,
        };
        assert_eq!(err.to_string(), "Cannot pause while graph is STOPPED");
    }
}
