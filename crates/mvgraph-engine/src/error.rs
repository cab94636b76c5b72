//! Error types for mvgraph-engine.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside individual engine calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The engine reported a lifecycle state code this crate does not know.
    #[error("unknown graph state code: {0}")]
    UnknownStateCode(i32),

    /// A playback mode could not be parsed from a code or name.
    #[error("unknown playback mode: {0}")]
    UnknownPlaybackMode(String),

    /// The engine library refused to initialise.
    #[error("engine initialisation failed: {0}")]
    Init(String),
}
