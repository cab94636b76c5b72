use crate::error::Result;
use mvgraph_engine::PlaybackMode;
use tokio::task::JoinHandle;

/// A started playback worker.
///
/// Dropping the handle detaches the worker; it still runs to completion and
/// records its outcome in the session state.
#[derive(Debug)]
pub struct PlaybackHandle {
    mode: PlaybackMode,
    task: JoinHandle<Result<()>>,
}

impl PlaybackHandle {
    pub(super) fn new(mode: PlaybackMode, task: JoinHandle<Result<()>>) -> Self {
        Self { mode, task }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the engine's play call to return.
    pub async fn wait(self) -> Result<()> {
        self.task.await?
    }
}
