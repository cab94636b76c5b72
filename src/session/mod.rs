//! Graph sessions.
//!
//! A [`Session`] owns one engine handle together with the filter registry,
//! the staged command sequence, the captured playback mode and the lifecycle
//! state. All of it lives in a single `SessionCore` behind an async mutex;
//! every engine call runs on the blocking pool while holding that lock, so
//! calls from concurrent callers are applied one at a time and in order.
//!
//! The lifecycle state is mirrored into a watch channel so it can be read
//! without waiting for a long-running engine call to finish.

mod dispatch;
mod lifecycle;
mod playback;
mod registry;

pub use dispatch::{DispatchMode, DispatchReport};
pub use playback::PlaybackHandle;
pub use registry::{FilterInstance, FilterRegistry};

use crate::error::{Error, Result};
use mvgraph_compiler::CommandSequence;
use mvgraph_engine::{CallFailed, CallResult, EngineOperation, GraphEngine, GraphState, PlaybackMode};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Mutable state of a session. Only reachable through the session lock.
pub(crate) struct SessionCore {
    engine: Box<dyn GraphEngine>,
    registry: FilterRegistry,
    sequence: Option<CommandSequence>,
    playback_mode: Option<PlaybackMode>,
    /// Set once the engine-side graph exists, even if the build later fails.
    graph_created: bool,
    state: watch::Sender<GraphState>,
}

impl SessionCore {
    fn state(&self) -> GraphState {
        *self.state.borrow()
    }

    fn set_state(&mut self, next: GraphState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "graph state changed");
        }
    }

    /// Run one engine call, fetching the engine's diagnostic text on failure.
    fn engine_call<T>(
        &mut self,
        operation: EngineOperation,
        call: impl FnOnce(&mut Box<dyn GraphEngine>) -> CallResult<T>,
    ) -> Result<T> {
        tracing::trace!(%operation, "engine call");
        let result = call(&mut self.engine);
        result.map_err(|CallFailed| self.engine_failure(operation))
    }

    /// Like [`Self::engine_call`] for calls that only read.
    fn engine_query<T>(
        &self,
        operation: EngineOperation,
        call: impl FnOnce(&dyn GraphEngine) -> CallResult<T>,
    ) -> Result<T> {
        tracing::trace!(%operation, "engine query");
        call(self.engine.as_ref()).map_err(|CallFailed| self.engine_failure(operation))
    }

    /// Engine call whose failure faults the graph.
    fn lifecycle_call(
        &mut self,
        operation: EngineOperation,
        call: impl FnOnce(&mut Box<dyn GraphEngine>) -> CallResult<()>,
    ) -> Result<()> {
        let result = self.engine_call(operation, call);
        if result.is_err() {
            self.set_state(GraphState::Error);
        }
        result
    }

    fn engine_failure(&self, operation: EngineOperation) -> Error {
        let message = self.engine.last_error();
        tracing::warn!(%operation, %message, "engine call failed");
        Error::engine(operation, message)
    }

    fn require_active(&self) -> Result<()> {
        if self.state().is_active() {
            Ok(())
        } else {
            Err(Error::NoGraphLoaded)
        }
    }

    /// Whether there is engine-side state to tear down, including what a
    /// failed build left behind.
    fn needs_teardown(&self) -> bool {
        self.state() != GraphState::NotBuilt || self.graph_created || !self.registry.is_empty()
    }

    /// Drop everything cached for the current build cycle.
    fn clear(&mut self) {
        self.registry.clear();
        self.sequence = None;
        self.playback_mode = None;
        self.graph_created = false;
    }
}

/// Handle to one graph session. Clones share the same session.
#[derive(Clone)]
pub struct Session {
    core: Arc<Mutex<SessionCore>>,
    state: watch::Receiver<GraphState>,
}

impl Session {
    pub fn new(engine: impl GraphEngine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    pub fn from_boxed(engine: Box<dyn GraphEngine>) -> Self {
        let (state_tx, state_rx) = watch::channel(GraphState::NotBuilt);
        let core = SessionCore {
            engine,
            registry: FilterRegistry::new(),
            sequence: None,
            playback_mode: None,
            graph_created: false,
            state: state_tx,
        };
        Self {
            core: Arc::new(Mutex::new(core)),
            state: state_rx,
        }
    }

    /// Run `op` on the blocking pool while holding the session lock.
    async fn with_core<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut SessionCore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut core = self.core.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut core)).await?
    }

    /// Current lifecycle state. Does not wait for the session lock.
    pub fn state(&self) -> GraphState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<GraphState> {
        self.state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// The engine's own view of the lifecycle state.
    pub async fn engine_state(&self) -> Result<GraphState> {
        self.with_core(|core| core.engine_query(EngineOperation::GetState, |e| e.state()))
            .await
    }

    /// Cache a compiled sequence for the next [`Session::build`].
    pub async fn stage(&self, sequence: CommandSequence) {
        let mut core = self.core.lock().await;
        tracing::debug!(directives = sequence.len(), "staged command sequence");
        core.sequence = Some(sequence);
    }

    pub async fn staged(&self) -> Option<CommandSequence> {
        self.core.lock().await.sequence.clone()
    }

    /// Run the staged sequence in BUILD mode and finalise the graph.
    ///
    /// Returns the attached filters. On failure the directives already
    /// applied stay applied; call [`Session::destroy`] to clean up.
    pub async fn build(&self) -> Result<Vec<FilterInstance>> {
        self.with_core(|core| core.build()).await
    }

    /// Push the `setparams` directives of `sequence` onto the built graph.
    pub async fn apply_parameters(&self, sequence: CommandSequence) -> Result<DispatchReport> {
        self.with_core(move |core| {
            core.require_active()?;
            core.run_sequence(&sequence, DispatchMode::Set)
        })
        .await
    }

    /// Start playback on a worker with the captured playback mode.
    ///
    /// The session lock moves into the worker, so later calls wait for the
    /// engine's play call to return.
    pub async fn play(&self) -> Result<PlaybackHandle> {
        let mut core = self.core.clone().lock_owned().await;
        let mode = core.check_playable()?;
        tracing::info!(%mode, "starting playback");
        let task = tokio::task::spawn_blocking(move || core.start_playback(mode));
        Ok(PlaybackHandle::new(mode, task))
    }

    pub async fn pause(&self) -> Result<()> {
        self.with_core(|core| core.pause()).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.with_core(|core| core.resume()).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.with_core(|core| core.stop()).await
    }

    /// Whether [`Session::destroy`] has a graph or a failed build to clean up.
    pub async fn needs_teardown(&self) -> bool {
        self.core.lock().await.needs_teardown()
    }

    /// Tear down the graph and forget everything cached for it.
    pub async fn destroy(&self) -> Result<()> {
        self.with_core(|core| core.destroy()).await
    }

    /// Every registered filter, ordered by name.
    pub async fn filters(&self) -> Vec<FilterInstance> {
        self.core.lock().await.registry.instances()
    }

    /// Filters attached to the graph, ordered by engine id.
    pub async fn attached_filters(&self) -> Vec<FilterInstance> {
        self.core.lock().await.registry.attached()
    }

    pub async fn playback_mode(&self) -> Option<PlaybackMode> {
        self.core.lock().await.playback_mode
    }

    /// Replace the captured playback mode. Rejected while playing.
    pub async fn set_playback_mode(&self, mode: PlaybackMode) -> Result<()> {
        let mut core = self.core.lock().await;
        if core.state() == GraphState::Playing {
            return Err(Error::InvalidState {
                operation: "change the playback mode",
                state: GraphState::Playing,
            });
        }
        core.playback_mode = Some(mode);
        Ok(())
    }

    pub async fn get_parameter(&self, filter: &str, name: &str) -> Result<String> {
        let (filter, name) = (filter.to_string(), name.to_string());
        self.with_core(move |core| {
            core.require_active()?;
            let id = core.registry.lookup(&filter)?;
            core.engine_query(EngineOperation::GetParam, |e| e.get_param(id, &name))
        })
        .await
    }

    /// All parameters of a filter, as rendered by the engine.
    pub async fn get_parameters(&self, filter: &str) -> Result<String> {
        let filter = filter.to_string();
        self.with_core(move |core| {
            core.require_active()?;
            let id = core.registry.lookup(&filter)?;
            core.engine_query(EngineOperation::GetParams, |e| e.get_params(id))
        })
        .await
    }

    /// Have the engine list its installed filter types in its own log.
    pub async fn list_available_filters(&self) -> Result<()> {
        self.with_core(|core| {
            core.engine_query(EngineOperation::ListAvailableFilters, |e| {
                e.list_available_filters()
            })
        })
        .await
    }

    /// GUID of an installed filter type.
    pub async fn filter_guid(&self, filter_type: &str) -> Result<String> {
        let filter_type = filter_type.to_string();
        self.with_core(move |core| {
            core.engine_query(EngineOperation::FilterGuidByName, |e| {
                e.filter_guid_by_name(&filter_type)
            })
        })
        .await
    }

    /// Type name of an installed filter GUID.
    pub async fn filter_type_name(&self, guid: &str) -> Result<String> {
        let guid = guid.to_string();
        self.with_core(move |core| {
            core.engine_query(EngineOperation::FilterNameByGuid, |e| {
                e.filter_name_by_guid(&guid)
            })
        })
        .await
    }

    /// The engine's description of the built graph's source.
    pub async fn source_info(&self) -> Result<String> {
        self.with_core(|core| {
            core.require_active()?;
            core.engine_query(EngineOperation::SourceInfo, |e| e.source_info())
        })
        .await
    }

    /// Set one parameter and return the value the engine reports back.
    pub async fn set_parameter(&self, filter: &str, name: &str, value: &str) -> Result<String> {
        let (filter, name, value) = (filter.to_string(), name.to_string(), value.to_string());
        self.with_core(move |core| {
            core.require_active()?;
            let id = core.registry.lookup(&filter)?;
            core.engine_call(EngineOperation::SetParam, |e| e.set_param(id, &name, &value))?;
            core.engine_query(EngineOperation::GetParam, |e| e.get_param(id, &name))
        })
        .await
    }
}
