//! In-memory graph engine.
//!
//! [`SimulatedEngine`] follows the same lifecycle rules as the native engine,
//! hands out sequential filter ids and keeps filter parameters in memory. Every
//! call is recorded in a journal that stays reachable through a
//! [`SimulatedHandle`] after the engine has been moved into a session, and any
//! operation can be made to fail with a chosen diagnostic message.

use crate::engine::{CallFailed, CallResult, EngineOperation, GraphEngine};
use crate::types::{FilterId, GraphState, PlaybackMode};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCall {
    pub operation: EngineOperation,
    pub args: Vec<String>,
}

#[derive(Debug, Default)]
struct SimFilter {
    filter_type: String,
    attached: bool,
    params: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct SimInner {
    state: GraphState,
    graph_created: bool,
    next_id: i64,
    filters: BTreeMap<FilterId, SimFilter>,
    playback_mode: Option<PlaybackMode>,
    faults: HashMap<EngineOperation, String>,
    gates: HashMap<EngineOperation, Arc<CallGate>>,
    /// Installed filter types, by name, with their GUIDs.
    catalog: BTreeMap<String, String>,
    last_error: String,
    calls: Vec<EngineCall>,
}

impl SimInner {
    /// Journal the call and apply any injected fault.
    fn enter(&mut self, operation: EngineOperation, args: Vec<String>) -> CallResult<()> {
        self.calls.push(EngineCall { operation, args });
        if let Some(message) = self.faults.get(&operation) {
            self.last_error = message.clone();
            return Err(CallFailed);
        }
        Ok(())
    }

    fn fail<T>(&mut self, message: impl Into<String>) -> CallResult<T> {
        self.last_error = message.into();
        Err(CallFailed)
    }

    fn create_filter(&mut self, filter_type: &str) -> FilterId {
        self.next_id += 1;
        let id = FilterId::new(self.next_id);
        self.filters.insert(
            id,
            SimFilter {
                filter_type: filter_type.to_string(),
                ..Default::default()
            },
        );
        id
    }
}

#[derive(Debug, Default)]
struct GateState {
    open: bool,
    waiting: usize,
}

/// Blocks calls of one operation until opened.
#[derive(Debug, Default)]
struct CallGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl CallGate {
    fn pass(&self) {
        let mut state = self.state.lock();
        state.waiting += 1;
        self.changed.notify_all();
        while !state.open {
            self.changed.wait(&mut state);
        }
        state.waiting -= 1;
    }

    fn open(&self) {
        self.state.lock().open = true;
        self.changed.notify_all();
    }
}

/// A hold placed with [`SimulatedHandle::hold`]. Dropping it lets the
/// blocked calls through.
#[derive(Debug)]
pub struct HeldCall {
    operation: EngineOperation,
    gate: Arc<CallGate>,
    inner: Arc<Mutex<SimInner>>,
}

impl HeldCall {
    /// Wait until a call of the held operation is blocked at the gate.
    /// Returns `false` if none arrived within `timeout`.
    pub fn wait_for_caller(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.gate.state.lock();
        while state.waiting == 0 {
            if self.gate.changed.wait_until(&mut state, deadline).timed_out() {
                return state.waiting > 0;
            }
        }
        true
    }

    /// Let every blocked and future call of the operation through.
    pub fn release(self) {}
}

impl Drop for HeldCall {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner
            .gates
            .get(&self.operation)
            .is_some_and(|gate| Arc::ptr_eq(gate, &self.gate))
        {
            inner.gates.remove(&self.operation);
        }
        drop(inner);
        self.gate.open();
    }
}

/// In-memory [`GraphEngine`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the engine state for `operation`, first waiting out any hold
    /// placed on it.
    fn lock_for(&self, operation: EngineOperation) -> MutexGuard<'_, SimInner> {
        let gate = self.inner.lock().gates.get(&operation).cloned();
        if let Some(gate) = gate {
            tracing::trace!(%operation, "call held");
            gate.pass();
        }
        self.inner.lock()
    }

    /// A handle that observes and steers this engine from outside.
    pub fn handle(&self) -> SimulatedHandle {
        SimulatedHandle {
            inner: self.inner.clone(),
        }
    }
}

/// Shared view onto a [`SimulatedEngine`]'s journal and fault table.
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedHandle {
    /// Make every future call of `operation` fail with `message`.
    pub fn fail_on(&self, operation: EngineOperation, message: impl Into<String>) {
        self.inner.lock().faults.insert(operation, message.into());
    }

    pub fn clear_faults(&self) {
        self.inner.lock().faults.clear();
    }

    /// Block calls of `operation` until the returned hold is dropped. The
    /// blocked call has not touched the engine state yet.
    pub fn hold(&self, operation: EngineOperation) -> HeldCall {
        let gate = Arc::new(CallGate::default());
        self.inner.lock().gates.insert(operation, gate.clone());
        HeldCall {
            operation,
            gate,
            inner: self.inner.clone(),
        }
    }

    /// Install a filter type so GUID lookups can resolve it.
    pub fn register_filter_type(&self, name: impl Into<String>, guid: impl Into<String>) {
        self.inner.lock().catalog.insert(name.into(), guid.into());
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().calls.clone()
    }

    /// Number of recorded calls of `operation`.
    pub fn count(&self, operation: EngineOperation) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Recorded calls excluding state queries.
    pub fn mutating_calls(&self) -> Vec<EngineCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation != EngineOperation::GetState)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn state(&self) -> GraphState {
        self.inner.lock().state
    }

    pub fn filter_count(&self) -> usize {
        self.inner.lock().filters.len()
    }

    pub fn attached_count(&self) -> usize {
        self.inner
            .lock()
            .filters
            .values()
            .filter(|f| f.attached)
            .count()
    }

    pub fn filter_type(&self, id: FilterId) -> Option<String> {
        self.inner
            .lock()
            .filters
            .get(&id)
            .map(|f| f.filter_type.clone())
    }

    pub fn param(&self, id: FilterId, name: &str) -> Option<String> {
        self.inner
            .lock()
            .filters
            .get(&id)
            .and_then(|f| f.params.get(name).cloned())
    }

    /// Mode passed to the last successful play call.
    pub fn playback_mode(&self) -> Option<PlaybackMode> {
        self.inner.lock().playback_mode
    }
}

impl GraphEngine for SimulatedEngine {
    fn create_graph(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::CreateGraph);
        inner.enter(EngineOperation::CreateGraph, Vec::new())?;
        if inner.graph_created {
            return inner.fail("graph already created");
        }
        inner.graph_created = true;
        Ok(())
    }

    fn create_filter_by_name(&mut self, filter_type: &str) -> CallResult<FilterId> {
        let mut inner = self.lock_for(EngineOperation::CreateFilterByName);
        inner.enter(
            EngineOperation::CreateFilterByName,
            vec![filter_type.to_string()],
        )?;
        Ok(inner.create_filter(filter_type))
    }

    fn create_filter_by_guid(&mut self, guid: &str, name: &str) -> CallResult<FilterId> {
        let mut inner = self.lock_for(EngineOperation::CreateFilterByGuid);
        inner.enter(
            EngineOperation::CreateFilterByGuid,
            vec![guid.to_string(), name.to_string()],
        )?;
        Ok(inner.create_filter(guid))
    }

    fn destroy_filter(&mut self, id: FilterId) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::DestroyFilter);
        inner.enter(EngineOperation::DestroyFilter, vec![id.to_string()])?;
        if inner.filters.remove(&id).is_none() {
            return inner.fail(format!("unknown filter instance {id}"));
        }
        Ok(())
    }

    fn add_filter_to_graph(&mut self, id: FilterId) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::AddFilterToGraph);
        inner.enter(EngineOperation::AddFilterToGraph, vec![id.to_string()])?;
        if !inner.graph_created {
            return inner.fail("no graph has been created");
        }
        match inner.filters.get_mut(&id) {
            Some(filter) => {
                filter.attached = true;
                Ok(())
            }
            None => inner.fail(format!("unknown filter instance {id}")),
        }
    }

    fn build_graph(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::BuildGraph);
        inner.enter(EngineOperation::BuildGraph, Vec::new())?;
        if !inner.graph_created {
            return inner.fail("no graph has been created");
        }
        inner.state = GraphState::Stopped;
        Ok(())
    }

    fn play(&mut self, mode: PlaybackMode) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::Play);
        inner.enter(EngineOperation::Play, vec![mode.code().to_string()])?;
        match inner.state {
            GraphState::Stopped | GraphState::Paused => {
                inner.state = GraphState::Playing;
                inner.playback_mode = Some(mode);
                Ok(())
            }
            other => inner.fail(format!("cannot play a graph in state {other}")),
        }
    }

    fn pause(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::Pause);
        inner.enter(EngineOperation::Pause, Vec::new())?;
        match inner.state {
            GraphState::Playing => {
                inner.state = GraphState::Paused;
                Ok(())
            }
            other => inner.fail(format!("cannot pause a graph in state {other}")),
        }
    }

    fn resume(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::Resume);
        inner.enter(EngineOperation::Resume, Vec::new())?;
        match inner.state {
            GraphState::Paused => {
                inner.state = GraphState::Playing;
                Ok(())
            }
            other => inner.fail(format!("cannot resume a graph in state {other}")),
        }
    }

    fn stop(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::Stop);
        inner.enter(EngineOperation::Stop, Vec::new())?;
        match inner.state {
            GraphState::Playing | GraphState::Paused | GraphState::Stopped => {
                inner.state = GraphState::Stopped;
                Ok(())
            }
            other => inner.fail(format!("cannot stop a graph in state {other}")),
        }
    }

    fn destroy_graph(&mut self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::DestroyGraph);
        inner.enter(EngineOperation::DestroyGraph, Vec::new())?;
        inner.filters.clear();
        inner.graph_created = false;
        inner.playback_mode = None;
        inner.state = GraphState::NotBuilt;
        Ok(())
    }

    fn state(&self) -> CallResult<GraphState> {
        let mut inner = self.lock_for(EngineOperation::GetState);
        inner.enter(EngineOperation::GetState, Vec::new())?;
        Ok(inner.state)
    }

    fn get_param(&self, id: FilterId, name: &str) -> CallResult<String> {
        let mut inner = self.lock_for(EngineOperation::GetParam);
        inner.enter(
            EngineOperation::GetParam,
            vec![id.to_string(), name.to_string()],
        )?;
        let value = inner
            .filters
            .get(&id)
            .map(|f| f.params.get(name).cloned());
        match value {
            Some(Some(value)) => Ok(value),
            Some(None) => inner.fail(format!("filter {id} has no parameter '{name}'")),
            None => inner.fail(format!("unknown filter instance {id}")),
        }
    }

    fn get_params(&self, id: FilterId) -> CallResult<String> {
        let mut inner = self.lock_for(EngineOperation::GetParams);
        inner.enter(EngineOperation::GetParams, vec![id.to_string()])?;
        let rendered = inner.filters.get(&id).map(|f| {
            f.params
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("\n")
        });
        match rendered {
            Some(rendered) => Ok(rendered),
            None => inner.fail(format!("unknown filter instance {id}")),
        }
    }

    fn set_param(&mut self, id: FilterId, name: &str, value: &str) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::SetParam);
        inner.enter(
            EngineOperation::SetParam,
            vec![id.to_string(), name.to_string(), value.to_string()],
        )?;
        match inner.filters.get_mut(&id) {
            Some(filter) => {
                filter.params.insert(name.to_string(), value.to_string());
                tracing::trace!(filter = %id, param = name, value, "parameter set");
                Ok(())
            }
            None => inner.fail(format!("unknown filter instance {id}")),
        }
    }

    fn list_available_filters(&self) -> CallResult<()> {
        let mut inner = self.lock_for(EngineOperation::ListAvailableFilters);
        inner.enter(EngineOperation::ListAvailableFilters, Vec::new())?;
        for (name, guid) in &inner.catalog {
            tracing::info!(filter = %name, %guid, "available filter");
        }
        Ok(())
    }

    fn filter_guid_by_name(&self, filter_type: &str) -> CallResult<String> {
        let mut inner = self.lock_for(EngineOperation::FilterGuidByName);
        inner.enter(
            EngineOperation::FilterGuidByName,
            vec![filter_type.to_string()],
        )?;
        let guid = inner.catalog.get(filter_type).cloned();
        match guid {
            Some(guid) => Ok(guid),
            None => inner.fail(format!("unknown filter type '{filter_type}'")),
        }
    }

    fn filter_name_by_guid(&self, guid: &str) -> CallResult<String> {
        let mut inner = self.lock_for(EngineOperation::FilterNameByGuid);
        inner.enter(EngineOperation::FilterNameByGuid, vec![guid.to_string()])?;
        let name = inner
            .catalog
            .iter()
            .find(|(_, g)| g.as_str() == guid)
            .map(|(name, _)| name.clone());
        match name {
            Some(name) => Ok(name),
            None => inner.fail(format!("unknown filter GUID '{guid}'")),
        }
    }

    fn source_info(&self) -> CallResult<String> {
        let mut inner = self.lock_for(EngineOperation::SourceInfo);
        inner.enter(EngineOperation::SourceInfo, Vec::new())?;
        if !inner.graph_created {
            return inner.fail("no graph has been created");
        }
        let attached = inner.filters.values().filter(|f| f.attached).count();
        Ok(format!(
            "simulated source: {} filters, {} attached, state {}",
            inner.filters.len(),
            attached,
            inner.state
        ))
    }

    fn last_error(&self) -> String {
        self.inner.lock().last_error.clone()
    }
}
