//! The adapter contract every graph engine backend implements.

use crate::types::{FilterId, GraphState, PlaybackMode};
use std::fmt;

/// An engine call reported failure.
///
/// The engine only returns a success flag; the diagnostic text has to be
/// fetched with a follow-up [`GraphEngine::last_error`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("engine call reported failure")]
pub struct CallFailed;

/// Outcome of a single engine call.
pub type CallResult<T> = std::result::Result<T, CallFailed>;

/// Names of the engine operations, used for journaling, fault injection and
/// error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineOperation {
    Init,
    CreateGraph,
    CreateFilterByName,
    CreateFilterByGuid,
    DestroyFilter,
    AddFilterToGraph,
    BuildGraph,
    Play,
    Pause,
    Resume,
    Stop,
    DestroyGraph,
    GetState,
    GetParam,
    GetParams,
    SetParam,
    ListAvailableFilters,
    FilterGuidByName,
    FilterNameByGuid,
    SourceInfo,
}

impl EngineOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::CreateGraph => "create_graph",
            Self::CreateFilterByName => "create_filter_by_name",
            Self::CreateFilterByGuid => "create_filter_by_guid",
            Self::DestroyFilter => "destroy_filter",
            Self::AddFilterToGraph => "add_filter_to_graph",
            Self::BuildGraph => "build_graph",
            Self::Play => "play",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::DestroyGraph => "destroy_graph",
            Self::GetState => "get_state",
            Self::GetParam => "get_param",
            Self::GetParams => "get_params",
            Self::SetParam => "set_param",
            Self::ListAvailableFilters => "list_available_filters",
            Self::FilterGuidByName => "filter_guid_by_name",
            Self::FilterNameByGuid => "filter_name_by_guid",
            Self::SourceInfo => "source_info",
        }
    }
}

impl fmt::Display for EngineOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stateful, order-dependent graph engine.
///
/// Implementations are driven by exactly one session at a time; callers must
/// serialize every call. Methods are blocking and may take arbitrarily long.
pub trait GraphEngine: Send {
    /// Create the (single) engine-side graph.
    fn create_graph(&mut self) -> CallResult<()>;

    /// Instantiate a filter by its registered type name.
    fn create_filter_by_name(&mut self, filter_type: &str) -> CallResult<FilterId>;

    /// Instantiate a filter by type GUID, giving the instance a name.
    fn create_filter_by_guid(&mut self, guid: &str, name: &str) -> CallResult<FilterId>;

    fn destroy_filter(&mut self, id: FilterId) -> CallResult<()>;

    fn add_filter_to_graph(&mut self, id: FilterId) -> CallResult<()>;

    /// Finalise the topology; the graph becomes playable.
    fn build_graph(&mut self) -> CallResult<()>;

    fn play(&mut self, mode: PlaybackMode) -> CallResult<()>;

    fn pause(&mut self) -> CallResult<()>;

    fn resume(&mut self) -> CallResult<()>;

    fn stop(&mut self) -> CallResult<()>;

    fn destroy_graph(&mut self) -> CallResult<()>;

    /// The engine's own view of the graph lifecycle.
    fn state(&self) -> CallResult<GraphState>;

    fn get_param(&self, id: FilterId, name: &str) -> CallResult<String>;

    /// Every parameter of a filter, rendered by the engine.
    fn get_params(&self, id: FilterId) -> CallResult<String>;

    fn set_param(&mut self, id: FilterId, name: &str, value: &str) -> CallResult<()>;

    /// Have the engine enumerate its installed filter types into its own log.
    fn list_available_filters(&self) -> CallResult<()>;

    fn filter_guid_by_name(&self, filter_type: &str) -> CallResult<String>;

    fn filter_name_by_guid(&self, guid: &str) -> CallResult<String>;

    /// The engine's description of the graph's media source.
    fn source_info(&self) -> CallResult<String>;

    /// Diagnostic text for the most recent failed call.
    fn last_error(&self) -> String;
}

impl<E: GraphEngine + ?Sized> GraphEngine for Box<E> {
    fn create_graph(&mut self) -> CallResult<()> {
        (**self).create_graph()
    }

    fn create_filter_by_name(&mut self, filter_type: &str) -> CallResult<FilterId> {
        (**self).create_filter_by_name(filter_type)
    }

    fn create_filter_by_guid(&mut self, guid: &str, name: &str) -> CallResult<FilterId> {
        (**self).create_filter_by_guid(guid, name)
    }

    fn destroy_filter(&mut self, id: FilterId) -> CallResult<()> {
        (**self).destroy_filter(id)
    }

    fn add_filter_to_graph(&mut self, id: FilterId) -> CallResult<()> {
        (**self).add_filter_to_graph(id)
    }

    fn build_graph(&mut self) -> CallResult<()> {
        (**self).build_graph()
    }

    fn play(&mut self, mode: PlaybackMode) -> CallResult<()> {
        (**self).play(mode)
    }

    fn pause(&mut self) -> CallResult<()> {
        (**self).pause()
    }

    fn resume(&mut self) -> CallResult<()> {
        (**self).resume()
    }

    fn stop(&mut self) -> CallResult<()> {
        (**self).stop()
    }

    fn destroy_graph(&mut self) -> CallResult<()> {
        (**self).destroy_graph()
    }

    fn state(&self) -> CallResult<GraphState> {
        (**self).state()
    }

    fn get_param(&self, id: FilterId, name: &str) -> CallResult<String> {
        (**self).get_param(id, name)
    }

    fn get_params(&self, id: FilterId) -> CallResult<String> {
        (**self).get_params(id)
    }

    fn set_param(&mut self, id: FilterId, name: &str, value: &str) -> CallResult<()> {
        (**self).set_param(id, name, value)
    }

    fn list_available_filters(&self) -> CallResult<()> {
        (**self).list_available_filters()
    }

    fn filter_guid_by_name(&self, filter_type: &str) -> CallResult<String> {
        (**self).filter_guid_by_name(filter_type)
    }

    fn filter_name_by_guid(&self, guid: &str) -> CallResult<String> {
        (**self).filter_name_by_guid(guid)
    }

    fn source_info(&self) -> CallResult<String> {
        (**self).source_info()
    }

    fn last_error(&self) -> String {
        (**self).last_error()
    }
}
