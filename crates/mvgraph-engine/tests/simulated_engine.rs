//! Simulated engine integration tests
//!
//! Exercises the engine through the `GraphEngine` trait object the way the
//! session drives it.

use assert_matches::assert_matches;
use mvgraph_engine::{
    CallFailed, EngineOperation, FilterId, GraphEngine, GraphState, PlaybackMode, SimulatedEngine,
};

fn boxed() -> (Box<dyn GraphEngine>, mvgraph_engine::SimulatedHandle) {
    let engine = SimulatedEngine::new();
    let handle = engine.handle();
    (Box::new(engine), handle)
}

#[test]
fn test_full_lifecycle_through_trait_object() {
    let (mut engine, handle) = boxed();

    engine.create_graph().unwrap();
    let reader = engine.create_filter_by_name("Reader").unwrap();
    let writer = engine.create_filter_by_name("Writer").unwrap();
    engine.set_param(reader, "Path", "in.mvx").unwrap();
    engine.add_filter_to_graph(reader).unwrap();
    engine.add_filter_to_graph(writer).unwrap();
    engine.build_graph().unwrap();

    assert_eq!(handle.attached_count(), 2);
    assert_eq!(handle.param(reader, "Path").as_deref(), Some("in.mvx"));

    engine.play(PlaybackMode::ForwardOnce).unwrap();
    assert_eq!(engine.state().unwrap(), GraphState::Playing);
    engine.stop().unwrap();
    engine.destroy_graph().unwrap();

    assert_eq!(handle.state(), GraphState::NotBuilt);
    assert_eq!(handle.filter_count(), 0);
}

#[test]
fn test_journal_order_matches_calls() {
    let (mut engine, handle) = boxed();

    engine.create_graph().unwrap();
    let id = engine.create_filter_by_guid("{A1}", "source").unwrap();
    engine.add_filter_to_graph(id).unwrap();
    engine.build_graph().unwrap();

    let ops: Vec<_> = handle.calls().into_iter().map(|c| c.operation).collect();
    assert_eq!(
        ops,
        vec![
            EngineOperation::CreateGraph,
            EngineOperation::CreateFilterByGuid,
            EngineOperation::AddFilterToGraph,
            EngineOperation::BuildGraph,
        ]
    );
    assert_eq!(handle.calls()[1].args, vec!["{A1}", "source"]);
}

#[test]
fn test_mutating_calls_skip_state_queries() {
    let (mut engine, handle) = boxed();
    engine.create_graph().unwrap();
    let _ = engine.state();
    let _ = engine.state();

    assert_eq!(handle.calls().len(), 3);
    assert_eq!(handle.mutating_calls().len(), 1);

    handle.clear_calls();
    assert!(handle.calls().is_empty());
}

#[test]
fn test_unknown_filter_reports_message() {
    let (mut engine, _) = boxed();
    engine.create_graph().unwrap();

    let result = engine.set_param(FilterId::new(42), "Gain", "3");
    assert_matches!(result, Err(CallFailed));
    assert_eq!(engine.last_error(), "unknown filter instance 42");
}

#[test]
fn test_injected_build_fault_leaves_state_untouched() {
    let (mut engine, handle) = boxed();
    handle.fail_on(EngineOperation::BuildGraph, "pin negotiation failed");

    engine.create_graph().unwrap();
    assert_matches!(engine.build_graph(), Err(CallFailed));
    assert_eq!(engine.last_error(), "pin negotiation failed");
    assert_eq!(handle.state(), GraphState::NotBuilt);
}

#[test]
fn test_state_serializes_as_wire_name() {
    let json = serde_json::to_string(&GraphState::NotBuilt).unwrap();
    assert_eq!(json, "\"NOT_BUILT\"");

    let mode: PlaybackMode = serde_json::from_str("\"FORWARD_LOOP\"").unwrap();
    assert_eq!(mode, PlaybackMode::ForwardLoop);

    let id: FilterId = serde_json::from_str("7").unwrap();
    assert_eq!(id.raw(), 7);
}
