//! Graph lifecycle and parameter routes, mounted under `/graph`.

use crate::error::{Error, Result};
use crate::server::AppContext;
use crate::session::FilterInstance;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use mvgraph_compiler::{source, CompiledGraph, ParameterBindings, SourceFormat};
use mvgraph_engine::PlaybackMode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

pub fn graph_routes() -> Router<AppContext> {
    Router::new()
        .route("/load", post(load_graph))
        .route("/build", post(build_graph))
        .route("/run", post(run_graph))
        .route("/build_run", post(build_and_run))
        .route("/stop", post(stop_graph))
        .route("/pause", post(pause_graph))
        .route("/resume", post(resume_graph))
        .route("/terminate", post(terminate_graph))
        .route("/state", get(graph_state))
        .route("/filters", get(list_filters))
        .route("/play_mode", get(get_play_mode).post(set_play_mode))
        .route("/filter_param", get(get_filter_param).post(set_filter_param))
        .route("/filter_params", get(get_filter_params))
        .route("/set_params", post(set_params))
        .route("/available_filters", get(available_filters))
        .route("/filter_guid", get(filter_guid))
        .route("/filter_name", get(filter_name))
        .route("/source_info", get(source_info))
}

// ============================================================================
// Loading
// ============================================================================

/// A graph description given either as a file path or inline text.
#[derive(Debug, Default, Deserialize)]
struct GraphSource {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default)]
    text: Option<String>,
    /// Format of `text`; paths use their extension.
    #[serde(default)]
    format: Option<SourceFormat>,
    #[serde(default)]
    params: ParameterBindings,
}

struct Compiled {
    format: SourceFormat,
    graph: CompiledGraph,
    materialized_path: Option<PathBuf>,
}

/// Compile a request on the blocking pool; file sources are read from disk
/// and, with `materialize`, written back next to the source.
async fn compile_request(
    ctx: &AppContext,
    req: GraphSource,
    materialize: bool,
) -> Result<Compiled> {
    let bindings = ctx.bindings(&req.params);
    let options = ctx.options.clone();

    match (req.path, req.text) {
        (Some(path), None) => {
            tokio::task::spawn_blocking(move || -> Result<Compiled> {
                if materialize {
                    let (loaded, target) =
                        source::load_and_materialize(&path, &bindings, &options)?;
                    Ok(Compiled {
                        format: loaded.format,
                        graph: loaded.compiled,
                        materialized_path: Some(target),
                    })
                } else {
                    let loaded = source::load(&path, &bindings, &options)?;
                    Ok(Compiled {
                        format: loaded.format,
                        graph: loaded.compiled,
                        materialized_path: None,
                    })
                }
            })
            .await?
        }
        (None, Some(text)) => {
            let format = req.format.unwrap_or(SourceFormat::Text);
            let graph = source::compile_source(&text, format, &bindings, &options)?;
            Ok(Compiled {
                format,
                graph,
                materialized_path: None,
            })
        }
        (Some(_), Some(_)) => Err(Error::invalid_request(
            "give either a path or inline text, not both",
        )),
        (None, None) => Err(Error::invalid_request("a path or inline text is required")),
    }
}

/// Compile a graph and stage it for the next build.
async fn load_graph(
    State(ctx): State<AppContext>,
    Json(req): Json<GraphSource>,
) -> Result<Json<Value>> {
    let compiled = compile_request(&ctx, req, true).await?;
    let directives = compiled.graph.sequence.len();
    ctx.session.stage(compiled.graph.sequence).await;

    Ok(Json(json!({
        "status": "loaded",
        "format": compiled.format,
        "directives": directives,
        "materialized": compiled.graph.materialized,
        "materialized_path": compiled.materialized_path,
    })))
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Filters as `{symbolic_name: id}`, in engine id order.
fn filter_map(filters: &[FilterInstance]) -> serde_json::Map<String, Value> {
    filters
        .iter()
        .map(|f| (f.symbolic_name.clone(), json!(f.id)))
        .collect()
}

async fn build_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let filters = ctx.session.build().await?;
    Ok(Json(json!({
        "state": ctx.session.state(),
        "filters": filter_map(&filters),
    })))
}

async fn start_playback(ctx: &AppContext) -> Result<PlaybackMode> {
    let handle = ctx.session.play().await?;
    let mode = handle.mode();
    tokio::spawn(async move {
        if let Err(e) = handle.wait().await {
            tracing::error!("Playback failed: {}", e);
        }
    });
    Ok(mode)
}

async fn run_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let mode = start_playback(&ctx).await?;
    Ok(Json(json!({ "status": "playing", "mode": mode })))
}

async fn build_and_run(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let filters = ctx.session.build().await?;
    let mode = start_playback(&ctx).await?;
    Ok(Json(json!({
        "status": "playing",
        "mode": mode,
        "filters": filter_map(&filters),
    })))
}

async fn stop_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    ctx.session.stop().await?;
    Ok(Json(json!({ "state": ctx.session.state() })))
}

async fn pause_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    ctx.session.pause().await?;
    Ok(Json(json!({ "state": ctx.session.state() })))
}

async fn resume_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    ctx.session.resume().await?;
    Ok(Json(json!({ "state": ctx.session.state() })))
}

async fn terminate_graph(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    if !ctx.session.needs_teardown().await {
        return Err(Error::NoGraphLoaded);
    }
    ctx.session.destroy().await?;
    Ok(Json(json!({ "status": "terminated", "state": ctx.session.state() })))
}

async fn graph_state(State(ctx): State<AppContext>) -> Json<Value> {
    let state = ctx.session.state();
    Json(json!({
        "state": state,
        "active": state.is_active(),
        "playback_mode": ctx.session.playback_mode().await,
    }))
}

async fn list_filters(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    if !ctx.session.is_active() {
        return Err(Error::NoGraphLoaded);
    }
    let filters = ctx.session.attached_filters().await;
    Ok(Json(Value::Object(filter_map(&filters))))
}

// ============================================================================
// Playback mode
// ============================================================================

async fn get_play_mode(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let mode = ctx
        .session
        .playback_mode()
        .await
        .ok_or(Error::NoPlaybackMode)?;
    Ok(Json(json!({ "mode": mode, "code": mode.code() })))
}

#[derive(Deserialize)]
struct PlayModeRequest {
    /// Engine code (`255`) or name (`"forward_loop"`).
    mode: Value,
}

async fn set_play_mode(
    State(ctx): State<AppContext>,
    Json(req): Json<PlayModeRequest>,
) -> Result<Json<Value>> {
    let raw = match req.mode {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => return Err(Error::InvalidPlaybackMode(other.to_string())),
    };
    let mode: PlaybackMode = raw
        .parse()
        .map_err(|_| Error::InvalidPlaybackMode(raw.clone()))?;

    ctx.session.set_playback_mode(mode).await?;
    Ok(Json(json!({ "mode": mode, "code": mode.code() })))
}

// ============================================================================
// Filter parameters
// ============================================================================

#[derive(Deserialize)]
struct FilterParamQuery {
    filter: String,
    param: String,
}

async fn get_filter_param(
    State(ctx): State<AppContext>,
    Query(query): Query<FilterParamQuery>,
) -> Result<Json<Value>> {
    let value = ctx.session.get_parameter(&query.filter, &query.param).await?;
    Ok(Json(json!({
        "filter": query.filter,
        "param": query.param,
        "value": value,
    })))
}

#[derive(Deserialize)]
struct SetFilterParamRequest {
    filter: String,
    param: String,
    value: String,
}

async fn set_filter_param(
    State(ctx): State<AppContext>,
    Json(req): Json<SetFilterParamRequest>,
) -> Result<Json<Value>> {
    let value = ctx
        .session
        .set_parameter(&req.filter, &req.param, &req.value)
        .await?;
    Ok(Json(json!({
        "filter": req.filter,
        "param": req.param,
        "value": value,
    })))
}

#[derive(Deserialize)]
struct FilterQuery {
    filter: String,
}

/// Split the engine's `name=value` lines into an object.
fn parse_param_lines(raw: &str) -> serde_json::Map<String, Value> {
    raw.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), Value::String(v.trim().to_string())))
        .collect()
}

async fn get_filter_params(
    State(ctx): State<AppContext>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Value>> {
    let raw = ctx.session.get_parameters(&query.filter).await?;
    Ok(Json(json!({
        "filter": query.filter,
        "params": parse_param_lines(&raw),
    })))
}

/// Compile a graph and apply only its `setparams` directives.
async fn set_params(
    State(ctx): State<AppContext>,
    Json(req): Json<GraphSource>,
) -> Result<Json<Value>> {
    let compiled = compile_request(&ctx, req, false).await?;
    let report = ctx.session.apply_parameters(compiled.graph.sequence).await?;
    Ok(Json(json!({
        "status": "applied",
        "executed": report.executed,
        "skipped": report.skipped,
    })))
}

// ============================================================================
// Engine catalog
// ============================================================================

async fn available_filters(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    ctx.session.list_available_filters().await?;
    Ok(Json(json!({ "status": "listed" })))
}

#[derive(Deserialize)]
struct FilterTypeQuery {
    name: String,
}

async fn filter_guid(
    State(ctx): State<AppContext>,
    Query(query): Query<FilterTypeQuery>,
) -> Result<Json<Value>> {
    let guid = ctx.session.filter_guid(&query.name).await?;
    Ok(Json(json!({ "name": query.name, "guid": guid })))
}

#[derive(Deserialize)]
struct FilterGuidQuery {
    guid: String,
}

async fn filter_name(
    State(ctx): State<AppContext>,
    Query(query): Query<FilterGuidQuery>,
) -> Result<Json<Value>> {
    let name = ctx.session.filter_type_name(&query.guid).await?;
    Ok(Json(json!({ "guid": query.guid, "name": name })))
}

async fn source_info(State(ctx): State<AppContext>) -> Result<Json<Value>> {
    let info = ctx.session.source_info().await?;
    Ok(Json(json!({ "info": info })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param_lines() {
        let params = parse_param_lines("Exposure=12\nGain = 3\ngarbage\n");
        assert_eq!(params.len(), 2);
        assert_eq!(params["Exposure"], "12");
        assert_eq!(params["Gain"], "3");
    }
}
