//! Front-end converter integration tests
//!
//! Converts XML and JSON documents and checks the compiled command sequences.

use mvgraph_compiler::{
    compile, compile_source, hierarchical, load_and_materialize, CommandKind, ConvertOptions,
    ParameterBindings, SourceFormat,
};
use std::fs;
use tempfile::tempdir;

const TWO_CAMERAS: &str = r#"<?xml version="1.0"?>
<root>
  <mvxpipeline playmode="1" playspeed="0"/>
  <filter name="Camera">
    <parameter name="Device" value="0"/>
  </filter>
  <filter name="Camera">
    <parameter name="Device" value="1"/>
  </filter>
  <filter name="Mixer"/>
</root>
"#;

fn xml_with_speed(speed: &str, filters: &[&str]) -> String {
    let body: String = filters
        .iter()
        .map(|f| format!(r#"<filter name="{f}"/>"#))
        .collect();
    format!(r#"<mvxpipeline playmode="0" playspeed="{speed}">{body}</mvxpipeline>"#)
}

fn compiled(format: SourceFormat, source: &str) -> mvgraph_compiler::CompiledGraph {
    compile_source(
        source,
        format,
        &ParameterBindings::new(),
        &ConvertOptions::default(),
    )
    .unwrap()
}

fn rendered(graph: &mvgraph_compiler::CompiledGraph) -> Vec<String> {
    graph.sequence.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_same_type_filters_are_numbered_in_order() {
    let graph = compiled(SourceFormat::Xml, TWO_CAMERAS);
    let lines = rendered(&graph);

    assert_eq!(lines[1], "createfilterbyname~Camera~camera_1~b");
    assert_eq!(lines[2], "setParams~camera_1~Device~0~b");
    assert_eq!(lines[3], "createfilterbyname~Camera~camera_2~b");
    assert_eq!(lines[4], "setParams~camera_2~Device~1~b");
    assert_eq!(lines[5], "createfilterbyname~Mixer~mixer_1~b");
}

#[test]
fn test_unbounded_speed_has_no_limiter() {
    let graph = compiled(SourceFormat::Xml, &xml_with_speed("0", &["Reader", "Viewer"]));
    assert!(graph.materialized.lines().all(|l| !l.contains("BlockFPS")));
}

#[test]
fn test_native_speed_has_no_limiter() {
    let graph = compiled(SourceFormat::Xml, &xml_with_speed("1", &["Reader", "Viewer"]));
    assert!(graph.materialized.lines().all(|l| !l.contains("blockfps")));
}

#[test]
fn test_limiter_follows_first_filter() {
    let graph = compiled(
        SourceFormat::Xml,
        &xml_with_speed("3", &["Reader", "Decoder", "Viewer"]),
    );
    let lines = rendered(&graph);

    assert_eq!(lines[1], "createfilterbyname~Reader~reader_1~b");
    assert_eq!(lines[2], "createfilterbyname~#BlockFPS~blockfps~b");
    assert_eq!(lines[3], "setParams~blockfps~Buffer size~1~b");
    assert_eq!(lines[4], "setParams~blockfps~Framerate~25~b");
    assert_eq!(lines[5], "setParams~blockfps~Drop frames when occupied~False~b");
    assert_eq!(lines[6], "createfilterbyname~Decoder~decoder_1~b");

    let limiters = lines.iter().filter(|l| l.contains("#BlockFPS")).count();
    assert_eq!(limiters, 1);
    assert!(lines.contains(&"attachFilter~pipeline~blockfps~b".to_string()));
}

#[test]
fn test_limiter_with_single_filter() {
    let graph = compiled(SourceFormat::Xml, &xml_with_speed("8", &["Reader"]));
    let lines = rendered(&graph);

    assert_eq!(lines[2], "createfilterbyname~#BlockFPS~blockfps~b");
    assert_eq!(lines[4], "setParams~blockfps~Framerate~1~b");
}

#[test]
fn test_xml_closing_sections() {
    let graph = compiled(SourceFormat::Xml, &xml_with_speed("0", &["Reader", "Viewer"]));
    let lines = rendered(&graph);

    assert_eq!(
        &lines[3..],
        &[
            "createGraph~pipeline~b",
            "attachFilter~pipeline~reader_1~b",
            "attachFilter~pipeline~viewer_1~b",
            "runGraph~pipeline~0~b",
        ]
    );
    // parameter dumps and cleanup stay commented out
    assert!(graph.materialized.lines().filter(|l| *l == "##").count() > 10);
    assert_eq!(graph.sequence.count(CommandKind::GetParams), 0);
    assert_eq!(graph.sequence.count(CommandKind::DeleteFilter), 0);
}

#[test]
fn test_flat_three_filters_compile_to_twelve_directives() {
    let json = r#"[
        {"id": "Reader", "name": "src", "params": {}},
        {"id": "Decoder", "name": "dec", "params": {}},
        {"id": "Viewer", "name": "out", "params": {}}
    ]"#;
    let graph = compiled(SourceFormat::Json, json);
    let lines = rendered(&graph);

    assert_eq!(
        lines,
        vec![
            "SetMemoryPool~1000~b",
            "createfilterbyname~Reader~src~b",
            "createfilterbyname~Decoder~dec~b",
            "createfilterbyname~Viewer~out~b",
            "createGraph~pipeline~b",
            "attachFilter~pipeline~src~b",
            "attachFilter~pipeline~dec~b",
            "attachFilter~pipeline~out~b",
            "getParams~pipeline~src~b",
            "getParams~pipeline~dec~b",
            "getParams~pipeline~out~b",
            "runGraph~pipeline~255~b",
        ]
    );
}

#[test]
fn test_flat_keeps_duplicate_names_verbatim() {
    let json = r#"[{"id": "Camera", "name": "cam"}, {"id": "Camera", "name": "cam"}]"#;
    let graph = compiled(SourceFormat::Json, json);
    assert_eq!(graph.sequence.count(CommandKind::CreateFilterByName), 2);
    assert!(graph
        .sequence
        .iter()
        .filter(|c| c.kind == CommandKind::CreateFilterByName)
        .all(|c| c.args[1] == "cam"));
}

#[test]
fn test_convert_options_are_applied() {
    let options = ConvertOptions {
        graph_name: "studio".to_string(),
        memory_pool: 4000,
    };
    let text = hierarchical::to_canonical(&xml_with_speed("0", &["Reader"]), &options).unwrap();
    assert!(text.starts_with("SetMemoryPool~4000~b\n"));
    assert!(text.contains("createGraph~studio~b\n"));
}

#[test]
fn test_materialized_text_recompiles_identically() {
    let mut bindings = ParameterBindings::new();
    bindings.insert("DEVICE".to_string(), "2".to_string());
    let xml = r#"<mvxpipeline playmode="1" playspeed="4">
        <filter name="Camera"><parameter name="Device" value="$DEVICE$"/></filter>
        <filter name="Viewer"/>
    </mvxpipeline>"#;

    let first = compile_source(xml, SourceFormat::Xml, &bindings, &ConvertOptions::default())
        .unwrap();
    let second = compile(&first.materialized, &ParameterBindings::new()).unwrap();

    assert_eq!(first.sequence, second.sequence);
    assert_eq!(first.materialized, second.materialized);
}

#[test]
fn test_compilation_is_deterministic() {
    let a = compiled(SourceFormat::Xml, TWO_CAMERAS);
    let b = compiled(SourceFormat::Xml, TWO_CAMERAS);
    assert_eq!(a, b);
}

#[test]
fn test_canonical_text_without_tokens_is_idempotent() {
    let text = "SetMemoryPool~1000~b\n\n# filters\ncreateGraph~g~b\nrunGraph~g~1~b\n";
    let graph = compile(text, &ParameterBindings::new()).unwrap();
    assert_eq!(
        graph.materialized,
        "SetMemoryPool~1000~b\n##\n##\ncreateGraph~g~b\nrunGraph~g~1~b\n"
    );
}

#[test]
fn test_load_and_materialize_writes_sibling_file() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("live.json");
    fs::write(
        &source,
        r#"[{"ID": "Reader", "Name": "src", "PARAMS": {"Path": "$INPUT$"}}]"#,
    )
    .unwrap();

    let mut bindings = ParameterBindings::new();
    bindings.insert("INPUT".to_string(), "/media/a.mvx".to_string());

    let (loaded, target) =
        load_and_materialize(&source, &bindings, &ConvertOptions::default()).unwrap();

    assert_eq!(loaded.format, SourceFormat::Json);
    assert_eq!(target, dir.path().join("live_from_json.txt"));

    let written = fs::read_to_string(&target).unwrap();
    assert_eq!(written, loaded.compiled.materialized);
    assert!(written.contains("setParams~src~Path~/media/a.mvx~b\n"));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = mvgraph_compiler::load(
        &dir.path().join("absent.txt"),
        &ParameterBindings::new(),
        &ConvertOptions::default(),
    );
    assert!(matches!(result, Err(mvgraph_compiler::Error::Io(_))));
}
