//! CLI end-to-end tests
//!
//! Tests for the mvgraph command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const XML_GRAPH: &str = r#"<mvxpipeline playmode="1" playspeed="3">
  <filter name="Camera">
    <parameter name="Device" value="$DEVICE$"/>
  </filter>
  <filter name="Encoder"/>
</mvxpipeline>"#;

const CANONICAL_GRAPH: &str = "\
creategraph~pipeline~b
createfilterbyname~Camera~camera_1~b
attachfilter~pipeline~camera_1~b
rungraph~pipeline~1~b
";

/// Get a command for the mvgraph binary, run from `dir` so no stray config
/// file is picked up
#[allow(deprecated)]
fn mvgraph_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mvgraph").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    mvgraph_cmd(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let dir = tempdir().unwrap();
    mvgraph_cmd(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mvgraph"))
        .stdout(predicate::str::contains("compile"));
}

#[test]
fn test_cli_version_command() {
    let dir = tempdir().unwrap();
    mvgraph_cmd(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mvgraph "));
}

#[test]
fn test_cli_compile_writes_materialized_file() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("studio.xml");
    fs::write(&input, XML_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "studio.xml", "DEVICE=/dev/video0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("studio_from_xml.txt"));

    let text = fs::read_to_string(dir.path().join("studio_from_xml.txt")).unwrap();
    assert!(text.contains("setParams~camera_1~Device~/dev/video0~b"));
    assert!(text.contains("createfilterbyname~#BlockFPS~blockfps~b"));
    assert!(text.contains("setParams~blockfps~Framerate~25~b"));
}

#[test]
fn test_cli_compile_stdout() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("studio.xml"), XML_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "studio.xml", "DEVICE=cam0", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SetMemoryPool~1000~b\n"))
        .stdout(predicate::str::contains("runGraph~pipeline~1~b"));

    assert!(!dir.path().join("studio_from_xml.txt").exists());
}

#[test]
fn test_cli_compile_output_path() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("graph.txt"), CANONICAL_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "graph.txt", "-o", "out.txt"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(text, CANONICAL_GRAPH);
}

#[test]
fn test_cli_compile_missing_parameter() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("studio.xml"), XML_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "studio.xml", "--stdout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEVICE"));
}

#[test]
fn test_cli_compile_malformed_binding() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("studio.xml"), XML_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "studio.xml", "DEVICE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_cli_compile_unsupported_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("graph.yaml"), "graph: {}").unwrap();

    mvgraph_cmd(dir.path())
        .args(["compile", "graph.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported graph format"));
}

#[test]
fn test_cli_compile_nonexistent_file() {
    let dir = tempdir().unwrap();
    mvgraph_cmd(dir.path())
        .args(["compile", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_run_for_duration() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("graph.txt"), CANONICAL_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["run", "graph.txt", "--duration", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Built graph with 1 filters"))
        .stdout(predicate::str::contains("Playing (forward_loop)"));

    let materialized = fs::read_to_string(dir.path().join("graph_from_txt.txt")).unwrap();
    assert_eq!(materialized, CANONICAL_GRAPH);
}

#[test]
fn test_cli_run_materializes_xml_source() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("studio.xml"), XML_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["run", "studio.xml", "DEVICE=cam0", "--duration", "0"])
        .assert()
        .success();

    let text = fs::read_to_string(dir.path().join("studio_from_xml.txt")).unwrap();
    assert!(text.contains("setParams~camera_1~Device~cam0~b"));
}

#[test]
fn test_cli_run_mode_override() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("graph.txt"), CANONICAL_GRAPH).unwrap();

    mvgraph_cmd(dir.path())
        .args(["run", "graph.txt", "--mode", "realtime", "--duration", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Playing (realtime)"));
}

#[test]
fn test_cli_run_build_failure() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("graph.txt"),
        "creategraph~g~b\nattachfilter~g~ghost~b\n",
    )
    .unwrap();

    mvgraph_cmd(dir.path())
        .args(["run", "graph.txt", "--duration", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_cli_config_validation() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("mvgraph.toml");
    fs::write(
        &config,
        "[engine]\nmemory_pool = 4096\n\n[server]\nport = 9100\n",
    )
    .unwrap();

    mvgraph_cmd(dir.path())
        .args(["validate", "mvgraph.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("9100"));
}

#[test]
fn test_cli_config_validation_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.toml"), "[engine]\nmemory_pool = 90000\n").unwrap();

    mvgraph_cmd(dir.path())
        .args(["validate", "bad.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memory pool"));
}

#[test]
fn test_cli_native_backend_unavailable() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("graph.txt"), CANONICAL_GRAPH).unwrap();
    fs::write(
        dir.path().join("mvgraph.toml"),
        "[engine]\nbackend = \"native\"\nplugin_path = \"/opt/mvx/plugins\"\n",
    )
    .unwrap();

    let assert = mvgraph_cmd(dir.path())
        .args(["run", "graph.txt", "--duration", "0"])
        .assert();
    if cfg!(not(feature = "native-engine")) {
        assert
            .failure()
            .stderr(predicate::str::contains("native-engine"));
    }
}
