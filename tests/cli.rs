// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 dagc contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn demo(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn dagc(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("dagc").unwrap();
    cmd.current_dir(cwd).env_remove("DAGC_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn compile_prints_pipeline_run() {
    let temp = TempDir::new().unwrap();

    dagc(temp.path())
        .arg("compile")
        .arg(demo("hello-world.yaml"))
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: PipelineRun"))
        .stdout(predicate::str::contains("generateName: hello-world-"))
        .stdout(predicate::str::contains("name: root-driver"))
        .stdout(predicate::str::contains("name: publisher-hello"));
}

#[test]
fn compile_writes_json_file() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("run.json");

    dagc(temp.path())
        .arg("compile")
        .arg(demo("nested.yaml"))
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .arg("-f")
        .arg("json")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let run: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    let tasks = run["spec"]["pipelineSpec"]["tasks"].as_array().unwrap();

    // 5 leaves, 1 composite, 1 root driver
    assert_eq!(tasks.len(), 3 * 5 + 1 + 1);
    assert_eq!(run["apiVersion"], "tekton.dev/v1beta1");
    assert_eq!(run["spec"]["params"][0]["name"], "task-spec");
}

#[test]
fn compile_uses_config_bindings() {
    let temp = TempDir::new().unwrap();
    std::fs::copy(demo("dagc.toml"), temp.path().join("dagc.toml")).unwrap();

    dagc(temp.path())
        .arg("compile")
        .arg(demo("nested.yaml"))
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name: kfp-gpu-executor"));
}

#[test]
fn compile_reports_missing_executor() {
    let temp = TempDir::new().unwrap();
    let deployment = temp.path().join("empty.yaml");
    std::fs::write(&deployment, "executors: {}\n").unwrap();

    dagc(temp.path())
        .arg("compile")
        .arg(demo("hello-world.yaml"))
        .arg("-d")
        .arg(&deployment)
        .assert()
        .failure()
        .stderr(predicate::str::contains("comp-hello"));
}

#[test]
fn validate_accepts_demo_pipeline() {
    let temp = TempDir::new().unwrap();

    dagc(temp.path())
        .arg("validate")
        .arg(demo("nested.yaml"))
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is valid!"))
        .stdout(predicate::str::contains("Compiled tasks: 17"));
}

#[test]
fn validate_rejects_cycle() {
    let temp = TempDir::new().unwrap();
    let pipeline = temp.path().join("cycle.yaml");
    std::fs::write(
        &pipeline,
        r#"
name: cycle
tasks:
  - name: a
    componentRef: comp-hello
    dependencies: [b]
  - name: b
    componentRef: comp-hello
    dependencies: [a]
"#,
    )
    .unwrap();

    dagc(temp.path())
        .arg("validate")
        .arg(&pipeline)
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Cyclic dependency"));
}

#[test]
fn graph_renders_root_dag() {
    let temp = TempDir::new().unwrap();

    dagc(temp.path())
        .arg("graph")
        .arg(demo("nested.yaml"))
        .arg("-f")
        .arg("mermaid")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graph"))
        .stdout(predicate::str::contains("training"));
}

#[test]
fn graph_renders_compiled_run() {
    let temp = TempDir::new().unwrap();

    dagc(temp.path())
        .arg("graph")
        .arg(demo("nested.yaml"))
        .arg("--compiled")
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .arg("-f")
        .arg("dot")
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph"))
        .stdout(predicate::str::contains("dag-driver-training"));
}

#[test]
fn missing_pipeline_file_fails() {
    let temp = TempDir::new().unwrap();

    dagc(temp.path())
        .arg("compile")
        .arg("does-not-exist.yaml")
        .arg("-d")
        .arg(demo("deployment.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}
