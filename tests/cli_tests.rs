//! Integration tests for the wgen CLI
//!
//! These tests run the actual binary against pipeline files in a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ORDERS: &str = r#"
dag_id: orders
processes:
  - id: 3
    parent_process_id: 0
    name: Orders
  - id: 5
    parent_process_id: 3
    name: List Files
    kind: lof
    next: 7
  - id: 7
    parent_process_id: 3
    name: Load Orders
    kind: data_quality
"#;

/// Binary with an isolated config and home
fn wgen_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wgen").unwrap();
    cmd.env("WGEN_HOME", dir)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn write_pipeline(dir: &TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("orders.yaml");
    fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn test_help_flag() {
    Command::cargo_bin("wgen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("workflow DAG generator"));
}

#[test]
fn test_generate_to_stdout() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(&dir, ORDERS);

    wgen_cmd(dir.path())
        .arg("generate")
        .arg(&pipeline)
        .assert()
        .success()
        .stdout(predicate::str::contains("dag = DAG('orders'"))
        .stdout(predicate::str::contains(
            "data_quality7_Load_Orders = BranchPythonOperator",
        ))
        .stdout(predicate::str::contains(
            "# Deferred wiring\nf_lof5_List_Files()\nf_data_quality7_Load_Orders()\n",
        ));

    let definitions = fs::read_to_string(dir.path().join("defFile.txt")).unwrap();
    assert_eq!(
        definitions,
        "f_lof5_List_Files()\nf_data_quality7_Load_Orders()\n"
    );
}

#[test]
fn test_generate_to_file_without_assembly() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(&dir, ORDERS);
    let output = dir.path().join("orders_dag.py");
    let definitions = dir.path().join("defs/custom.txt");

    wgen_cmd(dir.path())
        .arg("generate")
        .arg(&pipeline)
        .arg("-o")
        .arg(&output)
        .arg("--definitions")
        .arg(&definitions)
        .arg("--no-assemble")
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 'orders' (5 nodes)"));

    let script = fs::read_to_string(&output).unwrap();
    assert!(script.contains("halt3_Orders = DummyOperator"));
    assert!(!script.contains("# Deferred wiring"));
    assert!(fs::read_to_string(&definitions)
        .unwrap()
        .contains("f_data_quality7_Load_Orders()"));
}

#[test]
fn test_generate_without_lof_fails_with_fix() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(
        &dir,
        r#"
processes:
  - id: 3
    name: Orders
  - id: 7
    parent_process_id: 3
    name: Load Orders
    kind: data_quality
"#,
    );

    wgen_cmd(dir.path())
        .arg("generate")
        .arg(&pipeline)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("WGEN-020"))
        .stderr(predicate::str::contains("Fix:"));

    assert!(!dir.path().join("defFile.txt").exists());
}

#[test]
fn test_generate_unwritable_output_keeps_definitions_untouched() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(&dir, ORDERS);

    wgen_cmd(dir.path())
        .arg("generate")
        .arg(&pipeline)
        .arg("-o")
        .arg(dir.path().join("missing/dir/orders_dag.py"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to write"));

    assert!(!dir.path().join("defFile.txt").exists());
}

#[test]
fn test_generate_next_pointing_at_root_fails() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(
        &dir,
        "processes:\n  - id: 3\n    name: Orders\n  - id: 4\n    parent_process_id: 3\n    name: Pull\n    kind: import\n    next: 3\n",
    );

    wgen_cmd(dir.path())
        .arg("generate")
        .arg(&pipeline)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("WGEN-023"));

    assert!(!dir.path().join("defFile.txt").exists());
}

#[test]
fn test_validate_text_lists_nodes() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(&dir, ORDERS);

    wgen_cmd(dir.path())
        .arg("validate")
        .arg(&pipeline)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("Nodes: 5"))
        .stdout(predicate::str::contains("lof5_List_Files"));
}

#[test]
fn test_validate_json() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(&dir, ORDERS);

    let assert = wgen_cmd(dir.path())
        .arg("validate")
        .arg(&pipeline)
        .args(["--format", "json"])
        .assert()
        .success();

    let report: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["dag_id"], "orders");
    let dq = report["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == 7)
        .unwrap();
    assert_eq!(dq["kind"], "data_quality");
    assert_eq!(dq["successor"], "end3_Orders");
    assert_eq!(dq["terminal"], "halt3_Orders");
}

#[test]
fn test_validate_unknown_kind() {
    let dir = TempDir::new().unwrap();
    let pipeline = write_pipeline(
        &dir,
        "processes:\n  - id: 1\n    name: a\n  - id: 2\n    parent_process_id: 1\n    name: b\n    kind: sqoop\n",
    );

    wgen_cmd(dir.path())
        .arg("validate")
        .arg(&pipeline)
        .assert()
        .failure()
        .stderr(predicate::str::contains("WGEN-015"));
}

#[test]
fn test_state_merges_logs() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("bdre/airflow");
    fs::create_dir_all(&state_dir).unwrap();
    fs::write(
        state_dir.join("3_jobInfo.txt"),
        "initJobInfo.getInstanceExecId()::41\nnote::a::b\n",
    )
    .unwrap();
    fs::write(
        state_dir.join("etldriverInfo.txt"),
        "getETLDriverInfo.getFileList()::/in/a.csv\ninitJobInfo.getInstanceExecId()::42\n",
    )
    .unwrap();

    wgen_cmd(dir.path())
        .args(["state", "--parent", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("initJobInfo.getInstanceExecId()::42"))
        .stdout(predicate::str::contains("note::a::b"))
        .stdout(predicate::str::contains("getETLDriverInfo.getFileList()::/in/a.csv"));
}
