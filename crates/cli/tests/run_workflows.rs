//! End-to-end tests driving the compiled `rusty-automation-tool` binary
//! directly, covering scenarios that require the `__invoke-function`
//! re-exec path to be handled by the real binary rather than a test
//! harness.

use std::io::Write;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rusty-automation-tool"))
}

fn workflow_file(json: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(json.as_bytes()).unwrap();
    f
}

#[test]
fn sequential_success_returns_zero() {
    let f = workflow_file(
        r#"{
            "name": "wf",
            "root": {
                "name": "root",
                "children": [
                    {"name": "a", "executable": {"kind": "command", "cmd": "echo a"}},
                    {"name": "b", "executable": {"kind": "command", "cmd": "echo b"}}
                ]
            }
        }"#,
    );
    let output = bin().arg("run").arg(f.path()).output().unwrap();
    assert!(output.status.success());
}

#[test]
fn sequential_fail_stop_returns_one() {
    // S2: root(sequential, ignore_failure=false) -> [A: no-such-cmd, B: echo ok]
    let f = workflow_file(
        r#"{
            "name": "wf",
            "root": {
                "name": "root",
                "children": [
                    {"name": "a", "executable": {"kind": "command", "cmd": "no-such-cmd"}},
                    {"name": "b", "executable": {"kind": "command", "cmd": "echo ok"}}
                ]
            }
        }"#,
    );
    let output = bin().arg("run").arg(f.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn function_executable_invokes_registered_target() {
    // S6: FunctionExec target printing args/kwargs.
    let f = workflow_file(
        r#"{
            "name": "wf",
            "root": {
                "name": "root",
                "executable": {
                    "kind": "function",
                    "target": "demo.print_args",
                    "args": [1, 2],
                    "kwargs": {"a": 3}
                }
            }
        }"#,
    );
    let output = bin().arg("run").arg(f.path()).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("args=[Number(1), Number(2)]"), "stdout was: {stdout}");
    assert!(stdout.contains("\"a\": Number(3)"), "stdout was: {stdout}");
}

#[test]
fn validate_reports_node_count() {
    let f = workflow_file(
        r#"{
            "name": "wf",
            "root": {
                "name": "root",
                "children": [
                    {"name": "a"},
                    {"name": "b"}
                ]
            }
        }"#,
    );
    let output = bin().arg("validate").arg(f.path()).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 node(s)"), "stdout was: {stdout}");
}

#[test]
fn validate_rejects_duplicate_sibling_names() {
    let f = workflow_file(
        r#"{
            "name": "wf",
            "root": {
                "name": "root",
                "children": [
                    {"name": "dup"},
                    {"name": "dup"}
                ]
            }
        }"#,
    );
    let output = bin().arg("validate").arg(f.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}
