/*!
 * Gate Scenario Tests
 * End-to-end write/read behavior against a temporary sandbox
 */

use pretty_assertions::assert_eq;
use sandbox_gate::{status_code, ErrorCode, FileGate, Gate, GateConfig, GateError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_sandbox() -> (TempDir, PathBuf, Gate) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("sandbox");
    fs::create_dir(&root).unwrap();
    let gate = Gate::new(&root).unwrap();
    (temp, root, gate)
}

#[test]
fn test_write_then_read() {
    let (_temp, root, gate) = setup_sandbox();

    gate.write("hello.txt", b"hi").unwrap();

    assert_eq!(gate.read("hello.txt").unwrap(), b"hi".to_vec());
    assert_eq!(fs::read(root.join("hello.txt")).unwrap(), b"hi".to_vec());
}

#[test]
fn test_parent_traversal_blocked() {
    let (temp, _root, gate) = setup_sandbox();

    let result = gate.write("../escape.txt", b"x");

    assert_eq!(result, Err(GateError::PathEscape));
    assert_eq!(status_code(&result), ErrorCode::PathEscape.as_i32());
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_read_missing() {
    let (_temp, _root, gate) = setup_sandbox();

    let result = gate.read("missing.txt");

    assert_eq!(result, Err(GateError::NotFound("missing.txt".to_string())));
    assert_eq!(status_code(&result), ErrorCode::NotFound.as_i32());
}

#[test]
fn test_nested_write_creates_directories_under_root() {
    let (temp, root, gate) = setup_sandbox();

    gate.write("a/b/c.txt", b"y").unwrap();

    assert!(root.join("a").is_dir());
    assert!(root.join("a/b").is_dir());
    assert_eq!(fs::read(root.join("a/b/c.txt")).unwrap(), b"y".to_vec());
    assert!(!temp.path().join("a").exists());
}

#[test]
fn test_overwrite_replaces_content() {
    let (_temp, _root, gate) = setup_sandbox();

    gate.write("notes.txt", b"a much longer first version").unwrap();
    gate.write("notes.txt", b"short").unwrap();

    assert_eq!(gate.read("notes.txt").unwrap(), b"short".to_vec());
}

#[test]
fn test_empty_content_roundtrip() {
    let (_temp, _root, gate) = setup_sandbox();

    gate.write("empty.bin", b"").unwrap();

    assert_eq!(gate.read("empty.bin").unwrap(), Vec::<u8>::new());
}

#[test]
fn test_directory_is_not_a_readable_target() {
    let (_temp, root, gate) = setup_sandbox();
    fs::create_dir(root.join("docs")).unwrap();

    assert!(matches!(gate.read("docs"), Err(GateError::NotAFile(_))));
    assert!(matches!(gate.write("docs", b"x"), Err(GateError::NotAFile(_))));
    assert!(root.join("docs").is_dir());
}

#[test]
fn test_root_is_never_a_target() {
    let (_temp, _root, gate) = setup_sandbox();

    for name in [".", "./", "sub/..", "a/b/../.."] {
        assert!(
            matches!(gate.write(name, b"x"), Err(GateError::InvalidInput(_))),
            "{} should be rejected",
            name
        );
        assert!(matches!(gate.read(name), Err(GateError::InvalidInput(_))));
    }
}

#[test]
fn test_invalid_names() {
    let (_temp, _root, gate) = setup_sandbox();

    assert!(matches!(gate.write("", b"x"), Err(GateError::InvalidInput(_))));
    assert!(matches!(
        gate.write("evil\0.txt", b"x"),
        Err(GateError::InvalidInput(_))
    ));
    assert_eq!(
        gate.read("").unwrap_err().code(),
        ErrorCode::InvalidInput
    );
}

#[test]
fn test_through_trait_object() {
    let (_temp, root, gate) = setup_sandbox();
    let gate: &dyn FileGate = &gate;

    gate.write("trait.txt", b"dyn").unwrap();

    assert_eq!(gate.root(), root.as_path());
    assert_eq!(gate.read("trait.txt").unwrap(), b"dyn".to_vec());
}

#[test]
fn test_sync_writes() {
    let (_temp, root, _gate) = setup_sandbox();
    let gate = Gate::with_config(GateConfig::new(&root).with_sync_writes(true)).unwrap();

    gate.write("durable.txt", b"fsynced").unwrap();

    assert_eq!(gate.read("durable.txt").unwrap(), b"fsynced".to_vec());
}

#[test]
fn test_gate_reverifies_root_each_call() {
    let (_temp, root, gate) = setup_sandbox();
    gate.write("before.txt", b"1").unwrap();

    fs::remove_dir_all(&root).unwrap();

    assert!(matches!(
        gate.write("after.txt", b"2"),
        Err(GateError::InvalidRoot(_))
    ));
}
