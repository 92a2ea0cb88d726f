/*!
 * Path Traversal Tests
 * `..`, absolute and prefix-confusion requests against the gate
 */

use sandbox_gate::{Gate, GateError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup_sandbox() -> (TempDir, PathBuf, Gate) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("root");
    fs::create_dir(&root).unwrap();
    let gate = Gate::new(&root).unwrap();
    (temp, root, gate)
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_dot_dot_escapes_rejected() {
    let (temp, _root, gate) = setup_sandbox();

    for name in [
        "../escape.txt",
        "../../escape.txt",
        "a/../../escape.txt",
        "a/b/../../../escape.txt",
        "./../escape.txt",
        "..",
    ] {
        assert_eq!(gate.write(name, b"x"), Err(GateError::PathEscape), "{}", name);
        assert_eq!(gate.read(name), Err(GateError::PathEscape), "{}", name);
    }

    assert_eq!(entries(temp.path()), vec!["root".to_string()]);
}

#[test]
fn test_escape_to_existing_file_looks_like_escape_to_missing_file() {
    let (temp, _root, gate) = setup_sandbox();
    fs::write(temp.path().join("real.txt"), b"secret").unwrap();

    let existing = gate.read("../real.txt").unwrap_err();
    let missing = gate.read("../ghost.txt").unwrap_err();

    assert_eq!(existing, missing);
    assert_eq!(existing.to_string(), missing.to_string());
    assert_eq!(fs::read(temp.path().join("real.txt")).unwrap(), b"secret".to_vec());
}

#[test]
fn test_prefix_sibling_rejected() {
    let (temp, _root, gate) = setup_sandbox();
    let sibling = temp.path().join("root-evil");
    fs::create_dir(&sibling).unwrap();

    assert_eq!(
        gate.write("../root-evil/loot.txt", b"x"),
        Err(GateError::PathEscape)
    );
    assert!(!sibling.join("loot.txt").exists());
}

#[test]
fn test_absolute_paths() {
    let (temp, root, gate) = setup_sandbox();
    let root = root.canonicalize().unwrap();

    let outside = temp.path().canonicalize().unwrap().join("abs.txt");
    assert_eq!(
        gate.write(outside.to_str().unwrap(), b"x"),
        Err(GateError::PathEscape)
    );
    assert!(!outside.exists());

    let inside = root.join("abs.txt");
    gate.write(inside.to_str().unwrap(), b"inside").unwrap();
    assert_eq!(gate.read("abs.txt").unwrap(), b"inside".to_vec());

    let sneaky = format!("{}/../abs.txt", root.display());
    assert_eq!(gate.write(&sneaky, b"x"), Err(GateError::PathEscape));
}

#[test]
fn test_cancelling_segments_resolve_inside() {
    let (_temp, root, gate) = setup_sandbox();

    gate.write("a/../hello.txt", b"one").unwrap();
    assert_eq!(fs::read(root.join("hello.txt")).unwrap(), b"one".to_vec());

    fs::create_dir(root.join("sub")).unwrap();
    gate.write("sub/../sub/./inner.txt", b"two").unwrap();
    assert_eq!(gate.read("sub/inner.txt").unwrap(), b"two".to_vec());
    assert_eq!(gate.read("./sub/../sub/inner.txt").unwrap(), b"two".to_vec());

    // Missing intermediate directories named only to be cancelled are not created
    assert!(!root.join("a").exists());
}

/// Outcome of a read and a write of `name` with `outside_setup` applied to the
/// directory that contains the root
fn outcomes_with<F: FnOnce(&Path)>(
    name: &str,
    outside_setup: F,
) -> (Result<Vec<u8>, GateError>, Result<(), GateError>) {
    let (temp, root, gate) = setup_sandbox();
    fs::write(root.join("f.txt"), b"inside").unwrap();
    outside_setup(temp.path());

    let read = gate.read(name);
    let write = gate.write(name, b"inside");
    (read, write)
}

#[test]
fn test_detour_outside_root_does_not_reveal_outside_files() {
    let name = "../marker.txt/x/../../root/f.txt";

    let absent = outcomes_with(name, |_| {});
    let present = outcomes_with(name, |outer| {
        fs::write(outer.join("marker.txt"), b"outside").unwrap();
    });
    let directory = outcomes_with(name, |outer| {
        fs::create_dir_all(outer.join("marker.txt/x")).unwrap();
    });

    assert_eq!(absent, present);
    assert_eq!(absent, directory);
    assert_eq!(absent.0, Ok(b"inside".to_vec()));
}

#[cfg(unix)]
#[test]
fn test_detour_through_outside_symlinks_does_not_reveal_them() {
    use std::os::unix::fs::symlink;

    let name = "../link/../root/f.txt";

    let absent = outcomes_with(name, |_| {});
    let dangling = outcomes_with(name, |outer| {
        symlink(outer.join("nowhere"), outer.join("link")).unwrap();
    });
    let elsewhere = outcomes_with(name, |outer| {
        fs::create_dir(outer.join("elsewhere")).unwrap();
        symlink(outer.join("elsewhere"), outer.join("link")).unwrap();
    });

    assert_eq!(absent, dangling);
    assert_eq!(absent, elsewhere);
}

#[test]
fn test_detour_that_never_returns_is_an_escape() {
    let name = "../marker.txt/../other/f.txt";

    let absent = outcomes_with(name, |_| {});
    let present = outcomes_with(name, |outer| {
        fs::write(outer.join("marker.txt"), b"outside").unwrap();
    });

    assert_eq!(absent, present);
    assert_eq!(absent.0, Err(GateError::PathEscape));
}
