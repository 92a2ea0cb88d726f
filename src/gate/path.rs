/*!
 * Sandboxed Path Resolution
 * Turns an untrusted relative name into a canonical path beneath the root
 *
 * Resolution runs in two passes:
 * - a cheap lexical pre-check that short-circuits obvious escapes
 * - a physical walk that canonicalizes every existing component, following
 *   symlinks, and keeps the not-yet-existing tail lexically
 *
 * Only the physical result decides containment.
 */

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::errors::{GateError, GateResult};

/// Untrusted file name supplied by a caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedPath {
    raw: PathBuf,
}

impl RequestedPath {
    /// Validate a caller-supplied name
    pub fn new(name: &str) -> GateResult<Self> {
        if name.is_empty() {
            return Err(GateError::InvalidInput("empty file name".into()));
        }
        if name.contains('\0') {
            return Err(GateError::InvalidInput("file name contains a NUL byte".into()));
        }
        Ok(Self {
            raw: PathBuf::from(name),
        })
    }

    /// Validate a name that arrived as raw bytes
    pub fn from_bytes(bytes: &[u8]) -> GateResult<Self> {
        let name = std::str::from_utf8(bytes)
            .map_err(|e| GateError::InvalidInput(format!("file name is not valid UTF-8: {}", e)))?;
        Self::new(name)
    }

    pub fn as_path(&self) -> &Path {
        &self.raw
    }
}

/// Canonical location of an accepted request
///
/// Holds the canonical root it was checked against so the I/O layer can
/// re-verify containment right before touching storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath {
    canonical: PathBuf,
    root: PathBuf,
    exists: bool,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.canonical
    }

    /// Canonical root this path was verified against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the target existed at resolution time
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Location relative to the root, safe to show to the caller
    pub fn relative(&self) -> &Path {
        self.canonical
            .strip_prefix(&self.root)
            .unwrap_or_else(|_| Path::new(""))
    }
}

/// Canonicalize and validate the root directory
pub fn canonical_root(root: &Path) -> GateResult<PathBuf> {
    let canonical = root
        .canonicalize()
        .map_err(|e| GateError::InvalidRoot(format!("{}: {}", root.display(), e)))?;
    if !canonical.is_dir() {
        return Err(GateError::InvalidRoot(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(canonical)
}

/// Component-wise containment, so `/root-evil` is never inside `/root`
#[inline]
pub fn is_contained(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Resolve a request against the root
pub fn resolve(root: &Path, requested: &RequestedPath) -> GateResult<ResolvedPath> {
    let canonical_root = canonical_root(root)?;
    let relative = lexical_precheck(root, &canonical_root, requested.as_path())?;

    let (mut canonical, pending) = walk(&canonical_root, &relative)?;
    let exists = pending.is_empty();
    canonical.extend(pending);

    if !is_contained(&canonical, &canonical_root) {
        return Err(GateError::PathEscape);
    }
    if canonical == canonical_root {
        return Err(GateError::InvalidInput(
            "path resolves to the sandbox root".into(),
        ));
    }

    Ok(ResolvedPath {
        canonical,
        root: canonical_root,
        exists,
    })
}

/// Lexically clean `root + requested` and require it to stay under the root
///
/// Returns the request as a path relative to the root. Absolute requests
/// are accepted only when they literally start with the root.
fn lexical_precheck(root: &Path, canonical_root: &Path, requested: &Path) -> GateResult<PathBuf> {
    for base in [root, canonical_root] {
        let cleaned = path_clean::clean(base.join(requested));
        if !cleaned.starts_with(path_clean::clean(base)) {
            continue;
        }
        if !requested.is_absolute() {
            return Ok(requested.to_path_buf());
        }
        if let Ok(stripped) = requested.strip_prefix(base) {
            return Ok(stripped.to_path_buf());
        }
    }
    Err(GateError::PathEscape)
}

/// Walk `relative` from the canonical root
///
/// Returns the deepest canonical existing location and the lexical tail
/// that does not exist yet.
///
/// The filesystem is only consulted for entries inside the root. Once `..`
/// climbs above it, the walk continues lexically and becomes physical again
/// only on re-entering the root, so the outcome never depends on what exists
/// outside. A symlink whose real target leaves the root is rejected on the
/// spot.
fn walk(canonical_root: &Path, relative: &Path) -> GateResult<(PathBuf, Vec<OsString>)> {
    let mut resolved = canonical_root.to_path_buf();
    let mut pending: Vec<OsString> = Vec::new();
    let mut outside: Option<PathBuf> = None;

    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(lexical) = outside.as_mut() {
                    lexical.pop();
                } else if pending.pop().is_none() {
                    // `resolved` is canonical, so its lexical parent is the real one
                    resolved.pop();
                    if !is_contained(&resolved, canonical_root) {
                        outside = Some(resolved.clone());
                    }
                }
            }
            Component::Normal(name) => {
                if let Some(lexical) = outside.as_mut() {
                    lexical.push(name);
                    // Only the root itself is reachable by descending from outside
                    if lexical.as_path() == canonical_root {
                        resolved = canonical_root.to_path_buf();
                        outside = None;
                    }
                    continue;
                }
                if !pending.is_empty() {
                    pending.push(name.to_os_string());
                    continue;
                }
                let candidate = resolved.join(name);
                match candidate.canonicalize() {
                    Ok(real) if is_contained(&real, canonical_root) => resolved = real,
                    Ok(_) => return Err(GateError::PathEscape),
                    Err(e) => match fs::symlink_metadata(&candidate) {
                        // Dangling, looping or escaping link: its target cannot be verified
                        Ok(md) if md.file_type().is_symlink() => return Err(GateError::PathEscape),
                        Ok(_) => return Err(GateError::Io(format!("resolve: {}", e))),
                        Err(missing) if missing.kind() == ErrorKind::NotFound => {
                            pending.push(name.to_os_string())
                        }
                        Err(other) => return Err(GateError::Io(format!("resolve: {}", other))),
                    },
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(GateError::PathEscape),
        }
    }

    if outside.is_some() {
        return Err(GateError::PathEscape);
    }
    Ok((resolved, pending))
}
