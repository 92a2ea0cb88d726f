/*!
 * Confined Storage I/O
 * Read and write primitives that only ever act on resolved paths
 */

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use tempfile::Builder;

use super::path::{is_contained, ResolvedPath};
use crate::errors::{GateError, GateResult};

/// Mode for files the gate creates
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Write `content` to the resolved path, all or nothing
///
/// Content is staged in a temp file next to the target and renamed over it,
/// so a failure at any point leaves the previous contents in place.
pub fn write_atomic(target: &ResolvedPath, content: &[u8], sync: bool) -> GateResult<()> {
    let display = target.relative().display().to_string();
    let path = target.as_path();
    let (parent, file_name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(file_name)) => (parent, file_name),
        _ => return Err(GateError::InvalidInput(format!("{} has no file name", display))),
    };

    fs::create_dir_all(parent)
        .map_err(|e| GateError::io(e, format!("create parent dirs for {}", display)))?;

    // The parent may have been swapped for a symlink since resolution
    let real_parent = parent
        .canonicalize()
        .map_err(|e| GateError::io(e, format!("resolve parent of {}", display)))?;
    if !is_contained(&real_parent, target.root()) {
        return Err(GateError::PathEscape);
    }
    let final_path = real_parent.join(file_name);

    let existing = match fs::symlink_metadata(&final_path) {
        Ok(md) if md.is_dir() => return Err(GateError::NotAFile(display)),
        Ok(md) if md.is_file() => Some(md.permissions()),
        Ok(_) => None,
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(GateError::io(e, format!("stat {}", display))),
    };

    let mut staged = Builder::new()
        .prefix(".gate-")
        .suffix(".tmp")
        .tempfile_in(&real_parent)
        .map_err(|e| GateError::io(e, format!("stage {}", display)))?;

    let permissions = match existing {
        Some(permissions) => Some(permissions),
        None => default_permissions(),
    };
    if let Some(permissions) = permissions {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|e| GateError::io(e, format!("set permissions for {}", display)))?;
    }

    staged
        .as_file_mut()
        .write_all(content)
        .map_err(|e| GateError::io(e, format!("write {}", display)))?;
    if sync {
        staged
            .as_file()
            .sync_all()
            .map_err(|e| GateError::io(e, format!("sync {}", display)))?;
    }

    staged
        .persist(&final_path)
        .map_err(|e| GateError::io(e.error, format!("publish {}", display)))?;
    Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Read the full contents of a regular file at the resolved path
pub fn read_regular(target: &ResolvedPath, limit: Option<u64>) -> GateResult<Vec<u8>> {
    let display = target.relative().display().to_string();

    if !target.exists() {
        return Err(GateError::NotFound(display));
    }

    let md = fs::symlink_metadata(target.as_path())
        .map_err(|e| GateError::io(e, display.clone()))?;
    if !md.is_file() {
        return Err(GateError::NotAFile(display));
    }

    let file = open_nofollow(target.as_path()).map_err(|e| {
        if is_symlink_loop(&e) {
            GateError::PathEscape
        } else {
            GateError::io(e, display.clone())
        }
    })?;

    // Re-check on the open descriptor in case the entry changed
    let md = file
        .metadata()
        .map_err(|e| GateError::io(e, format!("stat {}", display)))?;
    if !md.is_file() {
        return Err(GateError::NotAFile(display));
    }
    if let Some(limit) = limit {
        if md.len() > limit {
            return Err(GateError::FileTooLarge {
                size: md.len(),
                limit,
            });
        }
    }

    let mut data = Vec::with_capacity(md.len() as usize);
    match limit {
        Some(limit) => {
            file.take(limit.saturating_add(1))
                .read_to_end(&mut data)
                .map_err(|e| GateError::io(e, format!("read {}", display)))?;
            if data.len() as u64 > limit {
                return Err(GateError::FileTooLarge {
                    size: data.len() as u64,
                    limit,
                });
            }
        }
        None => {
            let mut file = file;
            file.read_to_end(&mut data)
                .map_err(|e| GateError::io(e, format!("read {}", display)))?;
        }
    }
    Ok(data)
}

/// Open for reading without following a symlink in the final component
#[cfg(unix)]
fn open_nofollow(path: &Path) -> std::io::Result<File> {
    use nix::fcntl::OFlag;
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .read(true)
        .custom_flags((OFlag::O_NOFOLLOW | OFlag::O_NONBLOCK).bits())
        .open(path)
}

#[cfg(not(unix))]
fn open_nofollow(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().read(true).open(path)
}

#[cfg(unix)]
fn is_symlink_loop(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(nix::errno::Errno::ELOOP as i32)
}

#[cfg(not(unix))]
fn is_symlink_loop(_e: &std::io::Error) -> bool {
    false
}
