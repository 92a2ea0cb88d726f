/*!
 * Sandbox Gate
 * Safe read/write entry points confined to a single root directory
 */

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use super::path::{self, canonical_root, RequestedPath, ResolvedPath};
use super::storage;
use crate::config::GateConfig;
use crate::errors::{GateError, GateResult};
use crate::monitoring::GateSpan;

/// Filesystem sandbox gate
///
/// Stateless apart from its configuration: every call re-canonicalizes the
/// root and performs a fresh containment check, so a single gate can be
/// cloned and shared across threads without locking.
#[derive(Debug, Clone)]
pub struct Gate {
    config: GateConfig,
}

impl Gate {
    /// Create a gate over an existing root directory
    pub fn new<P: AsRef<Path>>(root: P) -> GateResult<Self> {
        Self::with_config(GateConfig::new(root.as_ref()))
    }

    /// Create a gate from a full configuration
    ///
    /// A relative root is anchored to the current directory once, here, so
    /// later `set_current_dir` calls do not move the sandbox. With
    /// `create_root` set only the root itself is created; a missing parent
    /// is still a misconfiguration.
    pub fn with_config(mut config: GateConfig) -> GateResult<Self> {
        config.root = std::path::absolute(&config.root)
            .map_err(|e| GateError::InvalidRoot(format!("{}: {}", config.root.display(), e)))?;

        if config.create_root {
            match fs::create_dir(&config.root) {
                Ok(()) => info!(root = %config.root.display(), "created sandbox root"),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(GateError::InvalidRoot(format!(
                        "{}: {}",
                        config.root.display(),
                        e
                    )))
                }
            }
        }

        let canonical = canonical_root(&config.root)?;
        debug!(
            root = %canonical.display(),
            read_only = config.read_only,
            max_file_size = ?config.max_file_size,
            "sandbox gate ready"
        );

        Ok(Self { config })
    }

    /// Create a gate configured from `SANDBOX_GATE_*` environment variables
    pub fn from_env() -> GateResult<Self> {
        Self::with_config(GateConfig::from_env()?)
    }

    /// Root as configured, made absolute
    pub fn root(&self) -> &Path {
        self.config.root()
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Resolve a name without performing any I/O on the target
    pub fn resolve(&self, name: &str) -> GateResult<ResolvedPath> {
        let requested = RequestedPath::new(name)?;
        path::resolve(&self.config.root, &requested)
    }

    /// Write `content` to `name` beneath the root, replacing any existing file
    pub fn write(&self, name: &str, content: &[u8]) -> GateResult<()> {
        self.traced_write(name, RequestedPath::new(name), content)
    }

    /// Write with a name that arrived as raw bytes, e.g. from a C string
    ///
    /// Bytes that are not valid UTF-8 are rejected as `InvalidInput`.
    pub fn write_raw(&self, name: &[u8], content: &[u8]) -> GateResult<()> {
        self.traced_write(&String::from_utf8_lossy(name), RequestedPath::from_bytes(name), content)
    }

    /// Read the full contents of `name` beneath the root
    pub fn read(&self, name: &str) -> GateResult<Vec<u8>> {
        self.traced_read(name, RequestedPath::new(name))
    }

    /// Read with a name that arrived as raw bytes
    pub fn read_raw(&self, name: &[u8]) -> GateResult<Vec<u8>> {
        self.traced_read(&String::from_utf8_lossy(name), RequestedPath::from_bytes(name))
    }

    fn traced_write(
        &self,
        name: &str,
        requested: GateResult<RequestedPath>,
        content: &[u8],
    ) -> GateResult<()> {
        let span = GateSpan::new("write", name);
        let _entered = span.enter();

        let result = requested.and_then(|requested| self.write_inner(&requested, content));
        match &result {
            Ok(()) => {
                span.record_success(content.len());
                debug!(bytes = content.len(), "write accepted");
            }
            Err(e) => span.record_error(e),
        }
        result
    }

    fn traced_read(&self, name: &str, requested: GateResult<RequestedPath>) -> GateResult<Vec<u8>> {
        let span = GateSpan::new("read", name);
        let _entered = span.enter();

        let result = requested.and_then(|requested| self.read_inner(&requested));
        match &result {
            Ok(data) => {
                span.record_success(data.len());
                debug!(bytes = data.len(), "read accepted");
            }
            Err(e) => span.record_error(e),
        }
        result
    }

    fn write_inner(&self, requested: &RequestedPath, content: &[u8]) -> GateResult<()> {
        if self.config.read_only {
            return Err(GateError::ReadOnly);
        }
        if let Some(limit) = self.config.max_file_size {
            let size = content.len() as u64;
            if size > limit {
                return Err(GateError::FileTooLarge { size, limit });
            }
        }

        let target = path::resolve(&self.config.root, requested)?;
        storage::write_atomic(&target, content, self.config.sync_writes)
    }

    fn read_inner(&self, requested: &RequestedPath) -> GateResult<Vec<u8>> {
        let target = path::resolve(&self.config.root, requested)?;
        storage::read_regular(&target, self.config.max_file_size)
    }
}

/// Write through a one-shot gate over `root`
pub fn write<P: AsRef<Path>>(root: P, name: &str, content: &[u8]) -> GateResult<()> {
    Gate::new(root)?.write(name, content)
}

/// Read through a one-shot gate over `root`
pub fn read<P: AsRef<Path>>(root: P, name: &str) -> GateResult<Vec<u8>> {
    Gate::new(root)?.read(name)
}
