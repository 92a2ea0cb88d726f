/*!
 * Gate Configuration
 * Root directory and I/O policy, loadable from the environment
 */

use crate::errors::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default sandbox root, relative to the working directory
pub const DEFAULT_ROOT: &str = "sandbox";

pub mod env {
    pub const ROOT: &str = "SANDBOX_GATE_ROOT";
    pub const CREATE_ROOT: &str = "SANDBOX_GATE_CREATE_ROOT";
    pub const READ_ONLY: &str = "SANDBOX_GATE_READ_ONLY";
    pub const MAX_FILE_SIZE: &str = "SANDBOX_GATE_MAX_FILE_SIZE";
    pub const SYNC: &str = "SANDBOX_GATE_SYNC";
    pub const TRACE_JSON: &str = "SANDBOX_GATE_TRACE_JSON";
}

/// Gate configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Authorized directory boundary
    pub root: PathBuf,
    /// Create the root directory itself (never its ancestors) if missing
    pub create_root: bool,
    /// Reject all writes
    pub read_only: bool,
    /// Upper bound for written and read content, in bytes
    pub max_file_size: Option<u64>,
    /// fsync file contents before the rename that publishes them
    pub sync_writes: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            create_root: false,
            read_only: false,
            max_file_size: None,
            sync_writes: false,
        }
    }
}

impl GateConfig {
    /// Configuration for the given root with default policy
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_create_root(mut self, create_root: bool) -> Self {
        self.create_root = create_root;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = Some(limit);
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Load configuration from `SANDBOX_GATE_*` environment variables
    ///
    /// Unset variables keep their defaults. Malformed values are rejected
    /// rather than silently ignored.
    pub fn from_env() -> GateResult<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var(env::ROOT) {
            if root.is_empty() {
                return Err(GateError::InvalidInput(format!("{} is empty", env::ROOT)));
            }
            config.root = PathBuf::from(root);
        }
        if let Some(flag) = env_flag(env::CREATE_ROOT)? {
            config.create_root = flag;
        }
        if let Some(flag) = env_flag(env::READ_ONLY)? {
            config.read_only = flag;
        }
        if let Some(flag) = env_flag(env::SYNC)? {
            config.sync_writes = flag;
        }
        if let Ok(limit) = std::env::var(env::MAX_FILE_SIZE) {
            let limit = limit.trim().parse::<u64>().map_err(|e| {
                GateError::InvalidInput(format!("{}={:?}: {}", env::MAX_FILE_SIZE, limit, e))
            })?;
            config.max_file_size = Some(limit);
        }

        Ok(config)
    }

    /// Root as configured (not yet canonicalized)
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Parse a boolean environment flag, `None` when unset
fn env_flag(key: &str) -> GateResult<Option<bool>> {
    match std::env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            other => Err(GateError::InvalidInput(format!(
                "{}={:?} is not a boolean",
                key, other
            ))),
        },
        Err(_) => Ok(None),
    }
}
