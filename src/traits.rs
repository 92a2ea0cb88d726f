/*!
 * Gate Traits
 * Abstraction over sandboxed file access for harnesses and callers
 */

use std::path::Path;

use crate::errors::GateResult;
use crate::gate::Gate;

/// Sandboxed file access interface
///
/// Implementations must confine every operation to `root()` and must never
/// report success for a partially applied write.
pub trait FileGate: Send + Sync {
    /// Authorized root directory
    fn root(&self) -> &Path;

    /// Read entire file contents
    fn read(&self, name: &str) -> GateResult<Vec<u8>>;

    /// Write entire file contents (create or overwrite)
    fn write(&self, name: &str, content: &[u8]) -> GateResult<()>;
}

impl FileGate for Gate {
    fn root(&self) -> &Path {
        Gate::root(self)
    }

    fn read(&self, name: &str) -> GateResult<Vec<u8>> {
        Gate::read(self, name)
    }

    fn write(&self, name: &str, content: &[u8]) -> GateResult<()> {
        Gate::write(self, name, content)
    }
}
