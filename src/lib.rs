/*!
 * Sandbox Gate Library
 * Path-traversal-safe file reads and writes confined to a root directory
 */

pub mod config;
pub mod errors;
pub mod gate;
pub mod monitoring;
pub mod traits;

// Re-exports
pub use config::GateConfig;
pub use errors::*;
pub use gate::{read, write, Gate, RequestedPath, ResolvedPath};
pub use monitoring::init_tracing;
pub use traits::FileGate;
