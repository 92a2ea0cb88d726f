/*!
 * Sandbox Gate Module
 * Path-traversal-safe file access confined to one root directory
 */

pub mod path;
pub mod sandbox;
pub mod storage;

pub use path::{RequestedPath, ResolvedPath};
pub use sandbox::{read, write, Gate};
