/*!
 * Monitoring
 * Structured tracing for gate operations
 */

mod tracer;

pub use tracer::{generate_request_id, init_tracing, GateSpan};
