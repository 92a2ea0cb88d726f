/*!
 * Sandbox Gate - Demo Harness
 *
 * Locks a gate to a working directory, performs one legitimate write and
 * read-back, then one deliberate path traversal attempt.
 */

use miette::Result;
use tracing::{error, info, warn};

use sandbox_gate::{init_tracing, FileGate, Gate, GateConfig};

const GREETING_FILE: &str = "hello_world.txt";
const GREETING: &str = "Hello! This file was written through the sandbox gate.";
const TRAVERSAL_FILE: &str = "../system_hack.txt";

fn main() -> Result<()> {
    init_tracing();

    info!("Sandbox Gate demo starting...");
    info!("================================================");

    // The harness owns the root, so it is created on startup
    let config = GateConfig::from_env()?.with_create_root(true);
    let gate = Gate::with_config(config)?;
    info!(root = %gate.root().display(), "Sandbox locked");

    run_task(&gate);
    run_traversal_attempt(&gate);

    info!("================================================");
    Ok(())
}

/// Legitimate request: write a greeting and read it back
fn run_task(gate: &dyn FileGate) {
    info!(file = GREETING_FILE, "Executing tool: WriteFile");

    if let Err(e) = gate.write(GREETING_FILE, GREETING.as_bytes()) {
        error!(error = %e, code = e.code().as_i32(), "Task failed");
        return;
    }

    match gate.read(GREETING_FILE) {
        Ok(data) => info!(
            content = %String::from_utf8_lossy(&data),
            "Task completed successfully"
        ),
        Err(e) => error!(error = %e, code = e.code().as_i32(), "Read-back failed"),
    }
}

/// Malicious request: try to write outside the root
fn run_traversal_attempt(gate: &dyn FileGate) {
    info!(file = TRAVERSAL_FILE, "Attempting simulated path traversal...");

    match gate.write(TRAVERSAL_FILE, b"Hacked!") {
        Err(e) if e.is_security_rejection() => info!("Security blocked the attack successfully"),
        Err(e) => warn!(error = %e, "Traversal attempt failed for another reason"),
        Ok(()) => error!("Traversal attempt was NOT blocked"),
    }
}
