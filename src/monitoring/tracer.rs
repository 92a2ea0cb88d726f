/*!
 * Gate Tracing
 * Structured tracing for gate operations using the tracing crate
 *
 * Features:
 * - Request ID per gate call for log correlation
 * - JSON-formatted logs for structured parsing
 * - Outcome and duration recorded on every operation span
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::env;
use crate::errors::GateError;

/// Operations slower than this are reported at warn level
const SLOW_OPERATION_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SANDBOX_GATE_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(env::TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::NONE)
                    .compact(),
            )
            .init();
        debug!("Structured tracing initialized");
    }
}

/// Generate a unique request ID for log correlation
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering a single gate call
///
/// The requested name is logged as supplied by the caller. The resolved
/// location is only ever logged for accepted requests.
pub struct GateSpan {
    span: tracing::Span,
    start: Instant,
    operation: &'static str,
    request_id: String,
}

impl GateSpan {
    pub fn new(operation: &'static str, requested: &str) -> Self {
        let request_id = generate_request_id();

        let span = span!(
            Level::DEBUG,
            "gate",
            request_id = %request_id,
            op = operation,
            requested = %requested.escape_debug(),
            result = tracing::field::Empty,
            bytes = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            operation,
            request_id,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record a successful outcome
    pub fn record_success(&self, bytes: usize) {
        self.span.record("result", "ok");
        self.span.record("bytes", bytes);
    }

    /// Record a failed outcome, logging escapes as security events
    pub fn record_error(&self, error: &GateError) {
        self.span.record("result", error.code().as_i32());
        let _entered = self.span.enter();
        match error {
            GateError::PathEscape => {
                warn!(op = self.operation, security = true, "blocked path escape attempt")
            }
            GateError::Io(cause) => {
                tracing::error!(op = self.operation, error = %cause, "storage failure")
            }
            other => debug!(op = self.operation, error = %other, "request rejected"),
        }
    }
}

impl Drop for GateSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_OPERATION_MS {
            warn!(
                request_id = %self.request_id,
                op = self.operation,
                duration_ms = duration.as_millis(),
                slow = true,
                "slow gate operation"
            );
        } else {
            debug!(
                request_id = %self.request_id,
                op = self.operation,
                duration_us = duration.as_micros(),
                "gate operation completed"
            );
        }
    }
}
