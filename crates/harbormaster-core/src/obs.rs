//! Structured observability hooks for verification run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via `RunSpan` RAII guard
//! - Emission functions for key lifecycle events: start, checker failure,
//!   corrections applied, finish
//!
//! Events are emitted at `info!` level except checker failures, which are
//! warnings.

use tracing::{info, warn};

/// RAII guard that enters a run-scoped tracing span for the duration of a
/// verification run.
///
/// # Example
///
/// ```ignore
/// let _span = RunSpan::enter("3fca…", "HOSTING-123");
/// // All tracing calls now carry run_id and ticket fields.
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id and ticket key.
    pub fn enter(run_id: &str, ticket_key: &str) -> Self {
        let span = tracing::info_span!("hosting.verify", run_id = %run_id, ticket = %ticket_key);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: verification run started.
pub fn emit_run_started(run_id: &str, ticket_key: &str) {
    info!(event = "verify.started", run_id = %run_id, ticket = %ticket_key);
}

/// Emit event: one checker raised an infrastructure failure (warning level).
pub fn emit_checker_failed(run_id: &str, checker: &str, error: &dyn std::fmt::Display) {
    warn!(event = "checker.failed", run_id = %run_id, checker = %checker, error = %error);
}

/// Emit event: field corrections were written back to the ticket.
pub fn emit_corrections_applied(run_id: &str, ticket_key: &str, count: usize) {
    info!(event = "corrections.applied", run_id = %run_id, ticket = %ticket_key, count = count);
}

/// Emit event: dry-run report, in place of a posted comment.
pub fn emit_dry_run_report(run_id: &str, report: &str) {
    info!(event = "report.dry_run", run_id = %run_id, report = %report);
}

/// Emit event: publishing the report back to the tracker failed.
pub fn emit_publish_failed(run_id: &str, ticket_key: &str, error: &dyn std::fmt::Display) {
    warn!(event = "publish.failed", run_id = %run_id, ticket = %ticket_key, error = %error);
}

/// Emit event: verification run finished.
pub fn emit_run_finished(
    run_id: &str,
    duration_ms: u64,
    findings: usize,
    required: usize,
    published: bool,
) {
    info!(
        event = "verify.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        findings = findings,
        required = required,
        published = published,
    );
}
