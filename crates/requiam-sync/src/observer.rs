//! Progress callbacks for synchronization runs.

use std::time::Duration;
use tracing::{debug, info, warn};

use requiam_grouper::GrouperError;

use crate::config::SyncConfig;
use crate::report::{BatchRecord, Phase, SyncOutcome, SyncReport};

/// Receives engine events as they happen.
///
/// Every method has an empty default so observers only implement what
/// they care about.
pub trait SyncObserver: Send + Sync {
    fn run_started(&self, _group: &str, _adds: usize, _drops: usize, _config: &SyncConfig) {}

    fn ceiling_exceeded(&self, _group: &str, _total_delta: usize, _sync_max: usize) {}

    fn phase_started(&self, _phase: Phase, _members: usize, _batches: usize) {}

    fn batch_succeeded(&self, _phase: Phase, _batch: &BatchRecord) {}

    fn batch_rejected(&self, _phase: Phase, _batch: &BatchRecord, _result_code: &str) {}

    /// `skipped` is false when the error stops the run.
    fn transport_error(&self, _phase: Phase, _index: usize, _error: &GrouperError, _skipped: bool) {}

    fn pausing(&self, _delay: Duration) {}

    fn cancelled(&self, _phase: Phase, _next_batch: usize) {}

    fn run_finished(&self, _report: &SyncReport) {}
}

/// Emits every event as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn run_started(&self, group: &str, adds: usize, drops: usize, config: &SyncConfig) {
        info!(
            group = %group,
            adds,
            drops,
            batch_size = config.batch_size(),
            batch_timeout_secs = config.batch_timeout().as_secs(),
            batch_delay_secs = config.batch_delay().as_secs(),
            sync_max = config.sync_max(),
            policy = %config.on_transport_error(),
            "Synchronizing directory membership to Grouper group"
        );
    }

    fn ceiling_exceeded(&self, group: &str, total_delta: usize, sync_max: usize) {
        warn!(
            group = %group,
            total_delta,
            sync_max,
            "Total delta exceeds maximum sync limit, will not synchronize"
        );
    }

    fn phase_started(&self, phase: Phase, members: usize, batches: usize) {
        info!(phase = %phase, members, batches, "Processing {phase}");
    }

    fn batch_succeeded(&self, phase: Phase, batch: &BatchRecord) {
        info!(
            phase = %phase,
            batch = batch.index,
            size = batch.size,
            elapsed_ms = batch.elapsed.as_millis() as u64,
            "Batch applied"
        );
    }

    fn batch_rejected(&self, phase: Phase, batch: &BatchRecord, result_code: &str) {
        warn!(
            phase = %phase,
            batch = batch.index,
            size = batch.size,
            result_code = %result_code,
            "Problem running batch, continuing"
        );
    }

    fn transport_error(&self, phase: Phase, index: usize, error: &GrouperError, skipped: bool) {
        if skipped {
            warn!(phase = %phase, batch = index, error = %error, "Transport error, batch skipped");
        } else {
            warn!(phase = %phase, batch = index, error = %error, "Transport error, aborting run");
        }
    }

    fn pausing(&self, delay: Duration) {
        debug!(delay_secs = delay.as_secs(), "Pausing between batches");
    }

    fn cancelled(&self, phase: Phase, next_batch: usize) {
        warn!(phase = %phase, next_batch, "Synchronization cancelled before batch");
    }

    fn run_finished(&self, report: &SyncReport) {
        match &report.outcome {
            SyncOutcome::Completed if report.is_clean() => info!(
                group = %report.group,
                dropped = report.drops.succeeded,
                added = report.adds.succeeded,
                "Synchronization complete"
            ),
            SyncOutcome::Completed => warn!(
                group = %report.group,
                drop_failures = report.drops.failed + report.drops.skipped,
                add_failures = report.adds.failed + report.adds.skipped,
                "Synchronization completed with failed batches"
            ),
            SyncOutcome::Skipped { .. } => debug!(group = %report.group, "Synchronization skipped"),
            SyncOutcome::Cancelled { .. } | SyncOutcome::Aborted { .. } => warn!(
                group = %report.group,
                batches = report.batches_attempted(),
                "Synchronization stopped early"
            ),
        }
    }
}
