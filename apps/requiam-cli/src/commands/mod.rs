//! Command implementations

pub mod create_groups;
pub mod show_overrides;
pub mod sync;
pub mod user_update;

use requiam_sync::{CancellationToken, SyncOutcome, SyncReport};
use tracing::warn;

use crate::error::{CliError, CliResult};

/// Token that Ctrl+C sets; runs stop before their next batch.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();

    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        handler_token.cancel();
    }) {
        warn!(error = %e, "Could not install Ctrl+C handler");
    }

    token
}

/// Outcome of every group touched by one command.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub groups: usize,
    pub clean: usize,
    pub partial: Vec<String>,
    pub refused: Vec<String>,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn record(&mut self, report: &SyncReport) {
        self.groups += 1;
        if report.is_clean() {
            self.clean += 1;
        }
        if report.is_partial() {
            self.partial.push(report.group.clone());
        }
        match report.outcome {
            SyncOutcome::Skipped { .. } => self.refused.push(report.group.clone()),
            SyncOutcome::Cancelled { .. } => self.cancelled = true,
            SyncOutcome::Completed | SyncOutcome::Aborted { .. } => {}
        }
    }

    /// Whether every recorded group synchronized cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.partial.is_empty() && self.refused.is_empty()
    }

    /// Map the combined outcome to an error, most severe first.
    pub fn finish(self) -> CliResult<()> {
        if self.cancelled {
            return Err(CliError::Cancelled);
        }
        if !self.partial.is_empty() {
            return Err(CliError::PartialSync {
                groups: self.partial,
            });
        }
        if !self.refused.is_empty() {
            return Err(CliError::CeilingExceeded {
                groups: self.refused,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requiam_sync::Phase;

    fn report(group: &str, outcome: SyncOutcome) -> SyncReport {
        let mut report = SyncReport::new(group, 3, 10);
        report.outcome = outcome;
        report
    }

    #[test]
    fn test_clean_summary_finishes_ok() {
        let mut summary = RunSummary::default();
        summary.record(&report("a", SyncOutcome::Completed));
        assert!(summary.is_clean());
        assert_eq!(summary.clean, 1);
        summary.finish().unwrap();
    }

    #[test]
    fn test_refused_group_maps_to_ceiling_error() {
        let mut summary = RunSummary::default();
        summary.record(&report("a", SyncOutcome::Completed));
        summary.record(&report(
            "b",
            SyncOutcome::Skipped {
                reason: "ceiling".into(),
                total_delta: 30,
                sync_max: 10,
            },
        ));
        let err = summary.finish().unwrap_err();
        assert_eq!(err.exit_code(), 7);
        assert!(err.to_string().contains('b'));
    }

    #[test]
    fn test_cancel_takes_precedence() {
        let mut summary = RunSummary::default();
        summary.record(&report(
            "b",
            SyncOutcome::Skipped {
                reason: "ceiling".into(),
                total_delta: 30,
                sync_max: 10,
            },
        ));
        summary.record(&report(
            "c",
            SyncOutcome::Cancelled {
                phase: Phase::Adds,
                next_batch: 1,
            },
        ));
        assert_eq!(summary.finish().unwrap_err().exit_code(), 130);
    }
}
