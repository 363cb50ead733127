//! Structured results of a synchronization run.
//!
//! The registry commits each batch independently, so a run can leave the
//! group with only some batches applied. The report records exactly which.

use std::fmt;
use std::time::Duration;

use requiam_core::MemberId;
use requiam_grouper::MemberOperation;

/// The two write phases, always run drops first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Drops,
    Adds,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Drops => "drops",
            Phase::Adds => "adds",
        }
    }

    /// Registry operation issued for this phase.
    #[must_use]
    pub fn operation(&self) -> MemberOperation {
        match self {
            Phase::Drops => MemberOperation::Delete,
            Phase::Adds => MemberOperation::Add,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a single batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    Succeeded,
    /// The registry answered with a non-success result code.
    Rejected { result_code: String },
    /// The call failed in transport and the batch was skipped.
    TransportSkipped { error: String },
}

/// One batch as sent to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    /// 1-based position within its phase.
    pub index: usize,
    pub size: usize,
    pub members: Vec<MemberId>,
    pub status: BatchStatus,
    /// Wall-clock time of the write call, retries included.
    pub elapsed: Duration,
}

/// Batches of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Batches planned for this phase.
    pub planned: usize,
    pub batches: Vec<BatchRecord>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PhaseReport {
    #[must_use]
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            planned: 0,
            batches: Vec::new(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
        }
    }

    pub(crate) fn record(&mut self, batch: BatchRecord) {
        self.attempted += 1;
        match batch.status {
            BatchStatus::Succeeded => self.succeeded += 1,
            BatchStatus::Rejected { .. } => self.failed += 1,
            BatchStatus::TransportSkipped { .. } => self.skipped += 1,
        }
        self.batches.push(batch);
    }

    /// Members whose batch the registry accepted.
    pub fn applied_members(&self) -> impl Iterator<Item = &MemberId> {
        self.batches
            .iter()
            .filter(|b| b.status == BatchStatus::Succeeded)
            .flat_map(|b| b.members.iter())
    }
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every planned batch was attempted.
    Completed,
    /// The ceiling refused the run; no remote calls were made.
    Skipped {
        reason: String,
        total_delta: usize,
        sync_max: usize,
    },
    /// Cancellation was requested; `next_batch` of `phase` was not sent.
    Cancelled { phase: Phase, next_batch: usize },
    /// A transport failure stopped the run at `batch` of `phase`.
    Aborted { phase: Phase, batch: usize },
}

/// Result of one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub group: String,
    pub total_delta: usize,
    pub sync_max: usize,
    pub outcome: SyncOutcome,
    pub drops: PhaseReport,
    pub adds: PhaseReport,
}

impl SyncReport {
    #[must_use]
    pub fn new(group: impl Into<String>, total_delta: usize, sync_max: usize) -> Self {
        Self {
            group: group.into(),
            total_delta,
            sync_max,
            outcome: SyncOutcome::Completed,
            drops: PhaseReport::new(Phase::Drops),
            adds: PhaseReport::new(Phase::Adds),
        }
    }

    #[must_use]
    pub fn phase(&self, phase: Phase) -> &PhaseReport {
        match phase {
            Phase::Drops => &self.drops,
            Phase::Adds => &self.adds,
        }
    }

    pub(crate) fn phase_mut(&mut self, phase: Phase) -> &mut PhaseReport {
        match phase {
            Phase::Drops => &mut self.drops,
            Phase::Adds => &mut self.adds,
        }
    }

    /// Total write calls that reached the registry or were skipped.
    #[must_use]
    pub fn batches_attempted(&self) -> usize {
        self.drops.attempted + self.adds.attempted
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Skipped { .. })
    }

    /// Completed with every batch accepted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcome == SyncOutcome::Completed
            && self.drops.failed + self.drops.skipped + self.adds.failed + self.adds.skipped == 0
    }

    /// Some batches were rejected or skipped, or the run stopped early
    /// after applying at least one batch.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        let degraded =
            self.drops.failed + self.drops.skipped + self.adds.failed + self.adds.skipped > 0;
        let stopped_early = matches!(
            self.outcome,
            SyncOutcome::Cancelled { .. } | SyncOutcome::Aborted { .. }
        ) && self.batches_attempted() > 0;
        degraded || stopped_early
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(status: BatchStatus) -> BatchRecord {
        BatchRecord {
            index: 1,
            size: 1,
            members: vec![MemberId::from_static("A")],
            status,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_phase_counts() {
        let mut phase = PhaseReport::new(Phase::Adds);
        phase.record(batch(BatchStatus::Succeeded));
        phase.record(batch(BatchStatus::Rejected {
            result_code: "PROBLEM".into(),
        }));
        phase.record(batch(BatchStatus::TransportSkipped {
            error: "timeout".into(),
        }));

        assert_eq!(phase.attempted, 3);
        assert_eq!(phase.succeeded, 1);
        assert_eq!(phase.failed, 1);
        assert_eq!(phase.skipped, 1);
        assert_eq!(phase.applied_members().count(), 1);
    }

    #[test]
    fn test_clean_and_partial() {
        let mut report = SyncReport::new("g", 2, 10);
        report.drops.record(batch(BatchStatus::Succeeded));
        assert!(report.is_clean());
        assert!(!report.is_partial());

        report.adds.record(batch(BatchStatus::Rejected {
            result_code: "X".into(),
        }));
        assert!(!report.is_clean());
        assert!(report.is_partial());
    }

    #[test]
    fn test_skipped_is_neither_clean_nor_partial() {
        let mut report = SyncReport::new("g", 20, 10);
        report.outcome = SyncOutcome::Skipped {
            reason: "ceiling".into(),
            total_delta: 20,
            sync_max: 10,
        };
        assert!(report.is_skipped());
        assert!(!report.is_clean());
        assert!(!report.is_partial());
    }
}
