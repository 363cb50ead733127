//! Set difference between the directory and a Grouper group, and the
//! batched write protocol that applies it.
//!
//! A [`Delta`] is computed eagerly from snapshots of both sides, so
//! re-querying either side afterwards never changes what a later
//! [`Delta::synchronize`] call will send. Running it twice against an
//! unchanged registry is a no-op the second time because the second delta
//! is empty.

use tokio::time::Instant;
use tracing::debug;

use requiam_core::{MemberId, MemberSet};
use requiam_grouper::{GroupSnapshot, GrouperResult, RetryPolicy, WriteOutcome};

use crate::cancel::CancellationToken;
use crate::config::{SyncConfig, TransportErrorPolicy, RETRY_BASE_DELAY_SECS};
use crate::error::{SyncError, SyncResult};
use crate::observer::SyncObserver;
use crate::report::{BatchRecord, BatchStatus, Phase, SyncOutcome, SyncReport};
use crate::writer::MembershipWriter;

/// Split `members` into batches of at most `batch_size`.
///
/// Batches follow the set's iteration order, which is stable within a run
/// but carries no meaning across runs.
#[must_use]
pub fn partition(members: &MemberSet, batch_size: usize) -> Vec<Vec<MemberId>> {
    if batch_size == 0 {
        return Vec::new();
    }
    members
        .to_vec()
        .chunks(batch_size)
        .map(<[MemberId]>::to_vec)
        .collect()
}

/// Differences between a source set and a group snapshot.
#[derive(Debug, Clone)]
pub struct Delta {
    snapshot: GroupSnapshot,
    config: SyncConfig,
    common: MemberSet,
    adds: MemberSet,
    drops: MemberSet,
}

impl Delta {
    /// Compute `common`, `adds` and `drops` for `source` against `snapshot`.
    #[must_use]
    pub fn new(source: &MemberSet, snapshot: GroupSnapshot, config: SyncConfig) -> Self {
        let target = &snapshot.members;
        let drops = target.difference(source);
        let adds = source.difference(target);
        let common = source.intersection(target);

        debug!(
            group = %snapshot.group_name,
            common = common.len(),
            adds = adds.len(),
            drops = drops.len(),
            "Delta computed"
        );

        Self {
            snapshot,
            config,
            common,
            adds,
            drops,
        }
    }

    /// Members on both sides.
    #[must_use]
    pub fn common(&self) -> &MemberSet {
        &self.common
    }

    /// Members to add to the group.
    #[must_use]
    pub fn adds(&self) -> &MemberSet {
        &self.adds
    }

    /// Members to remove from the group.
    #[must_use]
    pub fn drops(&self) -> &MemberSet {
        &self.drops
    }

    #[must_use]
    pub fn total_delta(&self) -> usize {
        self.adds.len() + self.drops.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> &GroupSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.snapshot.group_name
    }

    fn phase_members(&self, phase: Phase) -> &MemberSet {
        match phase {
            Phase::Drops => &self.drops,
            Phase::Adds => &self.adds,
        }
    }

    /// Apply the delta: drops first, then adds, one batch at a time.
    ///
    /// Refuses to make any call when `total_delta > sync_max`. A
    /// non-success result code is recorded and the run continues. Transport
    /// failures follow the configured [`TransportErrorPolicy`]; under
    /// `Abort` (and `Retry` once exhausted) the error is returned with the
    /// partial report. Batches already committed are never rolled back.
    pub async fn synchronize<W>(
        &self,
        writer: &W,
        observer: &dyn SyncObserver,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport>
    where
        W: MembershipWriter + ?Sized,
    {
        let total_delta = self.total_delta();
        let sync_max = self.config.sync_max();
        let mut report = SyncReport::new(self.group(), total_delta, sync_max);

        if total_delta > sync_max {
            observer.ceiling_exceeded(self.group(), total_delta, sync_max);
            report.outcome = SyncOutcome::Skipped {
                reason: format!("total delta {total_delta} exceeds sync_max {sync_max}"),
                total_delta,
                sync_max,
            };
            observer.run_finished(&report);
            return Ok(report);
        }

        observer.run_started(self.group(), self.adds.len(), self.drops.len(), &self.config);

        for phase in [Phase::Drops, Phase::Adds] {
            let members = self.phase_members(phase);
            let batches = partition(members, self.config.batch_size());
            report.phase_mut(phase).planned = batches.len();
            observer.phase_started(phase, members.len(), batches.len());

            for (i, batch) in batches.into_iter().enumerate() {
                let index = i + 1;

                if cancel.is_cancelled() {
                    observer.cancelled(phase, index);
                    report.outcome = SyncOutcome::Cancelled {
                        phase,
                        next_batch: index,
                    };
                    observer.run_finished(&report);
                    return Ok(report);
                }

                let started = Instant::now();
                let result = self.write_batch(writer, phase, &batch).await;
                let elapsed = started.elapsed();

                let status = match result {
                    Ok(outcome) if outcome.is_success() => BatchStatus::Succeeded,
                    Ok(outcome) => BatchStatus::Rejected {
                        result_code: outcome.result_code,
                    },
                    Err(error) => {
                        if self.config.on_transport_error() == TransportErrorPolicy::SkipBatch {
                            observer.transport_error(phase, index, &error, true);
                            BatchStatus::TransportSkipped {
                                error: error.to_string(),
                            }
                        } else {
                            observer.transport_error(phase, index, &error, false);
                            report.outcome = SyncOutcome::Aborted {
                                phase,
                                batch: index,
                            };
                            observer.run_finished(&report);
                            return Err(SyncError::Transport {
                                phase,
                                batch: index,
                                report: Box::new(report),
                                source: error,
                            });
                        }
                    }
                };

                let record = BatchRecord {
                    index,
                    size: batch.len(),
                    members: batch,
                    status,
                    elapsed,
                };
                match &record.status {
                    BatchStatus::Succeeded => observer.batch_succeeded(phase, &record),
                    BatchStatus::Rejected { result_code } => {
                        observer.batch_rejected(phase, &record, result_code);
                    }
                    BatchStatus::TransportSkipped { .. } => {}
                }
                report.phase_mut(phase).record(record);

                let delay = self.config.batch_delay();
                if !delay.is_zero() {
                    observer.pausing(delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        report.outcome = SyncOutcome::Completed;
        observer.run_finished(&report);
        Ok(report)
    }

    async fn write_batch<W>(
        &self,
        writer: &W,
        phase: Phase,
        batch: &[MemberId],
    ) -> GrouperResult<WriteOutcome>
    where
        W: MembershipWriter + ?Sized,
    {
        let operation = phase.operation();
        let timeout = self.config.batch_timeout();

        match self.config.on_transport_error() {
            TransportErrorPolicy::Retry { retries } => {
                RetryPolicy::new(retries, RETRY_BASE_DELAY_SECS)
                    .execute(operation.as_str(), || {
                        writer.write(operation, &self.snapshot, batch, timeout)
                    })
                    .await
            }
            TransportErrorPolicy::Abort | TransportErrorPolicy::SkipBatch => {
                writer.write(operation, &self.snapshot, batch, timeout).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&'static str]) -> MemberSet {
        ids.iter().copied().map(MemberId::from_static).collect()
    }

    fn snapshot(members: MemberSet) -> GroupSnapshot {
        GroupSnapshot {
            group_name: "arizona.edu:dept:LBRY:figtest:portal:sci_math".to_string(),
            members_url: "http://localhost/groups/g/members".to_string(),
            members,
        }
    }

    #[test]
    fn test_partition_sizes() {
        let members: MemberSet = (0..7)
            .map(|i| MemberId::new(format!("m{i}")).unwrap())
            .collect();
        let batches = partition(&members, 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 1]);

        let rejoined: MemberSet = batches.into_iter().flatten().collect();
        assert_eq!(rejoined, members);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(&MemberSet::new(), 5).is_empty());
    }

    #[test]
    fn test_delta_sets() {
        let config = SyncConfig::new(2, 30, 0, 10).unwrap();
        let delta = Delta::new(&set(&["A", "B", "C"]), snapshot(set(&["B", "C", "D"])), config);

        assert_eq!(delta.adds(), &set(&["A"]));
        assert_eq!(delta.drops(), &set(&["D"]));
        assert_eq!(delta.common(), &set(&["B", "C"]));
        assert_eq!(delta.total_delta(), 2);
    }

    #[test]
    fn test_delta_is_a_snapshot() {
        let config = SyncConfig::new(2, 30, 0, 10).unwrap();
        let mut source = set(&["A"]);
        let delta = Delta::new(&source, snapshot(set(&["B"])), config);
        source.insert(MemberId::from_static("Z"));
        assert_eq!(delta.adds(), &set(&["A"]));
    }
}
