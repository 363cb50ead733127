//! The registry write seam driven by the engine.

use async_trait::async_trait;
use std::time::Duration;

use requiam_core::MemberId;
use requiam_grouper::{GroupSnapshot, GrouperClient, GrouperResult, MemberOperation, WriteOutcome};

/// Writes one batch of membership changes to the group behind a snapshot.
///
/// Implementations return the literal result code on any completed call;
/// only transport-level failures are errors.
#[async_trait]
pub trait MembershipWriter: Send + Sync {
    async fn delete_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome>;

    async fn add_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome>;

    /// Dispatch on `operation`.
    async fn write(
        &self,
        operation: MemberOperation,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        match operation {
            MemberOperation::Delete => self.delete_members(snapshot, batch, timeout).await,
            MemberOperation::Add => self.add_members(snapshot, batch, timeout).await,
        }
    }
}

#[async_trait]
impl MembershipWriter for GrouperClient {
    async fn delete_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        GrouperClient::delete_members(self, snapshot, batch, timeout).await
    }

    async fn add_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        GrouperClient::add_members(self, snapshot, batch, timeout).await
    }
}
