//! Membership reconciliation engine.
//!
//! Compares the authoritative member set against a Grouper group, refuses
//! runs whose change count exceeds a ceiling, and applies the remaining
//! drops and adds in paced batches. Manual overrides are merged into the
//! authoritative set beforehand and recorded in per-category CSV stores.
//!
//! # Modules
//!
//! - [`delta`] - Set difference and batched synchronization
//! - [`config`] - Batch sizing, pacing, ceiling and transport-error policy
//! - [`writer`] - The write seam the engine drives (`MembershipWriter`)
//! - [`observer`] - Progress callbacks (`SyncObserver`, `TracingObserver`)
//! - [`report`] - Structured per-run and per-batch results
//! - [`overrides`] - Manual override tables and merge operations
//! - [`user`] - Single-user membership updates

pub mod cancel;
pub mod config;
pub mod delta;
pub mod error;
pub mod observer;
pub mod overrides;
pub mod report;
pub mod user;
pub mod writer;

pub use cancel::CancellationToken;
pub use config::{SyncConfig, TransportErrorPolicy};
pub use delta::{partition, Delta};
pub use error::{SyncError, SyncResult};
pub use observer::{SyncObserver, TracingObserver};
pub use overrides::{
    update_entries, EntryUpdate, ManualOverride, OverrideAction, OverrideCategory, OverrideFiles,
    OverrideRow, OverrideTable, TableUpdate,
};
pub use report::{BatchRecord, BatchStatus, Phase, PhaseReport, SyncOutcome, SyncReport};
pub use user::delta_for_user;
pub use writer::MembershipWriter;
