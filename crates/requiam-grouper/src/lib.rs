//! Grouper web-services client.
//!
//! Reads group membership, writes membership in batches, and performs the
//! group administration calls (find, create, assign privileges) used when
//! provisioning new portal and quota groups.

pub mod admin;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod stem;

pub use admin::{GroupRecord, Privilege};
pub use client::{GroupSnapshot, GrouperClient, MemberOperation, WriteOutcome};
pub use config::GrouperConfig;
pub use error::{GrouperError, GrouperResult};
pub use retry::RetryPolicy;
pub use stem::{figshare_group, figshare_stem, GroupType};
