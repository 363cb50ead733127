//! requiam Core Library
//!
//! Shared types for the membership reconciliation crates.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`MemberId`, `ExternalKey`)
//! - [`members`] - Member sets and paired key/member records
//! - [`error`] - Shared error type (`CoreError`)
//!
//! # Example
//!
//! ```
//! use requiam_core::{MemberId, MemberSet};
//!
//! let ldap: MemberSet = ["A", "B"].into_iter().map(MemberId::from_static).collect();
//! let grouper: MemberSet = ["B", "C"].into_iter().map(MemberId::from_static).collect();
//!
//! assert_eq!(ldap.intersection(&grouper).len(), 1);
//! ```

pub mod error;
pub mod ids;
pub mod members;

pub use error::{CoreError, Result};
pub use ids::{ExternalKey, MemberId};
pub use members::{MemberEntry, MemberSet};
