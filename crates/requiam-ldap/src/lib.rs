//! Directory collaborator for membership reconciliation.
//!
//! Builds the patron filters used to select library members and runs them
//! against the campus directory, returning the union of `uaid` values.
//!
//! ```
//! use requiam_ldap::filters::{ual_ldap_queries, uid_query};
//!
//! let filters = ual_ldap_queries(&["0404", "0413"]);
//! assert_eq!(filters.len(), 2);
//! assert_eq!(uid_query("jdoe"), vec!["(uid=jdoe)".to_string()]);
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod filters;

pub use config::LdapConfig;
pub use directory::{DirectorySearch, LdapDirectory};
pub use error::{LdapError, LdapResult};
pub use filters::{Classification, QuotaClass};
