//! CLI error types and exit codes

use requiam_core::CoreError;
use requiam_grouper::GrouperError;
use requiam_ldap::LdapError;
use requiam_sync::SyncError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Network error
/// - 4: Validation error
/// - 6: Partial sync (some batches rejected or skipped)
/// - 7: Sync refused by the ceiling
/// - 130: Cancelled
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Grouper error: {0}")]
    Registry(String),

    #[error("Partial sync, batches failed for: {}", .groups.join(", "))]
    PartialSync { groups: Vec<String> },

    #[error("Sync refused, change exceeds sync_max for: {}", .groups.join(", "))]
    CeilingExceeded { groups: Vec<String> },

    #[error("Interrupted, stopped before the next batch")]
    Cancelled,
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::NotFound(_) => 4,
            CliError::PartialSync { .. } => 6,
            CliError::CeilingExceeded { .. } => 7,
            CliError::Cancelled => 130,
            CliError::Config(_)
            | CliError::Io(_)
            | CliError::Directory(_)
            | CliError::Registry(_) => 1,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::CeilingExceeded { .. } => {
                Some("Review the change, then raise sync.sync_max or REQUIAM_SYNC_MAX for one run.")
            }
            CliError::PartialSync { .. } => {
                Some("Re-run the sync; only the remaining differences will be applied.")
            }
            CliError::Network(_) => Some("Check connectivity to Grouper and LDAP and try again."),
            _ => None,
        }
    }
}

impl From<GrouperError> for CliError {
    fn from(e: GrouperError) -> Self {
        match e {
            GrouperError::InvalidArgument(msg) => CliError::Validation(msg),
            GrouperError::InvalidConfig(msg) => CliError::Config(msg),
            GrouperError::GroupNotFound(group) => CliError::NotFound(group),
            e if e.is_transport_level() => CliError::Network(e.to_string()),
            e => CliError::Registry(e.to_string()),
        }
    }
}

impl From<LdapError> for CliError {
    fn from(e: LdapError) -> Self {
        match e {
            LdapError::InvalidArgument(msg) => CliError::Validation(msg),
            e if e.is_transient() => CliError::Network(e.to_string()),
            e => CliError::Directory(e.to_string()),
        }
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::InvalidArgument(msg) => CliError::Validation(msg),
            e @ (SyncError::InvalidOverride { .. } | SyncError::Core(_)) => {
                CliError::Validation(e.to_string())
            }
            SyncError::Transport { .. } => CliError::Network(e.to_string()),
            SyncError::Grouper(inner) => CliError::from(inner),
            e @ (SyncError::OverrideStoreMissing { .. }
            | SyncError::Io { .. }
            | SyncError::Csv { .. }) => CliError::Io(e.to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(e: CoreError) -> Self {
        CliError::Validation(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".into()).exit_code(), 1);
        assert_eq!(CliError::Network("x".into()).exit_code(), 3);
        assert_eq!(CliError::Validation("x".into()).exit_code(), 4);
        assert_eq!(
            CliError::PartialSync {
                groups: vec!["g".into()]
            }
            .exit_code(),
            6
        );
        assert_eq!(
            CliError::CeilingExceeded {
                groups: vec!["g".into()]
            }
            .exit_code(),
            7
        );
        assert_eq!(CliError::Cancelled.exit_code(), 130);
    }

    #[test]
    fn test_grouper_errors_map_by_kind() {
        assert_eq!(CliError::from(GrouperError::Timeout).exit_code(), 3);
        assert_eq!(
            CliError::from(GrouperError::GroupNotFound("g".into())).exit_code(),
            4
        );
        let unexpected = GrouperError::UnexpectedResultCode {
            operation: "add_group".into(),
            code: "PROBLEM".into(),
        };
        assert_eq!(CliError::from(unexpected).exit_code(), 1);
    }

    #[test]
    fn test_sync_errors_map_by_kind() {
        let invalid = SyncError::InvalidArgument("batch_size must be positive".into());
        assert_eq!(CliError::from(invalid).exit_code(), 4);

        let missing = SyncError::OverrideStoreMissing {
            path: "a.csv".into(),
            template: "b.csv".into(),
        };
        assert_eq!(CliError::from(missing).exit_code(), 1);
    }

    #[test]
    fn test_ceiling_message_lists_groups() {
        let err = CliError::CeilingExceeded {
            groups: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().ends_with("a, b"));
    }
}
