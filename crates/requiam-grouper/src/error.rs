//! Grouper client error types.
//!
//! Errors are classified as transient or permanent so callers can decide
//! whether a failed call is worth retrying.

use thiserror::Error;

/// Error raised by a Grouper web-services call.
#[derive(Debug, Error)]
pub enum GrouperError {
    /// The server answered with a non-success HTTP status.
    #[error("Grouper returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request could not be sent or the connection dropped.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The per-call timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// The response body was not the expected JSON shape.
    #[error("failed to parse Grouper response: {0}")]
    Parse(String),

    /// The call completed but Grouper reported a non-success result code.
    #[error("{operation} returned unexpected result code {code}")]
    UnexpectedResultCode { operation: String, code: String },

    /// A stem lookup returned no groups at all.
    #[error("stem is empty: {stem}")]
    EmptyStem { stem: String },

    /// A named group could not be found.
    #[error("group not found: {0}")]
    GroupNotFound(String),

    /// Caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Client construction failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GrouperError {
    /// Whether retrying the same call could plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            GrouperError::Transport(_) | GrouperError::Timeout => true,
            GrouperError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Whether the failure happened below the Grouper result-code layer.
    #[must_use]
    pub fn is_transport_level(&self) -> bool {
        matches!(
            self,
            GrouperError::Transport(_)
                | GrouperError::Timeout
                | GrouperError::Http { .. }
                | GrouperError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for GrouperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GrouperError::Timeout
        } else {
            GrouperError::Transport(e)
        }
    }
}

impl From<serde_json::Error> for GrouperError {
    fn from(e: serde_json::Error) -> Self {
        GrouperError::Parse(e.to_string())
    }
}

/// Result alias for Grouper calls.
pub type GrouperResult<T> = Result<T, GrouperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GrouperError::Timeout.is_transient());
        assert!(GrouperError::Http {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!GrouperError::Http {
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!GrouperError::Parse("bad".into()).is_transient());
        assert!(!GrouperError::UnexpectedResultCode {
            operation: "add_group".into(),
            code: "PROBLEM".into()
        }
        .is_transient());
    }

    #[test]
    fn test_transport_level_excludes_result_codes() {
        assert!(GrouperError::Parse("x".into()).is_transport_level());
        assert!(!GrouperError::EmptyStem { stem: "s".into() }.is_transport_level());
    }
}
