//! Directory error types.

use thiserror::Error;

/// Error raised by a directory operation.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Could not reach or talk to the server.
    #[error("LDAP connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<ldap3::LdapError>,
    },

    /// The service account was rejected (result code 49).
    #[error("LDAP authentication failed for {bind_dn}")]
    AuthenticationFailed { bind_dn: String },

    /// The server answered a search with a non-zero result code.
    #[error("LDAP search failed with code {rc}: {text}")]
    Search { rc: u32, text: String },

    /// Caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl LdapError {
    pub fn connection(message: impl Into<String>, source: ldap3::LdapError) -> Self {
        LdapError::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Whether the failure is worth retrying on a fresh connection.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, LdapError::Connection { .. })
    }
}

/// Result type for directory operations.
pub type LdapResult<T> = Result<T, LdapError>;
