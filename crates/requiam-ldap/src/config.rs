//! Directory connection configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the campus directory.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Directory host name (e.g. "eds.arizona.edu").
    pub host: String,

    /// Base DN (e.g. "dc=eds,dc=arizona,dc=edu").
    pub base_dn: String,

    /// Application account used for the bind.
    pub user: String,

    /// Bind password.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Connect over LDAPS.
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,

    /// Server port; defaults to 636 for LDAPS and 389 otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Connect and per-search timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("base_dn", &self.base_dn)
            .field("user", &self.user)
            .field("password", &"***REDACTED***")
            .field("use_ssl", &self.use_ssl)
            .field("port", &self.port)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_use_ssl() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Attribute holding the member identifier.
pub const MEMBER_ATTRIBUTE: &str = "uaid";

impl LdapConfig {
    /// Create a config with required fields and defaults for the rest.
    pub fn new(
        host: impl Into<String>,
        base_dn: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            base_dn: base_dn.into(),
            user: user.into(),
            password: password.into(),
            use_ssl: default_use_ssl(),
            port: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.use_ssl { 636 } else { 389 })
    }

    /// `ldaps://host:port` (or `ldap://` when SSL is off).
    #[must_use]
    pub fn bind_url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{scheme}://{}:{}", self.host, self.effective_port())
    }

    /// `uid={user},ou=app users,{base_dn}`.
    #[must_use]
    pub fn bind_dn(&self) -> String {
        format!("uid={},ou=app users,{}", self.user, self.base_dn)
    }

    /// `ou=people,{base_dn}`.
    #[must_use]
    pub fn search_dn(&self) -> String {
        format!("ou=people,{}", self.base_dn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let config = LdapConfig::new("eds.arizona.edu", "dc=eds,dc=arizona,dc=edu", "svc", "pw");
        assert_eq!(config.bind_url(), "ldaps://eds.arizona.edu:636");
        assert_eq!(config.bind_dn(), "uid=svc,ou=app users,dc=eds,dc=arizona,dc=edu");
        assert_eq!(config.search_dn(), "ou=people,dc=eds,dc=arizona,dc=edu");
    }

    #[test]
    fn test_plain_ldap_port() {
        let mut config = LdapConfig::new("localhost", "dc=test", "svc", "pw");
        config.use_ssl = false;
        assert_eq!(config.bind_url(), "ldap://localhost:389");
        config.port = Some(3389);
        assert_eq!(config.bind_url(), "ldap://localhost:3389");
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = LdapConfig::new("h", "dc=test", "svc", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_yaml_defaults() {
        let config: LdapConfig = serde_yaml::from_str(
            "host: eds.arizona.edu\nbase_dn: dc=eds,dc=arizona,dc=edu\nuser: svc\n",
        )
        .unwrap();
        assert!(config.use_ssl);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.password.is_empty());
    }
}
