//! Grouper connection configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the Grouper web services.
#[derive(Clone, Serialize, Deserialize)]
pub struct GrouperConfig {
    /// Grouper host name (e.g. "grouper.iam.arizona.edu").
    pub host: String,

    /// Base path including the API version
    /// (e.g. "grouper-ws/servicesRest/json/v2_2_001").
    pub base_path: String,

    /// Service account user.
    pub user: String,

    /// Service account password.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Use the production `figshare` stem rather than `figtest`.
    #[serde(default)]
    pub production: bool,

    /// Timeout for read and admin calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify the server TLS certificate.
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Full endpoint override, bypassing `https://{host}/{base_path}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_tls_verify() -> bool {
    true
}

impl GrouperConfig {
    /// Create a config with required fields and defaults for the rest.
    pub fn new(
        host: impl Into<String>,
        base_path: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            base_path: base_path.into(),
            user: user.into(),
            password: password.into(),
            production: false,
            timeout_secs: default_timeout_secs(),
            tls_verify: default_tls_verify(),
            endpoint: None,
        }
    }

    /// Point the client at an explicit endpoint (used against mock servers).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Base endpoint all resource paths are appended to, without trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}/{}",
                self.host,
                self.base_path.trim_matches('/')
            ),
        }
    }
}

impl std::fmt::Debug for GrouperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrouperConfig")
            .field("host", &self.host)
            .field("base_path", &self.base_path)
            .field("user", &self.user)
            .field("password", &"***REDACTED***")
            .field("production", &self.production)
            .field("timeout_secs", &self.timeout_secs)
            .field("tls_verify", &self.tls_verify)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
