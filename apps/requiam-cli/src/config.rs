//! Configuration file loading.
//!
//! Settings come from a YAML file, then environment variables override the
//! secrets and the ceiling:
//!
//! - `REQUIAM_LDAP_PASSWORD`
//! - `REQUIAM_GROUPER_PASSWORD`
//! - `REQUIAM_SYNC_MAX`
//!
//! A `.env` file in the working directory is loaded first when present.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use requiam_grouper::GrouperConfig;
use requiam_ldap::{LdapConfig, QuotaClass};
use requiam_sync::{OverrideFiles, SyncConfig, TransportErrorPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "./config/requiam.yaml";

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Campus directory connection.
    pub ldap: LdapConfig,

    /// Grouper web service connection.
    pub grouper: GrouperConfig,

    /// Batch sizing, pacing and ceiling.
    #[serde(default)]
    pub sync: SyncSettings,

    /// Manual override store.
    #[serde(default)]
    pub overrides: OverrideSettings,

    /// Portal name to the org codes whose patrons belong to it.
    #[serde(default)]
    pub portals: BTreeMap<String, Vec<String>>,

    /// Default quota tiers, in bytes.
    #[serde(default)]
    pub quotas: QuotaSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Batch settings as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout: u64,

    /// Pause after each batch, in seconds.
    #[serde(default)]
    pub batch_delay: u64,

    /// Largest adds + drops a run may apply.
    #[serde(default = "default_sync_max")]
    pub sync_max: usize,

    /// `abort`, `skip_batch`, `retry` or `retry(N)`.
    #[serde(default)]
    pub on_transport_error: TransportErrorPolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_timeout: default_batch_timeout(),
            batch_delay: 0,
            sync_max: default_sync_max(),
            on_transport_error: TransportErrorPolicy::default(),
        }
    }
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_timeout() -> u64 {
    30
}

fn default_sync_max() -> usize {
    1000
}

impl SyncSettings {
    /// Validated engine settings.
    pub fn to_sync_config(&self) -> CliResult<SyncConfig> {
        let config = SyncConfig::new(
            self.batch_size,
            self.batch_timeout,
            self.batch_delay,
            self.sync_max,
        )?;
        Ok(config.with_transport_policy(self.on_transport_error))
    }
}

/// Location of the manual override CSV files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideSettings {
    /// Directory holding `portal_manual.csv`, `quota_manual.csv` and templates.
    #[serde(default = "default_override_dir")]
    pub dir: PathBuf,

    /// Store "root" as an explicit portal override instead of deleting the row.
    #[serde(default)]
    pub root_add: bool,
}

impl Default for OverrideSettings {
    fn default() -> Self {
        Self {
            dir: default_override_dir(),
            root_add: false,
        }
    }
}

fn default_override_dir() -> PathBuf {
    PathBuf::from("./config")
}

impl OverrideSettings {
    #[must_use]
    pub fn files(&self) -> OverrideFiles {
        OverrideFiles::in_dir(&self.dir)
    }
}

/// Default quota per patron class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSettings {
    #[serde(default = "default_faculty_quota")]
    pub faculty: u64,

    #[serde(default = "default_grad_quota")]
    pub grad: u64,

    #[serde(default = "default_ugrad_quota")]
    pub ugrad: u64,

    /// Restrict quota assignment to these org codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_codes: Option<Vec<String>>,
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            faculty: default_faculty_quota(),
            grad: default_grad_quota(),
            ugrad: default_ugrad_quota(),
            org_codes: None,
        }
    }
}

fn default_faculty_quota() -> u64 {
    2_147_483_648
}

fn default_grad_quota() -> u64 {
    1_073_741_824
}

fn default_ugrad_quota() -> u64 {
    536_870_912
}

impl QuotaSettings {
    /// Each patron class with its quota group value.
    #[must_use]
    pub fn tiers(&self) -> [(QuotaClass, u64); 3] {
        [
            (QuotaClass::Faculty, self.faculty),
            (QuotaClass::Grad, self.grad),
            (QuotaClass::Ugrad, self.ugrad),
        ]
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines on stdout.
    #[serde(default)]
    pub json: bool,

    /// Also write a dated log file into this directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load `.env`, the YAML file and environment overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> CliResult<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> CliResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> CliResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| CliError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(password) = lookup("REQUIAM_LDAP_PASSWORD") {
            self.ldap.password = password;
        }
        if let Some(password) = lookup("REQUIAM_GROUPER_PASSWORD") {
            self.grouper.password = password;
        }
        if let Some(sync_max) = lookup("REQUIAM_SYNC_MAX") {
            self.sync.sync_max = sync_max.trim().parse().map_err(|_| {
                CliError::Config(format!("REQUIAM_SYNC_MAX is not a count: {sync_max}"))
            })?;
        }
        Ok(())
    }

    /// Reject settings that cannot drive a run.
    pub fn validate(&self) -> CliResult<()> {
        if self.ldap.host.trim().is_empty() {
            return Err(CliError::Config("ldap.host is required".to_string()));
        }
        if self.grouper.host.trim().is_empty() && self.grouper.endpoint.is_none() {
            return Err(CliError::Config("grouper.host is required".to_string()));
        }
        self.sync.to_sync_config()?;

        for (portal, org_codes) in &self.portals {
            if portal.trim().is_empty() {
                return Err(CliError::Config("portal names must not be empty".to_string()));
            }
            if org_codes.is_empty() {
                return Err(CliError::Config(format!(
                    "portal {portal} has no org codes"
                )));
            }
        }
        Ok(())
    }

    /// Fail early when a command needs both service passwords.
    pub fn require_credentials(&self) -> CliResult<()> {
        if self.ldap.password.is_empty() {
            return Err(CliError::Config(
                "LDAP password missing, set REQUIAM_LDAP_PASSWORD".to_string(),
            ));
        }
        if self.grouper.password.is_empty() {
            return Err(CliError::Config(
                "Grouper password missing, set REQUIAM_GROUPER_PASSWORD".to_string(),
            ));
        }
        Ok(())
    }
}
