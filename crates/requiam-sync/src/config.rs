//! Synchronization settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Base delay for the first retry under [`TransportErrorPolicy::Retry`].
pub const RETRY_BASE_DELAY_SECS: u64 = 1;

/// What to do when a batch write fails below the result-code layer
/// (connection error, timeout, HTTP error status, unreadable body).
///
/// Serialized in its string form, e.g. `skip_batch` or `retry(5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransportErrorPolicy {
    /// Stop the run and return the error with the partial report.
    #[default]
    Abort,
    /// Record the batch as skipped and continue with the next one.
    SkipBatch,
    /// Retry transient failures up to `retries` times after the first call,
    /// with exponential backoff, then abort.
    Retry { retries: u32 },
}

impl TransportErrorPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorPolicy::Abort => "abort",
            TransportErrorPolicy::SkipBatch => "skip_batch",
            TransportErrorPolicy::Retry { .. } => "retry",
        }
    }
}

impl fmt::Display for TransportErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorPolicy::Retry { retries } => write!(f, "retry({retries})"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for TransportErrorPolicy {
    type Err = SyncError;

    /// Accepts `abort`, `skip_batch` (or `skip-batch`), `retry` (3 retries)
    /// and `retry(N)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "abort" => return Ok(TransportErrorPolicy::Abort),
            "skip_batch" | "skip-batch" => return Ok(TransportErrorPolicy::SkipBatch),
            "retry" => return Ok(TransportErrorPolicy::Retry { retries: 3 }),
            _ => {}
        }

        s.strip_prefix("retry(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.trim().parse().ok())
            .map(|retries| TransportErrorPolicy::Retry { retries })
            .ok_or_else(|| {
                SyncError::InvalidArgument(format!("unknown transport error policy: {s}"))
            })
    }
}

impl TryFrom<String> for TransportErrorPolicy {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransportErrorPolicy> for String {
    fn from(policy: TransportErrorPolicy) -> Self {
        policy.to_string()
    }
}

/// Immutable batch settings for one synchronization run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    batch_size: usize,
    batch_timeout: Duration,
    batch_delay: Duration,
    sync_max: usize,
    on_transport_error: TransportErrorPolicy,
}

impl SyncConfig {
    /// Validate and build a config.
    ///
    /// `batch_size`, `batch_timeout_secs` and `sync_max` must be positive;
    /// a zero `batch_delay_secs` disables pacing.
    pub fn new(
        batch_size: usize,
        batch_timeout_secs: u64,
        batch_delay_secs: u64,
        sync_max: usize,
    ) -> SyncResult<Self> {
        if batch_size == 0 {
            return Err(SyncError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }
        if batch_timeout_secs == 0 {
            return Err(SyncError::InvalidArgument(
                "batch_timeout must be positive".to_string(),
            ));
        }
        if sync_max == 0 {
            return Err(SyncError::InvalidArgument(
                "sync_max must be positive".to_string(),
            ));
        }

        Ok(Self {
            batch_size,
            batch_timeout: Duration::from_secs(batch_timeout_secs),
            batch_delay: Duration::from_secs(batch_delay_secs),
            sync_max,
            on_transport_error: TransportErrorPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_transport_policy(mut self, policy: TransportErrorPolicy) -> Self {
        self.on_transport_error = policy;
        self
    }

    /// Maximum members per write call.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Timeout applied to each write call.
    #[must_use]
    pub fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    /// Pause after every batch.
    #[must_use]
    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    /// Ceiling on `|adds| + |drops|`.
    #[must_use]
    pub fn sync_max(&self) -> usize {
        self.sync_max
    }

    #[must_use]
    pub fn on_transport_error(&self) -> TransportErrorPolicy {
        self.on_transport_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_values() {
        assert!(SyncConfig::new(0, 30, 0, 10).is_err());
        assert!(SyncConfig::new(10, 0, 0, 10).is_err());
        assert!(SyncConfig::new(10, 30, 0, 0).is_err());
        assert!(matches!(
            SyncConfig::new(0, 30, 0, 10),
            Err(SyncError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_defaults_to_abort() {
        let config = SyncConfig::new(100, 30, 0, 1000).unwrap();
        assert_eq!(config.on_transport_error(), TransportErrorPolicy::Abort);
        assert_eq!(config.batch_delay(), Duration::ZERO);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "abort".parse::<TransportErrorPolicy>().unwrap(),
            TransportErrorPolicy::Abort
        );
        assert_eq!(
            "skip-batch".parse::<TransportErrorPolicy>().unwrap(),
            TransportErrorPolicy::SkipBatch
        );
        assert_eq!(
            "retry(5)".parse::<TransportErrorPolicy>().unwrap(),
            TransportErrorPolicy::Retry { retries: 5 }
        );
        assert!("ignore".parse::<TransportErrorPolicy>().is_err());
        assert!("retry(x)".parse::<TransportErrorPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_uses_string_form() {
        let policy: TransportErrorPolicy = serde_json::from_str("\"retry(2)\"").unwrap();
        assert_eq!(policy, TransportErrorPolicy::Retry { retries: 2 });
        assert_eq!(serde_json::to_string(&policy).unwrap(), "\"retry(2)\"");
        assert!(serde_json::from_str::<TransportErrorPolicy>("\"ignore\"").is_err());
    }
}
