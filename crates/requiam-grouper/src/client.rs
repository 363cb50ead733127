//! Grouper HTTP client (reqwest-based).
//!
//! Provides a `GrouperClient` that reads group membership and writes
//! membership changes in batches. Every write reports the literal Grouper
//! result code so callers can decide what counts as failure.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use requiam_core::{MemberId, MemberSet};

use crate::config::GrouperConfig;
use crate::error::{GrouperError, GrouperResult};
use crate::models::{
    result_code, MemberLookupRequest, MemberWriteRequest, SubjectLookup, FLAG_FALSE,
};

/// Content type Grouper expects on JSON request bodies.
pub const GROUPER_CONTENT_TYPE: &str = "text/x-json";

/// Result codes accepted as success for membership writes.
pub const MEMBER_WRITE_SUCCESS: &[&str] = &["SUCCESS"];

/// Direction of a membership write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberOperation {
    Add,
    Delete,
}

impl MemberOperation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberOperation::Add => "add",
            MemberOperation::Delete => "delete",
        }
    }

    /// Delete is sent as POST, add as PUT.
    fn method(&self) -> Method {
        match self {
            MemberOperation::Add => Method::PUT,
            MemberOperation::Delete => Method::POST,
        }
    }

    fn result_key(&self) -> &'static str {
        match self {
            MemberOperation::Add => "WsAddMemberResults",
            MemberOperation::Delete => "WsDeleteMemberResults",
        }
    }

    fn request(&self, batch: &[MemberId]) -> MemberWriteRequest {
        let body = MemberLookupRequest {
            replace_all_existing: FLAG_FALSE.to_string(),
            subject_lookups: batch
                .iter()
                .map(|id| SubjectLookup {
                    subject_id: id.to_string(),
                })
                .collect(),
        };
        match self {
            MemberOperation::Add => MemberWriteRequest::Add(body),
            MemberOperation::Delete => MemberWriteRequest::Delete(body),
        }
    }
}

impl fmt::Display for MemberOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership of one group as read from Grouper, plus where to write it back.
///
/// This is a value snapshot; re-querying the client never changes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    /// Full Grouper path of the group.
    pub group_name: String,
    /// Members endpoint used for reads and writes.
    pub members_url: String,
    /// Current members.
    pub members: MemberSet,
}

/// Outcome of a membership write that reached Grouper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub operation: MemberOperation,
    /// Literal `resultMetadata.resultCode`.
    pub result_code: String,
}

impl WriteOutcome {
    /// Exact match against [`MEMBER_WRITE_SUCCESS`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        MEMBER_WRITE_SUCCESS.contains(&self.result_code.as_str())
    }
}

/// Grouper web-services client.
#[derive(Debug, Clone)]
pub struct GrouperClient {
    config: GrouperConfig,
    endpoint: String,
    http_client: Client,
}

impl GrouperClient {
    /// Create a new Grouper client.
    pub fn new(config: GrouperConfig) -> GrouperResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.tls_verify)
            .user_agent(concat!("requiam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GrouperError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(config, http_client))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    #[must_use]
    pub fn with_http_client(config: GrouperConfig, http_client: Client) -> Self {
        let endpoint = config.endpoint();
        Self {
            config,
            endpoint,
            http_client,
        }
    }

    #[must_use]
    pub fn config(&self) -> &GrouperConfig {
        &self.config
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether group paths resolve under the production stem.
    #[must_use]
    pub fn production(&self) -> bool {
        self.config.production
    }

    /// Full URL for a resource path below the endpoint.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    // ── Membership ────────────────────────────────────────────────────

    /// Read the current members of `group` (full Grouper path).
    pub async fn query(&self, group: &str) -> GrouperResult<GroupSnapshot> {
        if group.trim().is_empty() {
            return Err(GrouperError::InvalidArgument(
                "group name must not be empty".to_string(),
            ));
        }

        let members_url = self.url(&format!("groups/{group}/members"));
        debug!(url = %members_url, "Grouper GET members");

        let response = self
            .http_client
            .get(&members_url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .timeout(self.default_timeout())
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let result = body.get("WsGetMembersLiteResult").ok_or_else(|| {
            GrouperError::Parse("missing WsGetMembersLiteResult in response".to_string())
        })?;

        let mut members = MemberSet::new();
        if let Some(subjects) = result.get("wsSubjects").and_then(Value::as_array) {
            for subject in subjects {
                let Some(id) = subject.get("id").and_then(Value::as_str) else {
                    warn!(group = %group, "Skipping subject without id");
                    continue;
                };
                match MemberId::new(id) {
                    Ok(member) => {
                        members.insert(member);
                    }
                    Err(e) => warn!(group = %group, error = %e, "Skipping blank subject id"),
                }
            }
        }

        debug!(group = %group, members = members.len(), "Grouper membership loaded");

        Ok(GroupSnapshot {
            group_name: group.to_string(),
            members_url,
            members,
        })
    }

    /// Remove one batch of members from the group behind `snapshot`.
    pub async fn delete_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        self.write_members(snapshot, MemberOperation::Delete, batch, timeout)
            .await
    }

    /// Add one batch of members to the group behind `snapshot`.
    pub async fn add_members(
        &self,
        snapshot: &GroupSnapshot,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        self.write_members(snapshot, MemberOperation::Add, batch, timeout)
            .await
    }

    /// Send one membership write and return the literal result code.
    ///
    /// A non-success result code is NOT an error here; only transport,
    /// HTTP status and parse failures are.
    pub async fn write_members(
        &self,
        snapshot: &GroupSnapshot,
        operation: MemberOperation,
        batch: &[MemberId],
        timeout: Duration,
    ) -> GrouperResult<WriteOutcome> {
        let request = operation.request(batch);
        debug!(
            operation = %operation,
            url = %snapshot.members_url,
            size = batch.len(),
            "Grouper membership write"
        );

        let body = self
            .send_json(operation.method(), &snapshot.members_url, &request, timeout)
            .await?;

        Ok(WriteOutcome {
            operation,
            result_code: result_code(&body, operation.result_key())?,
        })
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    pub(crate) async fn send_json<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> GrouperResult<Value> {
        let payload = serde_json::to_vec(body)?;
        let response = self
            .http_client
            .request(method, url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .header(CONTENT_TYPE, GROUPER_CONTENT_TYPE)
            .timeout(timeout)
            .body(payload)
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub(crate) async fn post_admin<B: Serialize>(&self, url: &str, body: &B) -> GrouperResult<Value> {
        self.send_json(Method::POST, url, body, self.default_timeout())
            .await
    }

    async fn read_json(response: reqwest::Response) -> GrouperResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Grouper returned error status");
            return Err(GrouperError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| GrouperError::Parse(format!("failed to parse response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_success_match() {
        let ok = WriteOutcome {
            operation: MemberOperation::Add,
            result_code: "SUCCESS".to_string(),
        };
        assert!(ok.is_success());

        // Substrings of "SUCCESS" are not success.
        for code in ["SUCCE", "", "S", "SUCCESS_WITH_WARNINGS", "PROBLEM_DELETING_MEMBERS"] {
            let outcome = WriteOutcome {
                operation: MemberOperation::Delete,
                result_code: code.to_string(),
            };
            assert!(!outcome.is_success(), "{code} must not count as success");
        }
    }

    #[test]
    fn test_operation_methods() {
        assert_eq!(MemberOperation::Delete.method(), Method::POST);
        assert_eq!(MemberOperation::Add.method(), Method::PUT);
    }

    #[test]
    fn test_url_join() {
        let client = GrouperClient::with_http_client(
            GrouperConfig::new("h", "p", "u", "pw").with_endpoint("http://localhost:1/api/"),
            Client::new(),
        );
        assert_eq!(client.url("/groups"), "http://localhost:1/api/groups");
    }
}
