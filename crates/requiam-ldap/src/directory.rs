//! Directory search over `ldap3`.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use std::time::Duration;
use tracing::{debug, info, warn};

use requiam_core::{MemberId, MemberSet};

use crate::config::{LdapConfig, MEMBER_ATTRIBUTE};
use crate::error::{LdapError, LdapResult};
use crate::filters::uid_query;

/// Source of authoritative member sets.
#[async_trait]
pub trait DirectorySearch: Send + Sync {
    /// Run every filter and return the union of matching members.
    async fn search(&self, filters: &[String]) -> LdapResult<MemberSet>;

    /// Resolve a NetID to its member identifier.
    async fn lookup_member(&self, netid: &str) -> LdapResult<Option<MemberId>> {
        let found = self.search(&uid_query(netid)).await?;
        if found.len() > 1 {
            warn!(netid = %netid, matches = found.len(), "NetID matched several entries");
        }
        Ok(found.sorted().into_iter().next())
    }
}

/// Bound connection to the campus directory.
pub struct LdapDirectory {
    config: LdapConfig,
    ldap: Ldap,
}

impl LdapDirectory {
    /// Connect and bind with the application account.
    pub async fn connect(config: LdapConfig) -> LdapResult<Self> {
        let url = config.bind_url();
        debug!(url = %url, "Connecting to LDAP server");

        let settings =
            LdapConnSettings::new().set_conn_timeout(Duration::from_secs(config.timeout_secs));

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| LdapError::connection(format!("failed to connect to {url}"), e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = config.bind_dn();
        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .simple_bind(&bind_dn, &config.password)
            .await
            .map_err(|e| LdapError::connection(format!("bind failed for {bind_dn}"), e))?;

        match result.rc {
            0 => {}
            49 => return Err(LdapError::AuthenticationFailed { bind_dn }),
            rc => {
                return Err(LdapError::Connection {
                    message: format!("bind failed with code {rc}: {}", result.text),
                    source: None,
                })
            }
        }

        info!(host = %config.host, "LDAP connection established");
        Ok(Self { config, ldap })
    }

    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }

    /// Release the connection.
    pub async fn unbind(mut self) {
        if let Err(e) = self.ldap.unbind().await {
            warn!(error = %e, "Error during LDAP unbind");
        }
    }

    async fn search_one(&self, filter: &str) -> LdapResult<MemberSet> {
        let mut ldap = self.ldap.clone();
        let search_dn = self.config.search_dn();

        let result = ldap
            .with_timeout(Duration::from_secs(self.config.timeout_secs))
            .search(&search_dn, Scope::Subtree, filter, vec![MEMBER_ATTRIBUTE])
            .await
            .map_err(|e| LdapError::connection("search request failed", e))?;

        let (entries, _) = result.success().map_err(|e| match e {
            ldap3::LdapError::LdapResult { result } => LdapError::Search {
                rc: result.rc,
                text: result.text,
            },
            other => LdapError::connection("search failed", other),
        })?;

        let mut members = MemberSet::new();
        for entry in entries.into_iter().map(SearchEntry::construct) {
            let Some(value) = entry
                .attrs
                .get(MEMBER_ATTRIBUTE)
                .and_then(|values| values.first())
            else {
                debug!(dn = %entry.dn, "Entry has no member attribute");
                continue;
            };
            match MemberId::new(value.as_str()) {
                Ok(id) => {
                    members.insert(id);
                }
                Err(e) => warn!(dn = %entry.dn, error = %e, "Skipping blank member id"),
            }
        }
        Ok(members)
    }
}

#[async_trait]
impl DirectorySearch for LdapDirectory {
    async fn search(&self, filters: &[String]) -> LdapResult<MemberSet> {
        let mut all_members = MemberSet::new();
        for filter in filters {
            let members = self.search_one(filter).await?;
            debug!(filter = %filter, count = members.len(), "LDAP search");
            all_members.extend(members);
        }
        info!(filters = filters.len(), members = all_members.len(), "Directory search complete");
        Ok(all_members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedDirectory(HashMap<String, Vec<&'static str>>);

    #[async_trait]
    impl DirectorySearch for FixedDirectory {
        async fn search(&self, filters: &[String]) -> LdapResult<MemberSet> {
            Ok(filters
                .iter()
                .flat_map(|f| self.0.get(f).cloned().unwrap_or_default())
                .map(MemberId::from_static)
                .collect())
        }
    }

    #[tokio::test]
    async fn test_lookup_member() {
        let mut entries = HashMap::new();
        entries.insert("(uid=jdoe)".to_string(), vec!["12345"]);
        let directory = FixedDirectory(entries);

        assert_eq!(
            directory.lookup_member("jdoe").await.unwrap(),
            Some(MemberId::from_static("12345"))
        );
        assert_eq!(directory.lookup_member("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_search_unions_filters() {
        let mut entries = HashMap::new();
        entries.insert("a".to_string(), vec!["1", "2"]);
        entries.insert("b".to_string(), vec!["2", "3"]);
        let directory = FixedDirectory(entries);

        let members = directory
            .search(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(members.len(), 3);
    }
}
