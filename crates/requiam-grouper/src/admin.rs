//! Group administration: lookup, creation and privilege assignment.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::client::GrouperClient;
use crate::error::{GrouperError, GrouperResult};
use crate::models::{
    result_code, AdminRequest, AssignPrivilegeRequest, FindGroupsRequest, GroupSaveRequest,
    GroupToSave, QueryFilter, WsGroup, WsGroupLookup, FLAG_TRUE,
};
use crate::stem::{figshare_group, figshare_stem, GroupType};

/// Result codes accepted when assigning a privilege.
pub const PRIVILEGE_SUCCESS: &[&str] = &["SUCCESS_ALLOWED", "SUCCESS_ALLOWED_ALREADY_EXISTED"];

/// Result codes accepted when saving a group.
pub const GROUP_SAVE_SUCCESS: &[&str] = &["SUCCESS"];

/// Access privilege on a Grouper group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    Read,
    View,
    Update,
    Admin,
    Optin,
    Optout,
}

impl Privilege {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Read => "read",
            Privilege::View => "view",
            Privilege::Update => "update",
            Privilege::Admin => "admin",
            Privilege::Optin => "optin",
            Privilege::Optout => "optout",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Privilege {
    type Err = GrouperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Privilege::Read),
            "view" => Ok(Privilege::View),
            "update" => Ok(Privilege::Update),
            "admin" => Ok(Privilege::Admin),
            "optin" => Ok(Privilege::Optin),
            "optout" => Ok(Privilege::Optout),
            other => Err(GrouperError::InvalidArgument(format!(
                "invalid privilege name: {other}"
            ))),
        }
    }
}

/// A group as returned by the find-groups call.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub display_extension: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn group_results(body: &Value) -> GrouperResult<Option<Vec<GroupRecord>>> {
    match body.pointer("/WsFindGroupsResults/groupResults") {
        Some(results) => Ok(Some(serde_json::from_value(results.clone())?)),
        None => Ok(None),
    }
}

impl GrouperClient {
    /// List the groups in a figshare stem.
    ///
    /// Returns [`GrouperError::EmptyStem`] when the stem holds no groups.
    pub async fn get_group_list(&self, group_type: GroupType) -> GrouperResult<Vec<GroupRecord>> {
        let stem = figshare_stem(group_type, self.production());
        let request = AdminRequest::FindGroups(FindGroupsRequest {
            ws_query_filter: QueryFilter {
                query_filter_type: "FIND_BY_STEM_NAME".to_string(),
                stem_name: Some(stem.clone()),
                group_name: None,
            },
        });

        let body = self.post_admin(&self.url("groups"), &request).await?;
        group_results(&body)?.ok_or(GrouperError::EmptyStem { stem })
    }

    /// Look up groups by (approximate) full name.
    pub async fn get_group_details(&self, group: &str) -> GrouperResult<Vec<GroupRecord>> {
        let request = AdminRequest::FindGroups(FindGroupsRequest {
            ws_query_filter: QueryFilter {
                query_filter_type: "FIND_BY_GROUP_NAME_APPROXIMATE".to_string(),
                stem_name: None,
                group_name: Some(group.to_string()),
            },
        });

        let body = self.post_admin(&self.url("groups"), &request).await?;
        Ok(group_results(&body)?.unwrap_or_default())
    }

    /// Whether `group` exists within the stem for `group_type`.
    pub async fn check_group_exists(&self, group: &str, group_type: GroupType) -> GrouperResult<bool> {
        let groups = self.get_group_list(group_type).await?;
        Ok(groups.iter().any(|g| g.display_extension == group))
    }

    /// Create `group` within the stem for `group_type`.
    pub async fn add_group(
        &self,
        group: &str,
        group_type: GroupType,
        description: &str,
    ) -> GrouperResult<()> {
        if matches!(group_type, GroupType::Root) {
            return Err(GrouperError::InvalidArgument(
                "groups cannot be created at the stem root".to_string(),
            ));
        }

        let grouper_name = figshare_group(group, group_type, self.production());
        let request = AdminRequest::GroupSave(GroupSaveRequest {
            ws_group_to_saves: vec![GroupToSave {
                ws_group: WsGroup {
                    description: description.to_string(),
                    display_extension: group.to_string(),
                    name: grouper_name.clone(),
                },
                ws_group_lookup: WsGroupLookup {
                    group_name: grouper_name.clone(),
                },
            }],
        });

        let body = self.post_admin(&self.url("groups"), &request).await?;
        let code = result_code(&body, "WsGroupSaveResults")?;
        if !GROUP_SAVE_SUCCESS.contains(&code.as_str()) {
            return Err(GrouperError::UnexpectedResultCode {
                operation: "add_group".to_string(),
                code,
            });
        }

        info!(group = %grouper_name, "Grouper group created");
        Ok(())
    }

    /// Grant `privileges` on a figshare group to `access_group` (full path).
    pub async fn add_privilege(
        &self,
        access_group: &str,
        target_group: &str,
        target_group_type: GroupType,
        privileges: &[Privilege],
    ) -> GrouperResult<()> {
        if privileges.is_empty() {
            return Err(GrouperError::InvalidArgument(
                "at least one privilege is required".to_string(),
            ));
        }

        if !self.check_group_exists(target_group, target_group_type).await? {
            return Err(GrouperError::GroupNotFound(target_group.to_string()));
        }

        let access = self
            .get_group_details(access_group)
            .await?
            .pop()
            .ok_or_else(|| GrouperError::GroupNotFound(access_group.to_string()))?;

        let target_name = figshare_group(target_group, target_group_type, self.production());
        let url = self.url("grouperPrivileges");

        for privilege in privileges {
            let request = AdminRequest::AssignPrivilege(AssignPrivilegeRequest {
                allowed: FLAG_TRUE.to_string(),
                subject_id: access.uuid.clone(),
                privilege_name: privilege.to_string(),
                group_name: target_name.clone(),
                privilege_type: "access".to_string(),
            });

            let body = self.post_admin(&url, &request).await?;
            let code = result_code(&body, "WsAssignGrouperPrivilegesLiteResult")?;
            if !PRIVILEGE_SUCCESS.contains(&code.as_str()) {
                return Err(GrouperError::UnexpectedResultCode {
                    operation: format!("add_privilege {privilege}"),
                    code,
                });
            }
            debug!(group = %target_name, privilege = %privilege, code = %code, "Privilege assigned");
        }

        info!(
            group = %target_name,
            access_group = %access_group,
            count = privileges.len(),
            "Grouper privileges assigned"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_privilege_parse() {
        assert_eq!("optout".parse::<Privilege>().unwrap(), Privilege::Optout);
        assert!("delete".parse::<Privilege>().is_err());
    }

    #[test]
    fn test_group_results_missing_is_none() {
        let body = json!({"WsFindGroupsResults": {"resultMetadata": {"resultCode": "SUCCESS"}}});
        assert!(group_results(&body).unwrap().is_none());
    }

    #[test]
    fn test_group_results_parse() {
        let body = json!({"WsFindGroupsResults": {"groupResults": [
            {"name": "a:b:sci_math", "displayExtension": "sci_math", "uuid": "u1"}
        ]}});
        let groups = group_results(&body).unwrap().unwrap();
        assert_eq!(groups[0].display_extension, "sci_math");
        assert_eq!(groups[0].uuid, "u1");
    }
}
