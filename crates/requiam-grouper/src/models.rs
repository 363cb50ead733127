//! Grouper web-services wire types.
//!
//! Request bodies are externally tagged with the Grouper request name
//! (`{"WsRestAddMemberRequest": {...}}`); responses are read through JSON
//! pointers since only a handful of fields are consulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GrouperError, GrouperResult};

/// Grouper boolean flag (`"T"` / `"F"`).
pub const FLAG_TRUE: &str = "T";
pub const FLAG_FALSE: &str = "F";

/// One subject reference inside a membership write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectLookup {
    pub subject_id: String,
}

/// Body shared by add and delete membership requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLookupRequest {
    pub replace_all_existing: String,
    pub subject_lookups: Vec<SubjectLookup>,
}

/// Membership write request envelope.
#[derive(Debug, Clone, Serialize)]
pub enum MemberWriteRequest {
    #[serde(rename = "WsRestDeleteMemberRequest")]
    Delete(MemberLookupRequest),
    #[serde(rename = "WsRestAddMemberRequest")]
    Add(MemberLookupRequest),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub query_filter_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindGroupsRequest {
    pub ws_query_filter: QueryFilter,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsGroup {
    pub description: String,
    pub display_extension: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsGroupLookup {
    pub group_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupToSave {
    pub ws_group: WsGroup,
    pub ws_group_lookup: WsGroupLookup,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSaveRequest {
    pub ws_group_to_saves: Vec<GroupToSave>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPrivilegeRequest {
    pub allowed: String,
    pub subject_id: String,
    pub privilege_name: String,
    pub group_name: String,
    pub privilege_type: String,
}

/// Admin request envelope.
#[derive(Debug, Clone, Serialize)]
pub enum AdminRequest {
    #[serde(rename = "WsRestFindGroupsRequest")]
    FindGroups(FindGroupsRequest),
    #[serde(rename = "WsRestGroupSaveRequest")]
    GroupSave(GroupSaveRequest),
    #[serde(rename = "WsRestAssignGrouperPrivilegesLiteRequest")]
    AssignPrivilege(AssignPrivilegeRequest),
}

/// Read `{result_key}.resultMetadata.resultCode` from a response body.
pub fn result_code(body: &Value, result_key: &str) -> GrouperResult<String> {
    let pointer = format!("/{result_key}/resultMetadata/resultCode");
    body.pointer(&pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GrouperError::Parse(format!("missing {pointer} in response")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_request_shape() {
        let request = MemberWriteRequest::Delete(MemberLookupRequest {
            replace_all_existing: FLAG_FALSE.to_string(),
            subject_lookups: vec![SubjectLookup {
                subject_id: "D".to_string(),
            }],
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "WsRestDeleteMemberRequest": {
                    "replaceAllExisting": "F",
                    "subjectLookups": [{"subjectId": "D"}]
                }
            })
        );
    }

    #[test]
    fn test_result_code_lookup() {
        let body = json!({"WsAddMemberResults": {"resultMetadata": {"resultCode": "SUCCESS"}}});
        assert_eq!(result_code(&body, "WsAddMemberResults").unwrap(), "SUCCESS");
        assert!(result_code(&body, "WsDeleteMemberResults").is_err());
    }
}
