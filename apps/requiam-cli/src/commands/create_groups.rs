//! Create-groups command - Create portal or quota groups and grant admin access

use clap::Args;
use tracing::info;

use requiam_grouper::{figshare_group, GroupType, GrouperClient, Privilege};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{print_info, print_success, print_warning};

/// Group granted admin on every new group.
pub const SUPERADMINS: &str = "GrouperSuperAdmins";

/// Group granted read, view and optout on every new group.
pub const ADMINS: &str = "GrouperAdmins";

/// Arguments for the create-groups command
#[derive(Args, Debug)]
pub struct CreateGroupsArgs {
    /// Stem to create the groups in: portal or quota
    #[arg(long, default_value = "portal")]
    pub group_type: String,

    /// Comma-separated group names
    #[arg(long, value_delimiter = ',', required = true)]
    pub groups: Vec<String>,

    /// Comma-separated descriptions, one per group
    #[arg(long, value_delimiter = ',', required = true)]
    pub descriptions: Vec<String>,

    /// Create the groups (default is a dry run)
    #[arg(long)]
    pub add: bool,
}

/// Validated request: group type plus (name, description) pairs.
pub fn plan_groups(args: &CreateGroupsArgs) -> CliResult<(GroupType, Vec<(String, String)>)> {
    let group_type: GroupType = args.group_type.parse()?;
    if !matches!(group_type, GroupType::Portal | GroupType::Quota) {
        return Err(CliError::Validation(format!(
            "group type must be portal or quota, got {}",
            args.group_type
        )));
    }
    if args.groups.len() != args.descriptions.len() {
        return Err(CliError::Validation(format!(
            "{} groups but {} descriptions",
            args.groups.len(),
            args.descriptions.len()
        )));
    }

    let mut pairs = Vec::with_capacity(args.groups.len());
    for (group, description) in args.groups.iter().zip(&args.descriptions) {
        let group = group.trim();
        if group.is_empty() {
            return Err(CliError::Validation("group names must not be empty".to_string()));
        }
        if group_type == GroupType::Quota && group.parse::<i64>().is_err() {
            return Err(CliError::Validation(format!(
                "quota group names must be integers, got {group}"
            )));
        }
        pairs.push((group.to_string(), description.trim().to_string()));
    }
    Ok((group_type, pairs))
}

/// Execute the create-groups command
pub async fn execute(args: CreateGroupsArgs, config: &AppConfig) -> CliResult<()> {
    if config.grouper.password.is_empty() {
        return Err(CliError::Config(
            "Grouper password missing, set REQUIAM_GROUPER_PASSWORD".to_string(),
        ));
    }
    let (group_type, pairs) = plan_groups(&args)?;
    let client = GrouperClient::new(config.grouper.clone())?;
    let production = client.production();

    let superadmins = figshare_group(SUPERADMINS, GroupType::Root, production);
    let admins = figshare_group(ADMINS, GroupType::Root, production);

    for (group, description) in &pairs {
        let path = figshare_group(group, group_type, production);
        if client.check_group_exists(group, group_type).await? {
            print_warning(&format!("{path} already exists"));
            continue;
        }

        if !args.add {
            print_info(&format!("Would create {path} ({description})"));
            continue;
        }

        client.add_group(group, group_type, description).await?;
        client
            .add_privilege(&superadmins, group, group_type, &[Privilege::Admin])
            .await?;
        client
            .add_privilege(
                &admins,
                group,
                group_type,
                &[Privilege::Read, Privilege::View, Privilege::Optout],
            )
            .await?;

        info!(group = %path, "Group created with admin privileges");
        print_success(&format!("Created {path}"));
    }

    if !args.add {
        print_info("Dry run, no groups created");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(group_type: &str, groups: &[&str], descriptions: &[&str]) -> CreateGroupsArgs {
        CreateGroupsArgs {
            group_type: group_type.to_string(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            descriptions: descriptions.iter().map(|s| s.to_string()).collect(),
            add: false,
        }
    }

    #[test]
    fn test_plan_pairs_names_with_descriptions() {
        let (group_type, pairs) =
            plan_groups(&args("portal", &["sci_math", " astro "], &["Science", "Astronomy"]))
                .unwrap();
        assert_eq!(group_type, GroupType::Portal);
        assert_eq!(pairs[1], ("astro".to_string(), "Astronomy".to_string()));
    }

    #[test]
    fn test_plan_rejects_length_mismatch() {
        let err = plan_groups(&args("portal", &["a", "b"], &["A"])).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_plan_rejects_non_integer_quota() {
        assert!(plan_groups(&args("quota", &["1073741824"], &["1 GB"])).is_ok());
        assert!(plan_groups(&args("quota", &["big"], &["?"])).is_err());
    }

    #[test]
    fn test_plan_rejects_other_stems() {
        assert!(plan_groups(&args("test", &["a"], &["A"])).is_err());
        assert!(plan_groups(&args("bogus", &["a"], &["A"])).is_err());
    }
}
