//! User-update command - Move individual users between portal or quota groups
//!
//! Adding a user to a group also drops them from every other group in the
//! same stem, since a user holds one portal and one quota. The target
//! "root" means "back to the default": the user is dropped from every group
//! and the override row is cleared. With `--sync` the override table is
//! rewritten once every Grouper change succeeded.

use clap::{ArgGroup, Args};
use tracing::info;

use requiam_core::{ExternalKey, MemberEntry, MemberId};
use requiam_grouper::{figshare_group, GroupType, GrouperClient, GrouperError};
use requiam_ldap::{DirectorySearch, LdapDirectory};
use requiam_sync::{
    delta_for_user, CancellationToken, Delta, ManualOverride, OverrideAction, OverrideCategory,
    SyncConfig, TracingObserver,
};

use crate::commands::{interrupt_token, RunSummary};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::{
    print_delta, print_dry_run, print_header, print_info, print_report, print_success,
};

/// Group value meaning "no override".
const ROOT: &str = "root";

/// Arguments for the user-update command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["portal", "quota"])))]
pub struct UserUpdateArgs {
    /// Comma-separated NetIDs
    #[arg(long, value_delimiter = ',', required = true)]
    pub netid: Vec<String>,

    /// Comma-separated UA IDs in --netid order; looked up in LDAP when omitted
    #[arg(long, value_delimiter = ',')]
    pub uaid: Vec<String>,

    /// Target portal name, or "root"
    #[arg(long)]
    pub portal: Option<String>,

    /// Target quota in bytes, or "root"
    #[arg(long)]
    pub quota: Option<String>,

    /// Remove the users from the target instead of adding them
    #[arg(long)]
    pub remove: bool,

    /// Write changes to Grouper and the override file (default is a dry run)
    #[arg(long)]
    pub sync: bool,
}

/// Where the users are being moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTarget {
    pub category: OverrideCategory,
    pub group_type: GroupType,
    pub value: String,
}

impl UserTarget {
    /// Resolve and check the target named on the command line.
    pub fn from_args(args: &UserUpdateArgs) -> CliResult<Self> {
        let (category, group_type, value) = match (&args.portal, &args.quota) {
            (Some(portal), None) => (OverrideCategory::Portal, GroupType::Portal, portal),
            (None, Some(quota)) => (OverrideCategory::Quota, GroupType::Quota, quota),
            _ => {
                return Err(CliError::Validation(
                    "exactly one of --portal or --quota is required".to_string(),
                ))
            }
        };

        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(CliError::Validation("target group is empty".to_string()));
        }
        if category == OverrideCategory::Quota && value != ROOT && value.parse::<i64>().is_err() {
            return Err(CliError::Validation(format!(
                "quota must be an integer number of bytes or \"root\", got {value}"
            )));
        }
        if args.remove && value == ROOT {
            return Err(CliError::Validation(
                "--remove cannot be combined with the root target".to_string(),
            ));
        }

        Ok(Self {
            category,
            group_type,
            value,
        })
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.value == ROOT
    }

    /// Value recorded in the override table for this update.
    #[must_use]
    pub fn recorded_value(&self, remove: bool) -> &str {
        if remove {
            ROOT
        } else {
            &self.value
        }
    }
}

/// Pair NetIDs with the UA IDs given on the command line.
pub fn pair_entries(netids: &[String], uaids: &[String]) -> CliResult<Vec<MemberEntry>> {
    if netids.len() != uaids.len() {
        return Err(CliError::Validation(format!(
            "{} NetIDs but {} UA IDs",
            netids.len(),
            uaids.len()
        )));
    }
    netids
        .iter()
        .zip(uaids)
        .map(|(netid, uaid)| {
            Ok(MemberEntry::new(
                ExternalKey::new(netid.as_str())?,
                MemberId::new(uaid.as_str())?,
            ))
        })
        .collect()
}

async fn resolve_entries(args: &UserUpdateArgs, config: &AppConfig) -> CliResult<Vec<MemberEntry>> {
    if !args.uaid.is_empty() {
        return pair_entries(&args.netid, &args.uaid);
    }

    let directory = LdapDirectory::connect(config.ldap.clone()).await?;
    let mut entries = Vec::with_capacity(args.netid.len());
    let mut lookup_error = None;
    for netid in &args.netid {
        match directory.lookup_member(netid).await {
            Ok(Some(member)) => {
                info!(netid = %netid, uaid = %member, "NetID resolved");
                entries.push(MemberEntry::new(ExternalKey::new(netid.as_str())?, member));
            }
            Ok(None) => {
                lookup_error = Some(CliError::NotFound(format!("NetID {netid} not in directory")));
                break;
            }
            Err(e) => {
                lookup_error = Some(e.into());
                break;
            }
        }
    }
    directory.unbind().await;

    match lookup_error {
        Some(e) => Err(e),
        None => Ok(entries),
    }
}

/// Execute the user-update command
pub async fn execute(args: UserUpdateArgs, config: &AppConfig) -> CliResult<()> {
    config.require_credentials()?;
    let target = UserTarget::from_args(&args)?;
    let sync_config = config.sync.to_sync_config()?;

    let mut overrides = ManualOverride::load(&config.overrides.files(), config.overrides.root_add)?;
    let entries = resolve_entries(&args, config).await?;
    let client = GrouperClient::new(config.grouper.clone())?;
    let cancel = interrupt_token();

    let mut summary = RunSummary::default();

    if !target.is_root() {
        if !client
            .check_group_exists(&target.value, target.group_type)
            .await?
        {
            return Err(CliError::NotFound(figshare_group(
                &target.value,
                target.group_type,
                client.production(),
            )));
        }

        let group = figshare_group(&target.value, target.group_type, client.production());
        let action = if args.remove {
            OverrideAction::Remove
        } else {
            OverrideAction::Add
        };
        let snapshot = client.query(&group).await?;
        let delta = delta_for_user(snapshot, &entries, action, sync_config.clone());
        apply(&delta, &client, &cancel, args.sync, &mut summary).await?;
    }

    if !args.remove {
        drop_from_other_groups(
            &target,
            &entries,
            &client,
            &sync_config,
            &cancel,
            args.sync,
            &mut summary,
        )
        .await?;
    }

    if !args.sync {
        print_info("Dry run, override file not updated");
        return Ok(());
    }
    if !summary.is_clean() {
        return summary.finish();
    }

    let update = overrides.update_dataframe(
        &entries,
        target.recorded_value(args.remove),
        target.category,
    )?;
    info!(
        inserted = update.inserted,
        updated = update.updated,
        removed = update.removed,
        "Override table updated"
    );
    print_success(&format!(
        "Updated {} {} for {} users",
        target.category,
        target.recorded_value(args.remove),
        entries.len()
    ));
    Ok(())
}

/// Remove the users from every other group in the target's stem.
async fn drop_from_other_groups(
    target: &UserTarget,
    entries: &[MemberEntry],
    client: &GrouperClient,
    sync_config: &SyncConfig,
    cancel: &CancellationToken,
    write: bool,
    summary: &mut RunSummary,
) -> CliResult<()> {
    let target_group = figshare_group(&target.value, target.group_type, client.production());

    let groups = match client.get_group_list(target.group_type).await {
        Ok(groups) => groups,
        Err(GrouperError::EmptyStem { .. }) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    for group in groups {
        if group.name == target_group {
            continue;
        }
        let snapshot = client.query(&group.name).await?;
        let present: Vec<MemberEntry> = entries
            .iter()
            .filter(|e| snapshot.members.contains(&e.member))
            .cloned()
            .collect();
        if present.is_empty() {
            continue;
        }

        let delta = delta_for_user(snapshot, &present, OverrideAction::Remove, sync_config.clone());
        apply(&delta, client, cancel, write, summary).await?;
    }
    Ok(())
}

async fn apply(
    delta: &Delta,
    client: &GrouperClient,
    cancel: &CancellationToken,
    write: bool,
    summary: &mut RunSummary,
) -> CliResult<()> {
    print_header(delta.group());
    print_delta(delta);
    if !write {
        print_dry_run(delta);
        return Ok(());
    }
    let report = delta.synchronize(client, &TracingObserver, cancel).await?;
    print_report(&report);
    summary.record(&report);
    Ok(())
}
