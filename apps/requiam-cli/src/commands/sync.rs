//! Sync command - Reconcile portal and quota groups with the directory

use clap::Args;
use tracing::{info, warn};

use requiam_grouper::{figshare_group, GroupType, GrouperClient};
use requiam_ldap::filters::{ual_ldap_queries, ual_ldap_quota_query};
use requiam_ldap::{DirectorySearch, LdapDirectory};
use requiam_sync::{Delta, ManualOverride, OverrideCategory, TracingObserver};

use crate::commands::{interrupt_token, RunSummary};
use crate::config::AppConfig;
use crate::error::CliResult;
use crate::output::{
    print_delta, print_dry_run, print_header, print_report, print_success, print_warning,
};

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Write changes to Grouper (default is a dry run)
    #[arg(long)]
    pub sync: bool,

    /// Only portal groups
    #[arg(long)]
    pub portal: bool,

    /// Only quota groups
    #[arg(long)]
    pub quota: bool,

    /// Override sync.sync_max for this run
    #[arg(long)]
    pub sync_max: Option<usize>,
}

/// One Grouper group and the directory filters that define it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    pub category: OverrideCategory,
    /// Portal name or quota value, as stored in the override table.
    pub value: String,
    /// Full Grouper path.
    pub group: String,
    pub filters: Vec<String>,
}

/// Groups to reconcile, quotas first.
///
/// With neither flag set both categories are planned.
#[must_use]
pub fn plan_targets(config: &AppConfig, portal: bool, quota: bool) -> Vec<SyncTarget> {
    let (portal, quota) = if !portal && !quota {
        (true, true)
    } else {
        (portal, quota)
    };
    let production = config.grouper.production;
    let mut targets = Vec::new();

    if quota {
        for (class, bytes) in config.quotas.tiers() {
            let value = bytes.to_string();
            targets.push(SyncTarget {
                category: OverrideCategory::Quota,
                group: figshare_group(&value, GroupType::Quota, production),
                filters: ual_ldap_quota_query(class, config.quotas.org_codes.as_deref()),
                value,
            });
        }
    }

    if portal {
        for (name, org_codes) in &config.portals {
            targets.push(SyncTarget {
                category: OverrideCategory::Portal,
                group: figshare_group(name, GroupType::Portal, production),
                filters: ual_ldap_queries(org_codes.as_slice()),
                value: name.clone(),
            });
        }
    }

    targets
}

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &AppConfig) -> CliResult<()> {
    config.require_credentials()?;

    let mut settings = config.sync.clone();
    if let Some(sync_max) = args.sync_max {
        settings.sync_max = sync_max;
    }
    let sync_config = settings.to_sync_config()?;

    let targets = plan_targets(config, args.portal, args.quota);
    if targets.is_empty() {
        print_warning("No groups configured, nothing to do");
        return Ok(());
    }

    let overrides = ManualOverride::load(&config.overrides.files(), config.overrides.root_add)?;
    let client = GrouperClient::new(config.grouper.clone())?;
    let directory = LdapDirectory::connect(config.ldap.clone()).await?;
    let cancel = interrupt_token();

    info!(
        groups = targets.len(),
        dry_run = !args.sync,
        production = config.grouper.production,
        "Starting membership sync"
    );

    let mut summary = RunSummary::default();
    let result = async {
        for target in &targets {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            print_header(&format!("{} {}", target.category, target.value));
            let members = directory.search(&target.filters).await?;
            let merged = overrides.identify_changes(&members, &target.value, target.category);
            info!(
                group = %target.group,
                directory = members.len(),
                with_overrides = merged.len(),
                "Directory members resolved"
            );

            let snapshot = client.query(&target.group).await?;
            let delta = Delta::new(&merged, snapshot, sync_config.clone());
            print_delta(&delta);

            if !args.sync {
                print_dry_run(&delta);
                continue;
            }

            let report = delta
                .synchronize(&client, &TracingObserver, &cancel)
                .await?;
            print_report(&report);
            summary.record(&report);
        }
        CliResult::Ok(())
    }
    .await;

    directory.unbind().await;
    result?;

    if args.sync && summary.is_clean() {
        print_success(&format!("Synchronized {} groups", summary.groups));
    } else if !summary.is_clean() {
        warn!(
            partial = summary.partial.len(),
            refused = summary.refused.len(),
            cancelled = summary.cancelled,
            "Sync finished with problems"
        );
    }
    summary.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig::from_yaml(
            r#"
ldap:
  host: eds.arizona.edu
  base_dn: dc=eds,dc=arizona,dc=edu
  user: requiam
grouper:
  host: grouper.iam.arizona.edu
  base_path: ws
  user: requiam
  production: true
portals:
  sci_math: ["0404", "0413"]
  humanities: ["0301"]
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_both_categories_by_default() {
        let targets = plan_targets(&config(), false, false);
        assert_eq!(targets.len(), 5);
        assert_eq!(targets[0].category, OverrideCategory::Quota);
        assert_eq!(targets[0].value, "2147483648");
        assert_eq!(
            targets[0].group,
            "arizona.edu:dept:LBRY:figshare:quota:2147483648"
        );
    }

    #[test]
    fn test_plan_portals_only() {
        let targets = plan_targets(&config(), true, false);
        assert_eq!(targets.len(), 2);
        let humanities = &targets[0];
        assert_eq!(humanities.value, "humanities");
        assert_eq!(
            humanities.group,
            "arizona.edu:dept:LBRY:figshare:portal:humanities"
        );
        assert_eq!(humanities.filters.len(), 1);
        assert_eq!(targets[1].filters.len(), 2);
    }

    #[test]
    fn test_quota_org_codes_restrict_filters() {
        let mut config = config();
        config.quotas.org_codes = Some(vec!["0404".into(), "0413".into()]);
        let targets = plan_targets(&config, false, true);
        assert_eq!(targets.len(), 3);
        assert!(targets.iter().all(|t| t.filters.len() == 2));
        assert!(targets[1].filters[0].contains("employeePrimaryDept=0404"));
    }
}
