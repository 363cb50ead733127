//! Show-overrides command - Print the manual override tables

use clap::Args;

use requiam_sync::{ManualOverride, OverrideCategory, OverrideTable};

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::output::{print_field, print_header, print_info};

/// Arguments for the show-overrides command
#[derive(Args, Debug)]
pub struct ShowOverridesArgs {
    /// Only the portal table
    #[arg(long, conflicts_with = "quota")]
    pub portal: bool,

    /// Only the quota table
    #[arg(long)]
    pub quota: bool,
}

/// Execute the show-overrides command
pub fn execute(args: ShowOverridesArgs, config: &AppConfig) -> CliResult<()> {
    let overrides = ManualOverride::load(&config.overrides.files(), config.overrides.root_add)?;

    let categories: &[OverrideCategory] = match (args.portal, args.quota) {
        (true, false) => &[OverrideCategory::Portal],
        (false, true) => &[OverrideCategory::Quota],
        _ => &[OverrideCategory::Portal, OverrideCategory::Quota],
    };

    for category in categories {
        print_table(overrides.table(*category));
    }
    Ok(())
}

fn print_table(table: &OverrideTable) {
    print_header(&format!("{} overrides", table.category()));
    print_field("file", &table.path().display().to_string());
    if table.source() != table.path() {
        print_field("loaded from", &table.source().display().to_string());
    }

    if table.is_empty() {
        print_info("No entries");
        return;
    }

    let netid_width = table
        .rows()
        .iter()
        .map(|r| r.netid.as_str().len())
        .max()
        .unwrap_or(0)
        .max("netid".len());

    println!();
    println!("  {:<netid_width$}  {:<10}  {}", "netid", "uaid", table.category());
    for row in table.rows() {
        println!(
            "  {:<netid_width$}  {:<10}  {}",
            row.netid.as_str(),
            row.uaid.as_str(),
            row.value
        );
    }
}
