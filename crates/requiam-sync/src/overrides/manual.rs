//! Merge manual overrides into candidate sets and record new ones.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use requiam_core::{MemberEntry, MemberSet};

use crate::error::{SyncError, SyncResult};
use crate::overrides::table::{normalize_value, OverrideRow, OverrideTable};
use crate::overrides::{update_entries, OverrideAction, OverrideCategory};

/// Group name meaning "no override, use the default".
pub const ROOT_GROUP: &str = "root";

/// Locations of the two override files and their bundled templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideFiles {
    pub portal: PathBuf,
    pub quota: PathBuf,
    pub portal_template: PathBuf,
    pub quota_template: PathBuf,
}

impl OverrideFiles {
    /// Files under `dir` with the default names.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            portal: dir.join("portal_manual.csv"),
            quota: dir.join("quota_manual.csv"),
            portal_template: dir.join("portal_manual_template.csv"),
            quota_template: dir.join("quota_manual_template.csv"),
        }
    }
}

/// Row changes made by one [`ManualOverride::update_dataframe`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableUpdate {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    /// Suppressed "root" entries that had no row to remove.
    pub unchanged: usize,
}

/// Portal and quota override tables.
#[derive(Debug, Clone)]
pub struct ManualOverride {
    portal: OverrideTable,
    quota: OverrideTable,
    root_add: bool,
}

impl ManualOverride {
    /// Load both tables, falling back to the templates for missing files.
    ///
    /// `root_add` allows "root" to be stored as an explicit portal override.
    pub fn load(files: &OverrideFiles, root_add: bool) -> SyncResult<Self> {
        let portal = load_table(&files.portal, &files.portal_template, OverrideCategory::Portal)?;
        let quota = load_table(&files.quota, &files.quota_template, OverrideCategory::Quota)?;
        Ok(Self {
            portal,
            quota,
            root_add,
        })
    }

    #[must_use]
    pub fn from_tables(portal: OverrideTable, quota: OverrideTable, root_add: bool) -> Self {
        Self {
            portal,
            quota,
            root_add,
        }
    }

    #[must_use]
    pub fn table(&self, category: OverrideCategory) -> &OverrideTable {
        match category {
            OverrideCategory::Portal => &self.portal,
            OverrideCategory::Quota => &self.quota,
        }
    }

    fn table_mut(&mut self, category: OverrideCategory) -> &mut OverrideTable {
        match category {
            OverrideCategory::Portal => &mut self.portal,
            OverrideCategory::Quota => &mut self.quota,
        }
    }

    #[must_use]
    pub fn root_add(&self) -> bool {
        self.root_add
    }

    /// Apply the overrides for `group` to `candidates`.
    ///
    /// Members with a row targeting `group` are added first; members with a
    /// row targeting any other group are then removed. A row for `group`
    /// is never undone by the removal pass.
    #[must_use]
    pub fn identify_changes(
        &self,
        candidates: &MemberSet,
        group: &str,
        category: OverrideCategory,
    ) -> MemberSet {
        let value = lookup_value(category, group);
        let table = self.table(category);

        let add_entries = table.entries_matching(&value);
        let added = if add_entries.is_empty() {
            candidates.clone()
        } else {
            update_entries(candidates, &add_entries, OverrideAction::Add).members
        };

        let outside = table.entries_not_matching(&value);
        if outside.is_empty() {
            return added;
        }
        update_entries(&added, &outside, OverrideAction::Remove).members
    }

    /// Whether an entry for `group` is stored, rather than suppressed.
    #[must_use]
    pub fn records_group(&self, group: &str, category: OverrideCategory) -> bool {
        !(group == ROOT_GROUP && (category == OverrideCategory::Quota || !self.root_add))
    }

    /// Record that `entries` now belong to `group` and rewrite the file.
    ///
    /// Existing rows are updated in place, new keys are appended, and for a
    /// suppressed "root" target the row is deleted instead.
    pub fn update_dataframe(
        &mut self,
        entries: &[MemberEntry],
        group: &str,
        category: OverrideCategory,
    ) -> SyncResult<TableUpdate> {
        let record = self.records_group(group, category);
        let value = if record {
            normalize_value(category, group)?
        } else {
            String::new()
        };

        let table = self.table_mut(category);
        let mut update = TableUpdate::default();

        for entry in entries {
            let exists = table.get(&entry.key).is_some();
            match (exists, record) {
                (false, true) => {
                    info!(netid = %entry.key, "Adding override entry");
                    table.upsert(row(entry, &value));
                    update.inserted += 1;
                }
                (false, false) => {
                    info!(netid = %entry.key, "No update needed, root setting and no entry");
                    update.unchanged += 1;
                }
                (true, true) => {
                    info!(netid = %entry.key, "Updating override entry");
                    table.upsert(row(entry, &value));
                    update.updated += 1;
                }
                (true, false) => {
                    info!(netid = %entry.key, "Removing override entry");
                    table.remove(&entry.key);
                    update.removed += 1;
                }
            }
        }

        info!(
            category = %category,
            path = %table.path().display(),
            "Overwriting override file"
        );
        table.persist()?;
        Ok(update)
    }
}

fn row(entry: &MemberEntry, value: &str) -> OverrideRow {
    OverrideRow {
        netid: entry.key.clone(),
        uaid: entry.member.clone(),
        value: value.to_string(),
    }
}

/// Value to compare table rows against; non-numeric quota groups match nothing.
fn lookup_value(category: OverrideCategory, group: &str) -> String {
    normalize_value(category, group).unwrap_or_else(|_| group.trim().to_string())
}

fn load_table(
    path: &Path,
    template: &Path,
    category: OverrideCategory,
) -> SyncResult<OverrideTable> {
    if path.exists() {
        return OverrideTable::load(path, path, category);
    }

    if path.is_symlink() {
        warn!(path = %path.display(), "Override file is a dangling symbolic link");
    }
    if !template.exists() {
        return Err(SyncError::OverrideStoreMissing {
            path: path.to_path_buf(),
            template: template.to_path_buf(),
        });
    }

    warn!(
        path = %path.display(),
        template = %template.display(),
        category = %category,
        "Override file not found, using template"
    );
    OverrideTable::load(template, path, category)
}
