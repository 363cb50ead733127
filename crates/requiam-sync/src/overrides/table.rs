//! One override category backed by a CSV file.
//!
//! File layout: `#` comment lines, a header row `netid,uaid,{portal|quota}`,
//! then one row per NetID. Comment lines may appear anywhere; every one is
//! kept byte for byte, line ending included, and written back ahead of the
//! header row on each rewrite. No index column is ever written.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use requiam_core::{ExternalKey, MemberEntry, MemberId};

use crate::error::{SyncError, SyncResult};
use crate::overrides::OverrideCategory;

#[derive(Debug, Deserialize)]
struct PortalRecord {
    netid: String,
    uaid: String,
    portal: String,
}

#[derive(Debug, Deserialize)]
struct QuotaRecord {
    netid: String,
    uaid: String,
    quota: i64,
}

/// One override: NetID, member id and the forced portal group or quota tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRow {
    pub netid: ExternalKey,
    pub uaid: MemberId,
    /// Portal group name or quota tier, normalized.
    pub value: String,
}

impl OverrideRow {
    #[must_use]
    pub fn entry(&self) -> MemberEntry {
        MemberEntry::new(self.netid.clone(), self.uaid.clone())
    }
}

/// In-memory copy of one category's override file.
#[derive(Debug, Clone)]
pub struct OverrideTable {
    category: OverrideCategory,
    path: PathBuf,
    source: PathBuf,
    header: Vec<String>,
    rows: Vec<OverrideRow>,
}

impl OverrideTable {
    /// Read `source` for `category`; rewrites go to `path`.
    pub fn load(
        source: &Path,
        path: impl Into<PathBuf>,
        category: OverrideCategory,
    ) -> SyncResult<Self> {
        let content = fs::read_to_string(source).map_err(|e| SyncError::io(source, e))?;

        let header: Vec<String> = content
            .split_inclusive('\n')
            .filter(|line| line.starts_with('#'))
            .map(str::to_string)
            .collect();

        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| SyncError::csv(source, e))?
            .clone();

        let mut table = Self {
            category,
            path: path.into(),
            source: source.to_path_buf(),
            header,
            rows: Vec::new(),
        };

        for result in reader.records() {
            let record = result.map_err(|e| SyncError::csv(source, e))?;
            let line = record.position().map_or(0, csv::Position::line);
            let invalid = |message: String| SyncError::InvalidOverride {
                path: source.to_path_buf(),
                line,
                message,
            };

            let (netid, uaid, value) = match category {
                OverrideCategory::Portal => {
                    let r: PortalRecord = record
                        .deserialize(Some(&headers))
                        .map_err(|e| invalid(e.to_string()))?;
                    (r.netid, r.uaid, r.portal)
                }
                OverrideCategory::Quota => {
                    let r: QuotaRecord = record
                        .deserialize(Some(&headers))
                        .map_err(|e| invalid(format!("quota must be an integer: {e}")))?;
                    (r.netid, r.uaid, r.quota.to_string())
                }
            };

            let row = OverrideRow {
                netid: ExternalKey::new(netid).map_err(|e| invalid(e.to_string()))?,
                uaid: MemberId::new(uaid).map_err(|e| invalid(e.to_string()))?,
                value: normalize_value(category, &value)
                    .map_err(|e| invalid(e.to_string()))?,
            };

            if table.get(&row.netid).is_some() {
                warn!(
                    path = %source.display(),
                    line,
                    netid = %row.netid,
                    "Duplicate override row, keeping the last one"
                );
            }
            table.upsert(row);
        }

        debug!(
            path = %source.display(),
            category = %category,
            rows = table.rows.len(),
            "Override table loaded"
        );
        Ok(table)
    }

    #[must_use]
    pub fn category(&self) -> OverrideCategory {
        self.category
    }

    /// File rewrites go to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File the table was read from (the template after a fallback).
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Comment lines preserved across rewrites, each with its line ending.
    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[OverrideRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, netid: &ExternalKey) -> Option<&OverrideRow> {
        self.rows.iter().find(|r| &r.netid == netid)
    }

    /// Entries whose value equals `value`.
    #[must_use]
    pub fn entries_matching(&self, value: &str) -> Vec<MemberEntry> {
        self.rows
            .iter()
            .filter(|r| r.value == value)
            .map(OverrideRow::entry)
            .collect()
    }

    /// Entries whose value differs from `value`.
    #[must_use]
    pub fn entries_not_matching(&self, value: &str) -> Vec<MemberEntry> {
        self.rows
            .iter()
            .filter(|r| r.value != value)
            .map(OverrideRow::entry)
            .collect()
    }

    /// Insert or replace the row for `row.netid`; returns true on insert.
    pub fn upsert(&mut self, row: OverrideRow) -> bool {
        match self.rows.iter_mut().find(|r| r.netid == row.netid) {
            Some(existing) => {
                *existing = row;
                false
            }
            None => {
                self.rows.push(row);
                true
            }
        }
    }

    pub fn remove(&mut self, netid: &ExternalKey) -> Option<OverrideRow> {
        let pos = self.rows.iter().position(|r| &r.netid == netid)?;
        Some(self.rows.remove(pos))
    }

    /// Overwrite [`Self::path`] with the comment header and current rows.
    pub fn persist(&self) -> SyncResult<()> {
        let mut file = fs::File::create(&self.path).map_err(|e| SyncError::io(&self.path, e))?;
        for line in &self.header {
            file.write_all(line.as_bytes())
                .map_err(|e| SyncError::io(&self.path, e))?;
            if !line.ends_with('\n') {
                file.write_all(b"\n")
                    .map_err(|e| SyncError::io(&self.path, e))?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);
        writer
            .write_record(["netid", "uaid", self.category.as_str()])
            .map_err(|e| SyncError::csv(&self.path, e))?;
        for row in &self.rows {
            writer
                .write_record([row.netid.as_str(), row.uaid.as_str(), row.value.as_str()])
                .map_err(|e| SyncError::csv(&self.path, e))?;
        }
        writer.flush().map_err(|e| SyncError::io(&self.path, e))?;

        debug!(path = %self.path.display(), rows = self.rows.len(), "Override table written");
        Ok(())
    }
}

/// Canonical form of a category value: trimmed portal names, integer tiers.
pub(crate) fn normalize_value(category: OverrideCategory, value: &str) -> SyncResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SyncError::InvalidArgument(format!(
            "{category} value must not be empty"
        )));
    }
    match category {
        OverrideCategory::Portal => Ok(value.to_string()),
        OverrideCategory::Quota => value
            .parse::<i64>()
            .map(|tier| tier.to_string())
            .map_err(|_| {
                SyncError::InvalidArgument(format!("quota must be an integer, got {value}"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_skips_comments_and_keeps_header() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "portal.csv",
            "# manual portal overrides\n# do not edit by hand\nnetid,uaid,portal\njdoe,123,sci_math\n",
        );

        let table = OverrideTable::load(&path, &path, OverrideCategory::Portal).unwrap();
        assert_eq!(table.header().len(), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].value, "sci_math");
    }

    #[test]
    fn test_quota_must_be_integer() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "quota.csv", "netid,uaid,quota\njdoe,123,lots\n");

        let err = OverrideTable::load(&path, &path, OverrideCategory::Quota).unwrap_err();
        assert!(matches!(err, SyncError::InvalidOverride { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "portal.csv",
            "netid,uaid,portal\njdoe,123,sci_math\njdoe,123,humanities\n",
        );

        let table = OverrideTable::load(&path, &path, OverrideCategory::Portal).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].value, "humanities");
    }

    #[test]
    fn test_persist_round_trips_header() {
        let dir = TempDir::new().unwrap();
        let original = "# header line\nnetid,uaid,quota\njdoe,123,1000\n";
        let path = write(&dir, "quota.csv", original);

        let table = OverrideTable::load(&path, &path, OverrideCategory::Quota).unwrap();
        table.persist().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_trailing_comment_without_newline() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "portal.csv", "netid,uaid,portal
jdoe,123,sci_math
# end");

        let table = OverrideTable::load(&path, &path, OverrideCategory::Portal).unwrap();
        table.persist().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# end\nnetid,uaid,portal\njdoe,123,sci_math\n"
        );
    }

    #[test]
    fn test_normalize_quota() {
        assert_eq!(
            normalize_value(OverrideCategory::Quota, " 0100 ").unwrap(),
            "100"
        );
        assert!(normalize_value(OverrideCategory::Quota, "root").is_err());
        assert!(normalize_value(OverrideCategory::Portal, " ").is_err());
    }
}
