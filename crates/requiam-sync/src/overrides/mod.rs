//! Manual overrides.
//!
//! Curated exceptions force a member into one portal group or quota tier
//! regardless of what the directory says. They live in one CSV table per
//! category, keyed by NetID.

mod manual;
mod table;

pub use manual::{ManualOverride, OverrideFiles, TableUpdate, ROOT_GROUP};
pub use table::{OverrideRow, OverrideTable};

use std::fmt;
use std::str::FromStr;
use tracing::info;

use requiam_core::{ExternalKey, MemberEntry, MemberSet};

use crate::error::SyncError;

/// Override partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideCategory {
    /// Named portal group.
    Portal,
    /// Numeric quota tier.
    Quota,
}

impl OverrideCategory {
    /// Also the name of the category column in the CSV table.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideCategory::Portal => "portal",
            OverrideCategory::Quota => "quota",
        }
    }
}

impl fmt::Display for OverrideCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverrideCategory {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portal" => Ok(OverrideCategory::Portal),
            "quota" => Ok(OverrideCategory::Quota),
            other => Err(SyncError::InvalidArgument(format!(
                "unknown override category: {other}"
            ))),
        }
    }
}

/// Direction of an entry update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideAction {
    Add,
    Remove,
}

impl OverrideAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideAction::Add => "add",
            OverrideAction::Remove => "remove",
        }
    }
}

impl fmt::Display for OverrideAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverrideAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(OverrideAction::Add),
            "remove" => Ok(OverrideAction::Remove),
            other => Err(SyncError::InvalidArgument(format!(
                "action must be add or remove, got {other}"
            ))),
        }
    }
}

/// Result of [`update_entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    pub members: MemberSet,
    /// Keys whose member was actually added or removed.
    pub changed: Vec<ExternalKey>,
}

/// Add or remove the members of `entries` from `members`.
///
/// The set algebra uses only the member ids; keys are reported for the
/// members that actually changed. `Add` returns `members ∪ ids`,
/// `Remove` returns `members − ids`.
#[must_use]
pub fn update_entries(
    members: &MemberSet,
    entries: &[MemberEntry],
    action: OverrideAction,
) -> EntryUpdate {
    let ids: MemberSet = entries.iter().map(|e| e.member.clone()).collect();

    let (touched, result) = match action {
        OverrideAction::Add => (ids.difference(members), members.union(&ids)),
        OverrideAction::Remove => (members.intersection(&ids), members.difference(&ids)),
    };

    let changed: Vec<ExternalKey> = entries
        .iter()
        .filter(|e| touched.contains(&e.member))
        .map(|e| e.key.clone())
        .collect();

    if changed.is_empty() {
        info!(action = %action, "No override entries changed");
    } else {
        let keys: Vec<&str> = changed.iter().map(ExternalKey::as_str).collect();
        info!(action = %action, count = changed.len(), keys = %keys.join(", "), "Override entries applied");
    }

    EntryUpdate {
        members: result,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use requiam_core::MemberId;

    fn set(ids: &[&'static str]) -> MemberSet {
        ids.iter().copied().map(MemberId::from_static).collect()
    }

    fn entry(key: &'static str, member: &'static str) -> MemberEntry {
        MemberEntry::new(ExternalKey::from_static(key), MemberId::from_static(member))
    }

    #[test]
    fn test_add_is_union() {
        let update = update_entries(
            &set(&["a", "b"]),
            &[entry("kb", "b"), entry("kc", "c")],
            OverrideAction::Add,
        );
        assert_eq!(update.members, set(&["a", "b", "c"]));
        assert_eq!(update.changed, vec![ExternalKey::from_static("kc")]);
    }

    #[test]
    fn test_remove_is_difference() {
        let update = update_entries(
            &set(&["a", "b"]),
            &[entry("kb", "b"), entry("kc", "c")],
            OverrideAction::Remove,
        );
        assert_eq!(update.members, set(&["a"]));
        assert_eq!(update.changed, vec![ExternalKey::from_static("kb")]);
    }

    #[test]
    fn test_nothing_changed() {
        let update = update_entries(&set(&["a"]), &[entry("ka", "a")], OverrideAction::Add);
        assert_eq!(update.members, set(&["a"]));
        assert!(update.changed.is_empty());
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(matches!(
            "replace".parse::<OverrideAction>(),
            Err(SyncError::InvalidArgument(_))
        ));
        assert!("group".parse::<OverrideCategory>().is_err());
    }
}
