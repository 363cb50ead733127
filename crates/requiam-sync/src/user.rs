//! Single-user membership updates.

use tracing::info;

use requiam_core::MemberEntry;
use requiam_grouper::GroupSnapshot;

use crate::config::SyncConfig;
use crate::delta::Delta;
use crate::overrides::{update_entries, OverrideAction};

/// Build a delta that adds or removes `entries` from the group's own
/// current membership, leaving every other member untouched.
#[must_use]
pub fn delta_for_user(
    snapshot: GroupSnapshot,
    entries: &[MemberEntry],
    action: OverrideAction,
    config: SyncConfig,
) -> Delta {
    let members = update_entries(&snapshot.members, entries, action).members;
    let delta = Delta::new(&members, snapshot, config);

    info!(
        group = %delta.group(),
        common = delta.common().len(),
        drops = delta.drops().len(),
        adds = delta.adds().len(),
        "User delta computed"
    );
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use requiam_core::{ExternalKey, MemberId, MemberSet};

    fn snapshot(ids: &[&'static str]) -> GroupSnapshot {
        GroupSnapshot {
            group_name: "arizona.edu:dept:LBRY:figtest:quota:1000".to_string(),
            members_url: "http://localhost/members".to_string(),
            members: ids.iter().copied().map(MemberId::from_static).collect::<MemberSet>(),
        }
    }

    fn jdoe() -> Vec<MemberEntry> {
        vec![MemberEntry::new(
            ExternalKey::from_static("jdoe"),
            MemberId::from_static("U1"),
        )]
    }

    #[test]
    fn test_add_user_only_adds() {
        let config = SyncConfig::new(10, 30, 0, 10).unwrap();
        let delta = delta_for_user(snapshot(&["A", "B"]), &jdoe(), OverrideAction::Add, config);
        assert_eq!(delta.adds().len(), 1);
        assert!(delta.drops().is_empty());
        assert_eq!(delta.common().len(), 2);
    }

    #[test]
    fn test_remove_user_only_drops() {
        let config = SyncConfig::new(10, 30, 0, 10).unwrap();
        let delta = delta_for_user(snapshot(&["A", "U1"]), &jdoe(), OverrideAction::Remove, config);
        assert!(delta.adds().is_empty());
        assert!(delta.drops().contains(&MemberId::from_static("U1")));
    }
}
