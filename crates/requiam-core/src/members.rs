//! Member sets and paired override records.
//!
//! [`MemberSet`] is an unordered, duplicate-free collection of [`MemberId`]s.
//! Two sets are only ever compared through set algebra; iteration order is
//! whatever the underlying hash set produces and carries no meaning.

use serde::{Deserialize, Serialize};
use std::collections::hash_set;
use std::collections::HashSet;

use crate::ids::{ExternalKey, MemberId};

/// Unordered set of member identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberSet(HashSet<MemberId>);

impl MemberSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(HashSet::new())
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, member: &MemberId) -> bool {
        self.0.contains(member)
    }

    /// Inserts a member, returning `true` if it was not already present.
    pub fn insert(&mut self, member: MemberId) -> bool {
        self.0.insert(member)
    }

    /// Removes a member, returning `true` if it was present.
    pub fn remove(&mut self, member: &MemberId) -> bool {
        self.0.remove(member)
    }

    /// Members present in both `self` and `other`.
    #[must_use]
    pub fn intersection(&self, other: &MemberSet) -> MemberSet {
        self.0.intersection(&other.0).cloned().collect()
    }

    /// Members present in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &MemberSet) -> MemberSet {
        self.0.difference(&other.0).cloned().collect()
    }

    /// Members present in either set.
    #[must_use]
    pub fn union(&self, other: &MemberSet) -> MemberSet {
        self.0.union(&other.0).cloned().collect()
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &MemberSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    pub fn iter(&self) -> hash_set::Iter<'_, MemberId> {
        self.0.iter()
    }

    /// Snapshot of the members in iteration order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<MemberId> {
        self.0.iter().cloned().collect()
    }

    /// Members sorted lexicographically, for stable display.
    #[must_use]
    pub fn sorted(&self) -> Vec<MemberId> {
        let mut members = self.to_vec();
        members.sort();
        members
    }
}

impl FromIterator<MemberId> for MemberSet {
    fn from_iter<I: IntoIterator<Item = MemberId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<MemberId> for MemberSet {
    fn extend<I: IntoIterator<Item = MemberId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for MemberSet {
    type Item = MemberId;
    type IntoIter = hash_set::IntoIter<MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MemberSet {
    type Item = &'a MemberId;
    type IntoIter = hash_set::Iter<'a, MemberId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<HashSet<MemberId>> for MemberSet {
    fn from(set: HashSet<MemberId>) -> Self {
        Self(set)
    }
}

/// A member identifier paired with the external key it was looked up by.
///
/// The key only ever feeds log output; set algebra uses `member` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberEntry {
    pub key: ExternalKey,
    pub member: MemberId,
}

impl MemberEntry {
    #[must_use]
    pub fn new(key: ExternalKey, member: MemberId) -> Self {
        Self { key, member }
    }
}
