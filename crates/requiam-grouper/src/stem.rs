//! Grouper stem and group path construction.

use std::fmt;
use std::str::FromStr;

use crate::error::GrouperError;

const STEM_ROOT: &str = "arizona.edu:dept:LBRY";

/// Sub-stem a group lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    Portal,
    Quota,
    Test,
    GroupActive,
    /// The stem root itself (e.g. the `active` group).
    Root,
}

impl GroupType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Portal => "portal",
            GroupType::Quota => "quota",
            GroupType::Test => "test",
            GroupType::GroupActive => "group_active",
            GroupType::Root => "",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = GrouperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "portal" => Ok(GroupType::Portal),
            "quota" => Ok(GroupType::Quota),
            "test" => Ok(GroupType::Test),
            "group_active" => Ok(GroupType::GroupActive),
            "" => Ok(GroupType::Root),
            other => Err(GrouperError::InvalidArgument(format!(
                "unknown group type: {other}"
            ))),
        }
    }
}

/// Full path of a figshare stem.
///
/// `figshare_stem(GroupType::Quota, true)` gives
/// `arizona.edu:dept:LBRY:figshare:quota`; the root stem keeps a trailing
/// colon so a group name can be appended directly.
#[must_use]
pub fn figshare_stem(stem: GroupType, production: bool) -> String {
    let base = if production { "figshare" } else { "figtest" };
    format!("{STEM_ROOT}:{base}:{}", stem.as_str())
}

/// Full path of a group within a figshare stem.
#[must_use]
pub fn figshare_group(group: &str, stem: GroupType, production: bool) -> String {
    let stem_path = figshare_stem(stem, production);
    if stem == GroupType::Root {
        format!("{stem_path}{group}")
    } else {
        format!("{stem_path}:{group}")
    }
}
