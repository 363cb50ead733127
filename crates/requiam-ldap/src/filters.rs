//! Patron filter builders.
//!
//! Each builder returns a list of complete RFC 4515 filter strings; the
//! directory search runs every filter and unions the results.

use std::fmt;
use std::str::FromStr;

use crate::error::LdapError;

/// Grouper stem holding the library patron groups.
pub const PATRON_STEM: &str = "arizona.edu:dept:LBRY:pgrps";

/// Escape special characters in filter values (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

/// Filter for a single NetID.
#[must_use]
pub fn uid_query(uid: &str) -> Vec<String> {
    vec![format!("(uid={})", escape_filter_value(uid))]
}

/// `ismemberof` assertion for a patron group (not a complete filter).
#[must_use]
pub fn ual_grouper_base(basename: &str) -> String {
    format!("ismemberof={PATRON_STEM}:{basename}")
}

/// Patron classification within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Classification {
    #[default]
    All,
    Faculty,
    Staff,
    Students,
    Dcc,
    /// Organization only, no patron group requirement.
    None,
}

impl Classification {
    const PATRON_CLASSES: [Classification; 4] = [
        Classification::Faculty,
        Classification::Staff,
        Classification::Students,
        Classification::Dcc,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::All => "all",
            Classification::Faculty => "faculty",
            Classification::Staff => "staff",
            Classification::Students => "students",
            Classification::Dcc => "dcc",
            Classification::None => "none",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Classification::All),
            "faculty" => Ok(Classification::Faculty),
            "staff" => Ok(Classification::Staff),
            "students" => Ok(Classification::Students),
            "dcc" => Ok(Classification::Dcc),
            "none" => Ok(Classification::None),
            other => Err(LdapError::InvalidArgument(format!(
                "unknown classification: {other}"
            ))),
        }
    }
}

/// Filter for library patrons within one organization code.
#[must_use]
pub fn ual_ldap_query(org_code: &str, classification: Classification) -> Vec<String> {
    let org_code = escape_filter_value(org_code);

    let groups: Vec<Classification> = match classification {
        Classification::None => return vec![format!("(employeePrimaryDept={org_code})")],
        Classification::All => Classification::PATRON_CLASSES.to_vec(),
        other => vec![other],
    };

    let mut query = format!("(& (employeePrimaryDept={org_code}) (| ");
    for class in groups {
        query.push_str(&format!("({}) ", ual_grouper_base(&format!("ual-{class}"))));
    }
    query.push_str(") )");
    vec![query]
}

/// One all-patron filter per organization code.
#[must_use]
pub fn ual_ldap_queries<S: AsRef<str>>(org_codes: &[S]) -> Vec<String> {
    org_codes
        .iter()
        .flat_map(|oc| ual_ldap_query(oc.as_ref(), Classification::All))
        .collect()
}

/// Default quota tier classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaClass {
    /// Faculty, staff and DCC.
    Faculty,
    Grad,
    Ugrad,
}

impl QuotaClass {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaClass::Faculty => "faculty",
            QuotaClass::Grad => "grad",
            QuotaClass::Ugrad => "ugrad",
        }
    }
}

impl fmt::Display for QuotaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotaClass {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faculty" => Ok(QuotaClass::Faculty),
            "grad" => Ok(QuotaClass::Grad),
            "ugrad" => Ok(QuotaClass::Ugrad),
            other => Err(LdapError::InvalidArgument(format!(
                "quota class must be faculty, grad or ugrad, got {other}"
            ))),
        }
    }
}

/// Filter(s) for a quota class, optionally restricted to organization codes.
#[must_use]
pub fn ual_ldap_quota_query<S: AsRef<str>>(class: QuotaClass, org_codes: Option<&[S]>) -> Vec<String> {
    let query = match class {
        QuotaClass::Faculty => format!(
            "( | ({}) ({}) ({}) )",
            ual_grouper_base("ual-faculty"),
            ual_grouper_base("ual-staff"),
            ual_grouper_base("ual-dcc")
        ),
        QuotaClass::Grad => format!("({})", ual_grouper_base("ual-grads")),
        QuotaClass::Ugrad => format!("({})", ual_grouper_base("ual-ugrads")),
    };

    match org_codes {
        Some(codes) => codes
            .iter()
            .map(|oc| {
                format!(
                    "(& (employeePrimaryDept={}) {query} )",
                    escape_filter_value(oc.as_ref())
                )
            })
            .collect(),
        None => vec![query],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_query_escapes() {
        assert_eq!(uid_query("jdoe"), vec!["(uid=jdoe)"]);
        assert_eq!(uid_query("a*b"), vec!["(uid=a\\2ab)"]);
    }

    #[test]
    fn test_grouper_base() {
        assert_eq!(
            ual_grouper_base("ual-faculty"),
            "ismemberof=arizona.edu:dept:LBRY:pgrps:ual-faculty"
        );
    }

    #[test]
    fn test_all_classification() {
        let query = ual_ldap_query("0212", Classification::All);
        assert_eq!(
            query[0],
            "(& (employeePrimaryDept=0212) (| \
             (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-faculty) \
             (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-staff) \
             (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-students) \
             (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-dcc) ) )"
        );
    }

    #[test]
    fn test_single_and_none_classification() {
        assert_eq!(
            ual_ldap_query("0212", Classification::Dcc)[0],
            "(& (employeePrimaryDept=0212) (| (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-dcc) ) )"
        );
        assert_eq!(
            ual_ldap_query("0212", Classification::None)[0],
            "(employeePrimaryDept=0212)"
        );
    }

    #[test]
    fn test_classification_parse() {
        assert_eq!("students".parse::<Classification>().unwrap(), Classification::Students);
        assert!("alumni".parse::<Classification>().is_err());
    }

    #[test]
    fn test_queries_one_per_org() {
        let queries = ual_ldap_queries(&["0212", "0213", "0214"]);
        assert_eq!(queries.len(), 3);
        assert!(queries[1].contains("employeePrimaryDept=0213"));
    }

    #[test]
    fn test_quota_queries() {
        let faculty = ual_ldap_quota_query::<&str>(QuotaClass::Faculty, None);
        assert_eq!(faculty.len(), 1);
        assert!(faculty[0].starts_with("( | "));
        assert!(faculty[0].contains("ual-dcc"));

        let grads = ual_ldap_quota_query(QuotaClass::Grad, Some(&["0404", "0413"][..]));
        assert_eq!(
            grads,
            vec![
                "(& (employeePrimaryDept=0404) (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-grads) )",
                "(& (employeePrimaryDept=0413) (ismemberof=arizona.edu:dept:LBRY:pgrps:ual-grads) )",
            ]
        );

        assert!("postdoc".parse::<QuotaClass>().is_err());
    }
}
