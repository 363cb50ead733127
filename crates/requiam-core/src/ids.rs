//! Strongly Typed Identifiers
//!
//! `MemberId` is the opaque institutional identifier (the `uaid`) that the
//! directory and the group registry agree on. `ExternalKey` is the
//! human-facing login handle (the `netid`) used to key manual overrides.
//! Both are validated non-empty on construction and never change afterwards.
//!
//! # Example
//!
//! ```
//! use requiam_core::{ExternalKey, MemberId};
//!
//! let member = MemberId::new("T123456789").unwrap();
//! let key: ExternalKey = "netid_test1".parse().unwrap();
//!
//! assert_eq!(member.as_str(), "T123456789");
//! assert!(MemberId::new("   ").is_err());
//! # let _ = key;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::CoreError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier, rejecting empty or blank input.
            pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(CoreError::EmptyIdentifier {
                        id_type: stringify!($name),
                    });
                }
                if trimmed.len() == value.len() {
                    Ok(Self(value))
                } else {
                    Ok(Self(trimmed.to_string()))
                }
            }

            /// Creates an identifier from a literal.
            ///
            /// # Panics
            ///
            /// Panics if `value` is blank. Intended for constants and tests.
            #[must_use]
            pub fn from_static(value: &'static str) -> Self {
                match Self::new(value) {
                    Ok(id) => id,
                    Err(e) => panic!("{e}"),
                }
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Institutional member identifier shared by the directory and the registry.
    MemberId
);

define_id!(
    /// Login handle used as the lookup key of manual override records.
    ExternalKey
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_rejects_blank() {
        assert_eq!(
            MemberId::new(""),
            Err(CoreError::EmptyIdentifier {
                id_type: "MemberId"
            })
        );
        assert!(MemberId::new(" \t").is_err());
    }

    #[test]
    fn test_member_id_trims_surrounding_whitespace() {
        let id = MemberId::new(" T123 ").unwrap();
        assert_eq!(id.as_str(), "T123");
    }

    #[test]
    fn test_external_key_parse_and_display() {
        let key: ExternalKey = "netid_test1".parse().unwrap();
        assert_eq!(key.to_string(), "netid_test1");
    }

    #[test]
    fn test_serde_round_trip_is_transparent() {
        let id = MemberId::from_static("T987654321");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"T987654321\"");

        let err = serde_json::from_str::<MemberId>("\"\"");
        assert!(err.is_err());
    }
}
