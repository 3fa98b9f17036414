//! Tour interests and their fixed domain order.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A tour domain.
///
/// The derived ordering is the domain priority used everywhere sections are
/// listed: Architecture, History, Culture, Culinary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interest {
    /// Buildings, styles, urban design.
    Architecture,
    /// Landmarks, events, people.
    History,
    /// Traditions, arts, customs.
    Culture,
    /// Food, markets, local dishes.
    #[serde(alias = "Food")]
    Culinary,
}

impl Interest {
    /// All interests in domain order.
    pub const ALL: [Self; 4] = [
        Self::Architecture,
        Self::History,
        Self::Culture,
        Self::Culinary,
    ];

    /// Display label, as accepted from users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Architecture => "Architecture",
            Self::History => "History",
            Self::Culture => "Culture",
            Self::Culinary => "Culinary",
        }
    }

    /// Lowercase key used in logs and planner fields.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::History => "history",
            Self::Culture => "culture",
            Self::Culinary => "culinary",
        }
    }

    /// Parses a label. Matching is case-sensitive; `"Food"` maps to Culinary.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Architecture" => Some(Self::Architecture),
            "History" => Some(Self::History),
            "Culture" => Some(Self::Culture),
            "Culinary" | "Food" => Some(Self::Culinary),
            _ => None,
        }
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| {
            Error::invalid_request(format!(
                "unknown interest '{s}' (expected one of Architecture, History, Culture, Culinary)"
            ))
        })
    }
}

/// An ordered set of interests.
///
/// Iteration always follows domain order regardless of insertion order, and
/// duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interests(BTreeSet<Interest>);

impl Interests {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parses user labels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for the first unknown label.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| label.as_ref().parse::<Interest>())
            .collect()
    }

    /// Adds an interest. Returns `false` if it was already present.
    pub fn insert(&mut self, interest: Interest) -> bool {
        self.0.insert(interest)
    }

    /// Returns `true` if `interest` is selected.
    #[must_use]
    pub fn contains(&self, interest: Interest) -> bool {
        self.0.contains(&interest)
    }

    /// Number of selected interests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates in domain order.
    pub fn iter(&self) -> impl Iterator<Item = Interest> + '_ {
        self.0.iter().copied()
    }

    /// Labels joined with `", "` in domain order.
    #[must_use]
    pub fn joined(&self) -> String {
        self.iter()
            .map(Interest::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Interests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl FromIterator<Interest> for Interests {
    fn from_iter<I: IntoIterator<Item = Interest>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Interest; N]> for Interests {
    fn from(interests: [Interest; N]) -> Self {
        interests.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Interests {
    type Item = Interest;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, Interest>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod interest {
        use super::*;

        #[test]
        fn labels_are_case_sensitive() {
            assert_eq!("History".parse::<Interest>().unwrap(), Interest::History);
            assert!("history".parse::<Interest>().is_err());
            assert!("HISTORY".parse::<Interest>().is_err());
        }

        #[test]
        fn food_is_culinary() {
            assert_eq!(Interest::from_label("Food"), Some(Interest::Culinary));
            let parsed: Interest = serde_json::from_str(r#""Food""#).unwrap();
            assert_eq!(parsed, Interest::Culinary);
        }

        #[test]
        fn unknown_label_is_invalid_request() {
            let err = "Nightlife".parse::<Interest>().unwrap_err();
            assert!(err.is_invalid_request());
            assert!(err.to_string().contains("Nightlife"));
        }

        #[test]
        fn order_is_domain_priority() {
            let mut all = vec![
                Interest::Culinary,
                Interest::Architecture,
                Interest::Culture,
                Interest::History,
            ];
            all.sort();
            assert_eq!(all, Interest::ALL);
        }

        #[test]
        fn label_round_trips_through_display() {
            for interest in Interest::ALL {
                assert_eq!(interest.to_string().parse::<Interest>().unwrap(), interest);
            }
        }
    }

    mod interests {
        use super::*;

        #[test]
        fn iterates_in_domain_order() {
            let set = Interests::from_labels(["Culinary", "History"]).unwrap();
            assert_eq!(
                set.iter().collect::<Vec<_>>(),
                vec![Interest::History, Interest::Culinary]
            );
            assert_eq!(set.joined(), "History, Culinary");
        }

        #[test]
        fn duplicates_collapse() {
            let set = Interests::from_labels(["Culinary", "Food", "Culinary"]).unwrap();
            assert_eq!(set.len(), 1);
        }

        #[test]
        fn first_unknown_label_fails() {
            assert!(Interests::from_labels(["History", "Sports"]).is_err());
        }

        #[test]
        fn serializes_as_label_list() {
            let set = Interests::from([Interest::Culture, Interest::Architecture]);
            assert_eq!(
                serde_json::to_string(&set).unwrap(),
                r#"["Architecture","Culture"]"#
            );
        }
    }
}
