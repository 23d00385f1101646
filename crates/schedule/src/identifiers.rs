//! Type-safe identifiers for cleaning zones.
//!
//! Street and section names use Arc<str> so snapshots can be cloned cheaply
//! into match results and persisted references.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::calendar::DaySet;

macro_rules! impl_identifier {
    ($name:ident) => {
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::new)
            }
        }
    };
}

impl_identifier!(StreetName);
impl_identifier!(SectionName);

impl StreetName {
    /// Normalize a raw street label: trimmed, inner whitespace collapsed,
    /// uppercase. Returns `None` for blank input.
    pub fn normalized(raw: &str) -> Option<Self> {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(Self::new(collapsed.to_uppercase()))
        }
    }
}

impl SectionName {
    /// Blank sections are treated as absent. Casing is kept as published.
    pub fn optional(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self::new(trimmed))
    }
}

/// Value reference to a cleaning zone: street, section and day codes.
///
/// Persisted state stores this instead of a pointer into the live snapshot,
/// so it stays meaningful across refreshes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneKey {
    pub street: StreetName,
    pub section: Option<SectionName>,
    pub days: DaySet,
}

impl fmt::Display for ZoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.street)?;
        if let Some(section) = &self.section {
            write!(f, " [{}]", section)?;
        }
        write!(f, " ({})", self.days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayCode;

    #[test]
    fn test_identifier_equality() {
        let id1 = StreetName::new("VIA ROMA");
        let id2 = StreetName::new("VIA ROMA");
        let id3 = id1.clone();

        assert_eq!(id1, id2);
        assert_eq!(id1, id3);
        assert!(Arc::ptr_eq(&id1.0, &id3.0)); // Clone shares Arc
    }

    #[test]
    fn test_street_name_normalization() {
        let name = StreetName::normalized("  via   dei  Neri ").unwrap();
        assert_eq!(name.as_str(), "VIA DEI NERI");
        assert!(StreetName::normalized("   ").is_none());
    }

    #[test]
    fn test_blank_section_is_absent() {
        assert!(SectionName::optional("  ").is_none());
        assert_eq!(
            SectionName::optional(" DA MICHELOZZI A MAZZETTA ").unwrap().as_str(),
            "DA MICHELOZZI A MAZZETTA"
        );
    }

    #[test]
    fn test_zone_key_display() {
        let key = ZoneKey {
            street: StreetName::new("BORGO TEGOLAIO"),
            section: Some(SectionName::new("DA MICHELOZZI A MAZZETTA")),
            days: DaySet::from_iter([DayCode::Wed, DayCode::Fri]),
        };
        assert_eq!(
            key.to_string(),
            "BORGO TEGOLAIO [DA MICHELOZZI A MAZZETTA] (WED,FRI)"
        );
    }

    #[test]
    fn test_identifier_serde_as_plain_string() {
        let id = StreetName::new("VIA ROMA");
        let yaml = serde_yaml::to_string(&id).unwrap();
        assert_eq!(yaml.trim(), "VIA ROMA");
        let back: StreetName = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, id);
    }
}
