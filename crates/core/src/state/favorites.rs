use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteStreet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub added_at: NaiveDateTime,
}

/// Streets monitored regardless of parking, in insertion order.
///
/// Names are unique ignoring case and surrounding whitespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    streets: Vec<FavoriteStreet>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_uppercase() == b.trim().to_uppercase()
}

impl Favorites {
    /// `false` if the name is blank or already present
    pub fn add(&mut self, name: &str, description: Option<String>, added_at: NaiveDateTime) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }

        self.streets.push(FavoriteStreet {
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            added_at,
        });
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.streets.len();
        self.streets.retain(|street| !same_name(&street.name, name));
        self.streets.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streets.iter().any(|street| same_name(&street.name, name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteStreet> {
        self.streets.iter()
    }

    pub fn len(&self) -> usize {
        self.streets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streets.is_empty()
    }
}
