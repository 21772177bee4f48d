use serde::{Deserialize, Serialize};

use crate::model::common::{GroupId, PoolId};

/// An administrative grouping of categories, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Categories whose groups share a pool cannot both hold a voter's vote
    /// for the same car.
    pub exclusivity_pool: Option<PoolId>,
    /// How many categories of this group a single car may win.
    pub max_wins_per_car: Option<u32>,
}

impl CategoryGroup {
    /// The configured win cap, if it is a positive number.
    pub fn win_cap(&self) -> Option<u32> {
        self.max_wins_per_car.filter(|&cap| cap > 0)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl CategoryGroup {
        pub fn example(id: GroupId, name: &str) -> Self {
            Self {
                id,
                name: name.to_string(),
                description: String::new(),
                exclusivity_pool: None,
                max_wins_per_car: None,
            }
        }
    }
}
