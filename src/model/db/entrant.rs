use serde::{Deserialize, Serialize};

use crate::model::common::CarId;

/// A competition entrant, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: CarId,
    /// Number shown on the car and the ballot.
    pub number: String,
    pub owner: String,
    /// Display name, e.g. "1967 Shelby GT500".
    pub name: String,
    pub photo_url: Option<String>,
    /// Ineligible entrants cannot receive new votes.
    pub eligible: bool,
    /// Identity in the external race-management system, if synced from it.
    pub external_id: Option<String>,
    /// Soft-deletion marker; deleted entrants are invisible to lookups.
    #[serde(default)]
    pub deleted: bool,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Entrant {
        pub fn example(id: CarId, name: &str) -> Self {
            Self {
                id,
                number: format!("{id:03}"),
                owner: format!("Owner of {name}"),
                name: name.to_string(),
                photo_url: None,
                eligible: true,
                external_id: None,
                deleted: false,
            }
        }
    }
}
