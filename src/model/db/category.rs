use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::{CarId, CategoryId, GroupId};

/// A single award category, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    /// Position of the category on the ballot.
    pub display_order: u32,
    /// Owning group, if any.
    pub group_id: Option<GroupId>,
    pub active: bool,
    /// Voter types allowed to vote here. Empty means anyone may vote.
    #[serde(default)]
    pub voter_types: Vec<String>,
    /// Administrator-forced winner. All override fields are set or unset together.
    #[serde(default)]
    pub manual_winner: Option<ManualWinner>,
}

impl Category {
    /// May a voter of the given type vote in this category?
    pub fn admits(&self, voter_type: Option<&str>) -> bool {
        if self.voter_types.is_empty() {
            return true;
        }
        voter_type.map_or(false, |t| self.voter_types.iter().any(|allowed| allowed == t))
    }
}

/// A manual override of a category's winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualWinner {
    pub car_id: CarId,
    /// Never empty.
    pub reason: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub set_at: DateTime<Utc>,
}
