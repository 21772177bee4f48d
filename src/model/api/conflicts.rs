use serde::{Deserialize, Serialize};

use crate::model::common::{CategoryId, GroupId};

use super::{entrant::EntrantSummary, results::RankedEntrant};

/// Two or more entrants share the top vote count in a category with no override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieConflict {
    pub category_id: CategoryId,
    pub category_name: String,
    /// The shared top vote count.
    pub vote_count: u32,
    pub entrants: Vec<RankedEntrant>,
}

/// A category won by the entrant of a [`MultiWinConflict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WonCategory {
    pub category_id: CategoryId,
    pub category_name: String,
}

/// An entrant effectively wins more categories of a group than the group allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiWinConflict {
    pub entrant: EntrantSummary,
    pub categories: Vec<WonCategory>,
    pub group_id: GroupId,
    pub group_name: String,
    pub max_wins_per_car: u32,
}
