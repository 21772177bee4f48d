use serde::{Deserialize, Serialize};

use crate::model::common::{CarId, CategoryId};

/// A voter's selection for one category. A `car_id` of zero removes the
/// voter's existing selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub voter_code: String,
    pub category_id: CategoryId,
    pub car_id: CarId,
}

/// The result of a successful vote submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub success: bool,
    pub message: String,
    /// True if an earlier vote for the same car in a sibling category was removed.
    pub conflict_cleared: bool,
    pub conflict_category_id: Option<CategoryId>,
    pub conflict_category: Option<String>,
}

impl VoteOutcome {
    pub fn recorded() -> Self {
        Self::plain("Vote recorded")
    }

    pub fn removed() -> Self {
        Self::plain("Vote removed")
    }

    /// The vote was recorded after moving it out of `category_name`.
    pub fn moved_from(category_id: CategoryId, category_name: String) -> Self {
        Self {
            success: true,
            message: format!("Vote recorded; your vote for this car in {category_name} was removed"),
            conflict_cleared: true,
            conflict_category_id: Some(category_id),
            conflict_category: Some(category_name),
        }
    }

    fn plain(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            conflict_cleared: false,
            conflict_category_id: None,
            conflict_category: None,
        }
    }
}

/// One of a voter's current selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterSelection {
    pub category_id: CategoryId,
    pub car_id: CarId,
}
