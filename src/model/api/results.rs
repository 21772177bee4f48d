use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::common::{CarId, CategoryId, GroupId};

use super::entrant::EntrantSummary;

/// An entrant's standing within one category.
///
/// Ranks are positions in the sorted tally, so equal vote counts still get
/// distinct ranks. Ties are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntrant {
    pub rank: u32,
    #[serde(flatten)]
    pub entrant: EntrantSummary,
    pub vote_count: u32,
}

/// Computed standings for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category_id: CategoryId,
    pub category_name: String,
    pub group_id: Option<GroupId>,
    pub total_votes: u32,
    /// Sorted by vote count, most votes first.
    pub entrants: Vec<RankedEntrant>,
    pub has_override: bool,
    pub override_car_id: Option<CarId>,
    pub override_reason: Option<String>,
    pub overridden_at: Option<DateTime<Utc>>,
}

impl CategoryResult {
    /// The top-ranked entrant, if anyone received a vote.
    pub fn leader(&self) -> Option<&RankedEntrant> {
        self.entrants.first().filter(|e| e.vote_count > 0)
    }

    /// This category's standing for the given car, if it received any votes.
    pub fn standing_of(&self, car_id: CarId) -> Option<&RankedEntrant> {
        self.entrants.iter().find(|e| e.entrant.car_id == car_id)
    }
}

/// Overall voting statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingStats {
    pub total_voters: u64,
    pub voters_who_voted: u64,
    pub total_votes: u64,
    pub eligible_entrants: u64,
    pub active_categories: u64,
}

/// Standings for every active category, plus overall statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionResults {
    pub categories: Vec<CategoryResult>,
    pub stats: VotingStats,
}

/// A category winner together with their vote count in that category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningEntrant {
    #[serde(flatten)]
    pub entrant: EntrantSummary,
    pub vote_count: u32,
}

impl From<&RankedEntrant> for WinningEntrant {
    fn from(ranked: &RankedEntrant) -> Self {
        Self {
            entrant: ranked.entrant.clone(),
            vote_count: ranked.vote_count,
        }
    }
}

/// The vote-based winner of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWinner {
    pub category_id: CategoryId,
    pub category_name: String,
    pub winner: WinningEntrant,
}

/// The effective winner of a category, taking manual overrides into account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalWinner {
    pub category_id: CategoryId,
    pub category_name: String,
    pub winner: WinningEntrant,
    pub is_override: bool,
    pub override_reason: Option<String>,
}
