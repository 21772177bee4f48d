//! The record store: everything the voting engine persists or reads.
//!
//! The engine holds no state between calls; it sees the competition only
//! through a [`RecordStore`]. Two implementations are provided: MongoDB for
//! production and an in-process store for tests and database-less runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    model::{
        api::{Tally, VotingStats},
        common::{CarId, CategoryId, PoolId, VoterId},
        db::{Category, CategoryGroup, Entrant, Settings, Vote, Voter},
    },
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// The store as held in Rocket managed state.
pub type SharedStore = Arc<dyn RecordStore>;

/// A category that already holds a conflicting vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingVote {
    pub category_id: CategoryId,
    pub category_name: String,
}

/// Persistence operations consumed by the voting engine.
///
/// Lookups report absence as `Ok(None)`; `Err` is reserved for storage failures.
/// Implementations must serialise conflicting writes for the same voter.
#[rocket::async_trait]
pub trait RecordStore: Send + Sync {
    /// Global settings, including the voting window.
    async fn settings(&self) -> Result<Settings>;

    /// Open or close the voting window.
    async fn set_voting_open(&self, open: bool) -> Result<()>;

    async fn voter_by_code(&self, code: &str) -> Result<Option<Voter>>;

    /// Create a bare voter with the given registration code and the next free ID.
    /// Codes are unique: if the code is taken, the existing voter is returned.
    async fn create_voter(&self, code: &str) -> Result<Voter>;

    /// A non-deleted entrant.
    async fn entrant(&self, car_id: CarId) -> Result<Option<Entrant>>;

    async fn category(&self, category_id: CategoryId) -> Result<Option<Category>>;

    /// All categories, in display order.
    async fn categories(&self) -> Result<Vec<Category>>;

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>>;

    /// The exclusivity pool the category belongs to through its group, if any.
    async fn exclusivity_pool(&self, category_id: CategoryId) -> Result<Option<PoolId>>;

    /// Find a vote by `voter_id` for `car_id` in a category other than
    /// `category_id` that shares the exclusivity pool `pool_id`.
    async fn find_conflicting_vote(
        &self,
        voter_id: VoterId,
        car_id: CarId,
        category_id: CategoryId,
        pool_id: PoolId,
    ) -> Result<Option<ConflictingVote>>;

    /// Atomically remove the voter's vote in `clear` (if given) and set their
    /// vote in `vote.category_id` to `vote.car_id`, replacing any previous one.
    async fn record_vote(&self, vote: Vote, clear: Option<CategoryId>) -> Result<()>;

    /// Remove the voter's vote in a category. Returns whether one existed.
    async fn delete_vote(&self, voter_id: VoterId, category_id: CategoryId) -> Result<bool>;

    /// The voter's current votes, ordered by category ID.
    async fn votes_for_voter(&self, voter_id: VoterId) -> Result<Vec<Vote>>;

    /// Vote tallies for a category, joined with entrant display fields.
    /// Only entrants with at least one vote appear, ordered by car ID.
    async fn tallies(&self, category_id: CategoryId) -> Result<Vec<Tally>>;

    async fn voting_stats(&self) -> Result<VotingStats>;

    /// Store a manual winner. Returns false if the category does not exist.
    async fn set_manual_winner(
        &self,
        category_id: CategoryId,
        car_id: CarId,
        reason: &str,
        set_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Remove any manual winner. Clearing an unset override is not an error.
    async fn clear_manual_winner(&self, category_id: CategoryId) -> Result<()>;
}

#[cfg(test)]
pub use memory::examples;
