use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::{
    error::Result,
    model::{
        api::{EntrantSummary, Tally, VotingStats},
        common::{CarId, CategoryId, GroupId, PoolId, VoterId},
        db::{Category, CategoryGroup, Entrant, ManualWinner, NewVoter, Settings, Vote, Voter},
    },
};

use super::{ConflictingVote, RecordStore};

#[derive(Debug, Default)]
struct Records {
    settings: Settings,
    next_voter_id: VoterId,
    voters: BTreeMap<VoterId, Voter>,
    entrants: BTreeMap<CarId, Entrant>,
    categories: BTreeMap<CategoryId, Category>,
    groups: BTreeMap<GroupId, CategoryGroup>,
    votes: BTreeMap<(VoterId, CategoryId), CarId>,
}

impl Records {
    fn pool_of(&self, category_id: CategoryId) -> Option<PoolId> {
        let group_id = self.categories.get(&category_id)?.group_id?;
        self.groups.get(&group_id)?.exclusivity_pool
    }

    fn live_entrant(&self, car_id: CarId) -> Option<&Entrant> {
        self.entrants.get(&car_id).filter(|e| !e.deleted)
    }
}

/// An in-process record store.
///
/// Every operation runs under a single lock, so multi-step writes such as
/// [`RecordStore::record_vote`] are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    /// Create an empty store with the given settings.
    pub fn new(settings: Settings) -> Self {
        let records = Records {
            settings,
            next_voter_id: 1,
            ..Default::default()
        };
        Self {
            records: Mutex::new(records),
        }
    }

    /// Lock the records. A panic while the lock was held cannot leave the
    /// maps half-updated, so poisoning is ignored.
    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_entrant(&self, entrant: Entrant) {
        self.records().entrants.insert(entrant.id, entrant);
    }

    pub fn add_category(&self, category: Category) {
        self.records().categories.insert(category.id, category);
    }

    pub fn add_group(&self, group: CategoryGroup) {
        self.records().groups.insert(group.id, group);
    }

    /// Pre-register a voter. Codes are unique: if the code is already taken
    /// the existing voter is returned unchanged.
    pub fn register_voter(&self, voter: NewVoter) -> Voter {
        let mut records = self.records();
        if let Some(existing) = records.voters.values().find(|v| v.code == voter.code) {
            return existing.clone();
        }
        let voter = Voter {
            id: records.next_voter_id.max(1),
            voter,
        };
        records.next_voter_id = voter.id + 1;
        records.voters.insert(voter.id, voter.clone());
        voter
    }

    /// Change an entrant's eligibility. Returns false if there is no such entrant.
    pub fn set_eligible(&self, car_id: CarId, eligible: bool) -> bool {
        match self.records().entrants.get_mut(&car_id) {
            Some(entrant) => {
                entrant.eligible = eligible;
                true
            }
            None => false,
        }
    }

    /// Soft-delete an entrant. Its existing votes are kept.
    pub fn delete_entrant(&self, car_id: CarId) {
        if let Some(entrant) = self.records().entrants.get_mut(&car_id) {
            entrant.deleted = true;
        }
    }

    /// All votes currently held, in (voter, category) order.
    pub fn votes(&self) -> Vec<Vote> {
        self.records()
            .votes
            .iter()
            .map(|(&(voter_id, category_id), &car_id)| Vote {
                voter_id,
                category_id,
                car_id,
            })
            .collect()
    }
}

#[rocket::async_trait]
impl RecordStore for MemoryStore {
    async fn settings(&self) -> Result<Settings> {
        Ok(self.records().settings)
    }

    async fn set_voting_open(&self, open: bool) -> Result<()> {
        self.records().settings.voting_open = open;
        Ok(())
    }

    async fn voter_by_code(&self, code: &str) -> Result<Option<Voter>> {
        Ok(self
            .records()
            .voters
            .values()
            .find(|voter| voter.code == code)
            .cloned())
    }

    async fn create_voter(&self, code: &str) -> Result<Voter> {
        Ok(self.register_voter(NewVoter::new(code.to_string())))
    }

    async fn entrant(&self, car_id: CarId) -> Result<Option<Entrant>> {
        Ok(self.records().live_entrant(car_id).cloned())
    }

    async fn category(&self, category_id: CategoryId) -> Result<Option<Category>> {
        Ok(self.records().categories.get(&category_id).cloned())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let mut categories = self
            .records()
            .categories
            .values()
            .cloned()
            .collect::<Vec<_>>();
        categories.sort_by_key(|c| (c.display_order, c.id));
        Ok(categories)
    }

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self.records().groups.values().cloned().collect())
    }

    async fn exclusivity_pool(&self, category_id: CategoryId) -> Result<Option<PoolId>> {
        Ok(self.records().pool_of(category_id))
    }

    async fn find_conflicting_vote(
        &self,
        voter_id: VoterId,
        car_id: CarId,
        category_id: CategoryId,
        pool_id: PoolId,
    ) -> Result<Option<ConflictingVote>> {
        let records = self.records();
        let conflict = records
            .votes
            .range((voter_id, CategoryId::MIN)..=(voter_id, CategoryId::MAX))
            .map(|(&(_, other), &voted)| (other, voted))
            .filter(|&(other, voted)| other != category_id && voted == car_id)
            .filter(|&(other, _)| records.pool_of(other) == Some(pool_id))
            .find_map(|(other, _)| records.categories.get(&other))
            .map(|category| ConflictingVote {
                category_id: category.id,
                category_name: category.name.clone(),
            });
        Ok(conflict)
    }

    async fn record_vote(&self, vote: Vote, clear: Option<CategoryId>) -> Result<()> {
        let mut records = self.records();
        if let Some(other) = clear {
            records.votes.remove(&(vote.voter_id, other));
        }
        records
            .votes
            .insert((vote.voter_id, vote.category_id), vote.car_id);
        Ok(())
    }

    async fn delete_vote(&self, voter_id: VoterId, category_id: CategoryId) -> Result<bool> {
        Ok(self
            .records()
            .votes
            .remove(&(voter_id, category_id))
            .is_some())
    }

    async fn votes_for_voter(&self, voter_id: VoterId) -> Result<Vec<Vote>> {
        Ok(self
            .records()
            .votes
            .range((voter_id, CategoryId::MIN)..=(voter_id, CategoryId::MAX))
            .map(|(&(voter_id, category_id), &car_id)| Vote {
                voter_id,
                category_id,
                car_id,
            })
            .collect())
    }

    async fn tallies(&self, category_id: CategoryId) -> Result<Vec<Tally>> {
        let records = self.records();
        let mut counts = BTreeMap::<CarId, u32>::new();
        for (&(_, category), &car_id) in records.votes.iter() {
            if category == category_id {
                *counts.entry(car_id).or_default() += 1;
            }
        }
        let tallies = counts
            .into_iter()
            .filter_map(|(car_id, votes)| {
                records.entrants.get(&car_id).map(|entrant| Tally {
                    entrant: EntrantSummary::from(entrant),
                    votes,
                })
            })
            .collect();
        Ok(tallies)
    }

    async fn voting_stats(&self) -> Result<VotingStats> {
        let records = self.records();
        let voters_who_voted = records
            .votes
            .keys()
            .map(|&(voter_id, _)| voter_id)
            .collect::<BTreeSet<_>>()
            .len();
        Ok(VotingStats {
            total_voters: records.voters.len() as u64,
            voters_who_voted: voters_who_voted as u64,
            total_votes: records.votes.len() as u64,
            eligible_entrants: records
                .entrants
                .values()
                .filter(|e| e.eligible && !e.deleted)
                .count() as u64,
            active_categories: records.categories.values().filter(|c| c.active).count() as u64,
        })
    }

    async fn set_manual_winner(
        &self,
        category_id: CategoryId,
        car_id: CarId,
        reason: &str,
        set_at: DateTime<Utc>,
    ) -> Result<bool> {
        match self.records().categories.get_mut(&category_id) {
            Some(category) => {
                category.manual_winner = Some(ManualWinner {
                    car_id,
                    reason: reason.to_string(),
                    set_at,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_manual_winner(&self, category_id: CategoryId) -> Result<()> {
        if let Some(category) = self.records().categories.get_mut(&category_id) {
            category.manual_winner = None;
        }
        Ok(())
    }
}

/// Example data for tests.
#[cfg(test)]
pub mod examples {
    use super::*;

    pub const BEST_DESIGN: CategoryId = 1;
    pub const MOST_CREATIVE: CategoryId = 2;
    pub const FASTEST_LOOKING: CategoryId = 3;
    pub const MOST_AERODYNAMIC: CategoryId = 4;
    pub const BEST_PAINT: CategoryId = 5;
    pub const JUDGES_CHOICE: CategoryId = 6;
    pub const RETIRED_AWARD: CategoryId = 7;

    pub const SHELBY: CarId = 1;
    pub const JAGUAR: CarId = 2;
    pub const PORSCHE: CarId = 3;
    pub const MORGAN: CarId = 4;

    pub const DESIGN_AWARDS: GroupId = 1;
    pub const SPEED_AWARDS: GroupId = 2;
    pub const SPEED_POOL: PoolId = 7;

    pub const JUDGE_CODE: &str = "JUDGE-1";

    /// The records behind the example show, for seeding any store.
    pub struct Fixture {
        pub settings: Settings,
        pub groups: Vec<CategoryGroup>,
        pub categories: Vec<Category>,
        pub entrants: Vec<Entrant>,
        pub judge: NewVoter,
    }

    /// A small show: two grouped award families, a standalone category,
    /// a judges-only category and an inactive one. The Morgan is ineligible.
    /// Voting is open and anyone may vote.
    pub fn fixture() -> Fixture {
        let mut design = CategoryGroup::example(DESIGN_AWARDS, "Design Awards");
        design.max_wins_per_car = Some(1);
        let mut speed = CategoryGroup::example(SPEED_AWARDS, "Speed Awards");
        speed.exclusivity_pool = Some(SPEED_POOL);

        let mut categories = [
            (BEST_DESIGN, "Best Design", Some(DESIGN_AWARDS)),
            (MOST_CREATIVE, "Most Creative", Some(DESIGN_AWARDS)),
            (FASTEST_LOOKING, "Fastest Looking", Some(SPEED_AWARDS)),
            (MOST_AERODYNAMIC, "Most Aerodynamic", Some(SPEED_AWARDS)),
            (BEST_PAINT, "Best Paint", None),
        ]
        .into_iter()
        .map(|(id, name, group)| Category::example(id, name, group))
        .collect::<Vec<_>>();
        let mut judges = Category::example(JUDGES_CHOICE, "Judges' Choice", None);
        judges.voter_types = vec!["judge".to_string()];
        categories.push(judges);
        let mut retired = Category::example(RETIRED_AWARD, "Retired Award", None);
        retired.active = false;
        categories.push(retired);

        let mut morgan = Entrant::example(MORGAN, "Morgan Plus 4");
        morgan.eligible = false;
        let entrants = vec![
            Entrant::example(SHELBY, "Shelby GT500"),
            Entrant::example(JAGUAR, "Jaguar E-Type"),
            Entrant::example(PORSCHE, "Porsche 911"),
            morgan,
        ];

        let mut judge = NewVoter::new(JUDGE_CODE.to_string());
        judge.voter_type = Some("judge".to_string());

        Fixture {
            settings: Settings {
                voting_open: true,
                require_registration: false,
            },
            groups: vec![design, speed],
            categories,
            entrants,
            judge,
        }
    }

    impl MemoryStore {
        /// An in-memory store holding the example show.
        pub fn example() -> Self {
            let fixture = fixture();
            let store = Self::new(fixture.settings);
            fixture.groups.into_iter().for_each(|group| store.add_group(group));
            fixture
                .categories
                .into_iter()
                .for_each(|category| store.add_category(category));
            fixture
                .entrants
                .into_iter()
                .for_each(|entrant| store.add_entrant(entrant));
            store.register_voter(fixture.judge);
            store
        }

        /// Cast `count` votes for a car in a category, each from a fresh voter.
        pub fn cast(&self, category_id: CategoryId, car_id: CarId, count: u32) {
            for _ in 0..count {
                let code = format!("V-{category_id}-{car_id}-{}", self.records().next_voter_id);
                let voter = self.register_voter(NewVoter::new(code));
                self.records()
                    .votes
                    .insert((voter.id, category_id), car_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{examples::*, *};

    #[rocket::async_test]
    async fn tallies_are_counted_per_car() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(BEST_DESIGN, JAGUAR, 2);
        store.cast(BEST_PAINT, JAGUAR, 1);

        let tallies = store.tallies(BEST_DESIGN).await.unwrap();
        let counts = tallies
            .iter()
            .map(|t| (t.entrant.car_id, t.votes))
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![(SHELBY, 3), (JAGUAR, 2)]);
    }

    #[rocket::async_test]
    async fn conflicts_only_come_from_the_same_pool() {
        let store = MemoryStore::example();
        let voter = store.create_voter("ABC").await.unwrap();
        let vote = |category_id| Vote {
            voter_id: voter.id,
            category_id,
            car_id: SHELBY,
        };
        store.record_vote(vote(FASTEST_LOOKING), None).await.unwrap();
        store.record_vote(vote(BEST_PAINT), None).await.unwrap();

        let conflict = store
            .find_conflicting_vote(voter.id, SHELBY, MOST_AERODYNAMIC, SPEED_POOL)
            .await
            .unwrap();
        assert_eq!(
            conflict,
            Some(ConflictingVote {
                category_id: FASTEST_LOOKING,
                category_name: "Fastest Looking".to_string(),
            })
        );

        // The vote in the target category itself is never a conflict.
        let conflict = store
            .find_conflicting_vote(voter.id, SHELBY, FASTEST_LOOKING, SPEED_POOL)
            .await
            .unwrap();
        assert_eq!(conflict, None);
    }

    #[rocket::async_test]
    async fn voter_codes_are_unique() {
        let store = MemoryStore::example();
        let first = store.create_voter("DUP").await.unwrap();
        let second = store.create_voter("DUP").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.voting_stats().await.unwrap().total_voters, 2);

        // Pre-registering a taken code keeps the original voter.
        let mut judge = NewVoter::new("DUP".to_string());
        judge.voter_type = Some("judge".to_string());
        assert_eq!(store.register_voter(judge), first);
        let voter = store.voter_by_code("DUP").await.unwrap().unwrap();
        assert_eq!(voter.voter_type, None);
    }

    #[rocket::async_test]
    async fn deleted_entrants_are_hidden() {
        let store = MemoryStore::example();
        store.delete_entrant(PORSCHE);
        assert_eq!(store.entrant(PORSCHE).await.unwrap(), None);
        assert!(store.entrant(SHELBY).await.unwrap().is_some());
    }

    #[rocket::async_test]
    async fn stats_count_distinct_voters() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 2);
        let voter = store.voter_by_code(JUDGE_CODE).await.unwrap().unwrap();
        for category_id in [BEST_DESIGN, BEST_PAINT] {
            let vote = Vote {
                voter_id: voter.id,
                category_id,
                car_id: JAGUAR,
            };
            store.record_vote(vote, None).await.unwrap();
        }

        let stats = store.voting_stats().await.unwrap();
        assert_eq!(stats.total_voters, 3);
        assert_eq!(stats.voters_who_voted, 3);
        assert_eq!(stats.total_votes, 4);
        assert_eq!(stats.eligible_entrants, 3);
        assert_eq!(stats.active_categories, 6);
    }
}
