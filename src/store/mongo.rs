use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use mongodb::{
    bson::{self, doc, to_bson, Bson},
    options::{FindOptions, UpdateOptions},
    Client, Database,
};
use rocket::futures::TryStreamExt;
use serde::Deserialize;

use crate::{
    error::Result,
    model::{
        api::{EntrantSummary, Tally, VotingStats},
        common::{CarId, CategoryId, GroupId, PoolId, VoterId},
        db::{Category, CategoryGroup, Entrant, ManualWinner, NewVoter, Settings, Vote, Voter},
        mongodb::{
            ensure_indexes_exist, is_duplicate_key_error, Coll, Counter, MongoCollection,
            ENTRANTS, VOTER_ID_COUNTER_ID,
        },
    },
};

use super::{ConflictingVote, RecordStore};

/// `_id` of the single settings document.
const SETTINGS_ID: &str = "settings";

/// A tally row as produced by the aggregation in [`MongoStore::tallies`].
#[derive(Debug, Deserialize)]
struct TallyRow {
    votes: u32,
    entrant: Entrant,
}

/// Record store backed by a MongoDB database.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Wrap the given database, creating indexes and seeding the settings
    /// document with `initial` if it does not exist yet.
    pub async fn connect(client: Client, db: Database, initial: Settings) -> Result<Self> {
        ensure_indexes_exist(&db).await?;
        let store = Self { client, db };
        store.ensure_settings_exist(initial).await?;
        Ok(store)
    }

    fn coll<T: MongoCollection>(&self) -> Coll<T> {
        Coll::from_db(&self.db)
    }

    /// Insert the settings document unless one exists. Idempotent.
    async fn ensure_settings_exist(&self, initial: Settings) -> Result<()> {
        let update = doc! {
            "$setOnInsert": {
                "voting_open": initial.voting_open,
                "require_registration": initial.require_registration,
            }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        let result = self
            .coll::<Settings>()
            .update_one(doc! { "_id": SETTINGS_ID }, update, options)
            .await?;
        if result.upserted_id.is_some() {
            info!("Created settings document: {initial:?}");
        }
        Ok(())
    }

    /// IDs of the groups that share the given exclusivity pool.
    async fn groups_in_pool(&self, pool_id: PoolId) -> Result<Vec<GroupId>> {
        let groups: Vec<CategoryGroup> = self
            .coll::<CategoryGroup>()
            .find(doc! { "exclusivity_pool": pool_id }, None)
            .await?
            .try_collect()
            .await?;
        Ok(groups.into_iter().map(|group| group.id).collect())
    }
}

#[rocket::async_trait]
impl RecordStore for MongoStore {
    async fn settings(&self) -> Result<Settings> {
        let settings = self
            .coll::<Settings>()
            .find_one(doc! { "_id": SETTINGS_ID }, None)
            .await?;
        Ok(settings.unwrap_or_else(|| {
            warn!("Settings document missing; treating voting as closed");
            Settings::default()
        }))
    }

    async fn set_voting_open(&self, open: bool) -> Result<()> {
        let update = doc! {
            "$set": { "voting_open": open }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        self.coll::<Settings>()
            .update_one(doc! { "_id": SETTINGS_ID }, update, options)
            .await?;
        Ok(())
    }

    async fn voter_by_code(&self, code: &str) -> Result<Option<Voter>> {
        Ok(self
            .coll::<Voter>()
            .find_one(doc! { "code": code }, None)
            .await?)
    }

    async fn create_voter(&self, code: &str) -> Result<Voter> {
        let id = Counter::next(&self.coll(), VOTER_ID_COUNTER_ID).await?;
        let voter = Voter {
            id,
            voter: NewVoter::new(code.to_string()),
        };
        match self.coll::<Voter>().insert_one(&voter, None).await {
            Ok(_) => Ok(voter),
            // Someone registered the same code concurrently; use theirs.
            Err(err) if is_duplicate_key_error(&err) => {
                debug!("Voter code {code} registered concurrently");
                match self.voter_by_code(code).await? {
                    Some(existing) => Ok(existing),
                    None => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn entrant(&self, car_id: CarId) -> Result<Option<Entrant>> {
        let filter = doc! {
            "_id": car_id,
            "deleted": { "$ne": true },
        };
        Ok(self.coll::<Entrant>().find_one(filter, None).await?)
    }

    async fn category(&self, category_id: CategoryId) -> Result<Option<Category>> {
        Ok(self
            .coll::<Category>()
            .find_one(doc! { "_id": category_id }, None)
            .await?)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let options = FindOptions::builder()
            .sort(doc! { "display_order": 1, "_id": 1 })
            .build();
        Ok(self
            .coll::<Category>()
            .find(None, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn category_groups(&self) -> Result<Vec<CategoryGroup>> {
        Ok(self
            .coll::<CategoryGroup>()
            .find(None, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn exclusivity_pool(&self, category_id: CategoryId) -> Result<Option<PoolId>> {
        let group_id = match self.category(category_id).await?.and_then(|c| c.group_id) {
            Some(group_id) => group_id,
            None => return Ok(None),
        };
        let group = self
            .coll::<CategoryGroup>()
            .find_one(doc! { "_id": group_id }, None)
            .await?;
        Ok(group.and_then(|group| group.exclusivity_pool))
    }

    async fn find_conflicting_vote(
        &self,
        voter_id: VoterId,
        car_id: CarId,
        category_id: CategoryId,
        pool_id: PoolId,
    ) -> Result<Option<ConflictingVote>> {
        let group_ids = self.groups_in_pool(pool_id).await?;
        let filter = doc! {
            "_id": { "$ne": category_id },
            "group_id": { "$in": group_ids },
        };
        let siblings: Vec<Category> = self
            .coll::<Category>()
            .find(filter, None)
            .await?
            .try_collect()
            .await?;
        if siblings.is_empty() {
            return Ok(None);
        }

        let sibling_ids = siblings.iter().map(|c| c.id).collect::<Vec<_>>();
        let filter = doc! {
            "voter_id": voter_id,
            "car_id": car_id,
            "category_id": { "$in": sibling_ids },
        };
        let conflict = self.coll::<Vote>().find_one(filter, None).await?;
        Ok(conflict.and_then(|vote| {
            siblings
                .into_iter()
                .find(|c| c.id == vote.category_id)
                .map(|c| ConflictingVote {
                    category_id: c.id,
                    category_name: c.name,
                })
        }))
    }

    async fn record_vote(&self, vote: Vote, clear: Option<CategoryId>) -> Result<()> {
        let votes = self.coll::<Vote>();
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        if let Some(other) = clear {
            let filter = doc! {
                "voter_id": vote.voter_id,
                "category_id": other,
            };
            votes
                .delete_one_with_session(filter, None, &mut session)
                .await?;
        }

        let filter = doc! {
            "voter_id": vote.voter_id,
            "category_id": vote.category_id,
        };
        let update = doc! {
            "$set": { "car_id": vote.car_id }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        votes
            .update_one_with_session(filter, update, options, &mut session)
            .await?;

        session.commit_transaction().await?;
        Ok(())
    }

    async fn delete_vote(&self, voter_id: VoterId, category_id: CategoryId) -> Result<bool> {
        let filter = doc! {
            "voter_id": voter_id,
            "category_id": category_id,
        };
        let result = self.coll::<Vote>().delete_one(filter, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn votes_for_voter(&self, voter_id: VoterId) -> Result<Vec<Vote>> {
        let options = FindOptions::builder()
            .sort(doc! { "category_id": 1 })
            .build();
        Ok(self
            .coll::<Vote>()
            .find(doc! { "voter_id": voter_id }, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn tallies(&self, category_id: CategoryId) -> Result<Vec<Tally>> {
        let pipeline = vec![
            doc! { "$match": { "category_id": category_id } },
            doc! { "$group": { "_id": "$car_id", "votes": { "$sum": 1 } } },
            doc! {
                "$lookup": {
                    "from": ENTRANTS,
                    "localField": "_id",
                    "foreignField": "_id",
                    "as": "entrant",
                }
            },
            doc! { "$unwind": "$entrant" },
            doc! { "$sort": { "_id": 1 } },
        ];
        let mut cursor = self.coll::<Vote>().aggregate(pipeline, None).await?;
        let mut tallies = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            let row: TallyRow = bson::from_document(row)?;
            tallies.push(Tally {
                entrant: EntrantSummary::from(row.entrant),
                votes: row.votes,
            });
        }
        Ok(tallies)
    }

    async fn voting_stats(&self) -> Result<VotingStats> {
        let votes = self.coll::<Vote>();
        let eligible = doc! {
            "eligible": true,
            "deleted": { "$ne": true },
        };
        Ok(VotingStats {
            total_voters: self.coll::<Voter>().count_documents(None, None).await?,
            voters_who_voted: votes.distinct("voter_id", None, None).await?.len() as u64,
            total_votes: votes.count_documents(None, None).await?,
            eligible_entrants: self.coll::<Entrant>().count_documents(eligible, None).await?,
            active_categories: self
                .coll::<Category>()
                .count_documents(doc! { "active": true }, None)
                .await?,
        })
    }

    async fn set_manual_winner(
        &self,
        category_id: CategoryId,
        car_id: CarId,
        reason: &str,
        set_at: DateTime<Utc>,
    ) -> Result<bool> {
        let manual_winner = ManualWinner {
            car_id,
            reason: reason.to_string(),
            set_at,
        };
        let update = doc! {
            "$set": { "manual_winner": to_bson(&manual_winner)? }
        };
        let result = self
            .coll::<Category>()
            .update_one(doc! { "_id": category_id }, update, None)
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn clear_manual_winner(&self, category_id: CategoryId) -> Result<()> {
        let update = doc! {
            "$set": { "manual_winner": Bson::Null }
        };
        self.coll::<Category>()
            .update_one(doc! { "_id": category_id }, update, None)
            .await?;
        Ok(())
    }
}
