use log::{debug, info};

use crate::{
    error::{Error, Result},
    model::{
        api::{VoteOutcome, VoteRequest, VoterSelection},
        common::NO_CAR,
        db::{Vote, Voter},
    },
    store::RecordStore,
};

/// Record, change or remove a voter's selection in one category.
///
/// Voting for a car that the voter already chose in another category of the
/// same exclusivity pool moves the vote: the earlier one is deleted and the
/// outcome names the category it was removed from.
pub async fn submit_vote(store: &dyn RecordStore, request: &VoteRequest) -> Result<VoteOutcome> {
    let settings = store.settings().await?;
    if !settings.voting_open {
        return Err(Error::VotingClosed);
    }

    let code = request.voter_code.trim();
    if code.is_empty() {
        return Err(Error::Validation("Voter code must not be empty".to_string()));
    }
    // Registration is checked up front, but a new voter is only created once
    // the vote is known to be valid.
    let existing = store.voter_by_code(code).await?;
    if existing.is_none() && settings.require_registration {
        return Err(Error::UnregisteredCode(code.to_string()));
    }

    if request.car_id == NO_CAR {
        let removed = match &existing {
            Some(voter) => store.delete_vote(voter.id, request.category_id).await?,
            None => false,
        };
        debug!(
            "Voter {code} deselected category {} (vote existed: {removed})",
            request.category_id
        );
        return Ok(VoteOutcome::removed());
    }

    let entrant = store
        .entrant(request.car_id)
        .await?
        .ok_or(Error::EntrantNotFound(request.car_id))?;
    if !entrant.eligible {
        return Err(Error::EntrantNotEligible(entrant.id));
    }
    let category = store
        .category(request.category_id)
        .await?
        .filter(|category| category.active)
        .ok_or(Error::CategoryNotFound(request.category_id))?;
    let voter_type = existing.as_ref().and_then(|voter| voter.voter_type.as_deref());
    if !category.admits(voter_type) {
        return Err(Error::VoterTypeNotAllowed(category.id));
    }

    let voter = match existing {
        Some(voter) => voter,
        None => register_voter(store, code).await?,
    };

    let conflict = match store.exclusivity_pool(category.id).await? {
        Some(pool_id) => {
            store
                .find_conflicting_vote(voter.id, entrant.id, category.id, pool_id)
                .await?
        }
        None => None,
    };

    let vote = Vote {
        voter_id: voter.id,
        category_id: category.id,
        car_id: entrant.id,
    };
    store
        .record_vote(vote, conflict.as_ref().map(|c| c.category_id))
        .await?;

    match conflict {
        Some(conflict) => {
            info!(
                "Voter {} moved car {} from category {} to {}",
                voter.id, entrant.id, conflict.category_id, category.id
            );
            Ok(VoteOutcome::moved_from(
                conflict.category_id,
                conflict.category_name,
            ))
        }
        None => {
            debug!(
                "Voter {} voted car {} in category {}",
                voter.id, entrant.id, category.id
            );
            Ok(VoteOutcome::recorded())
        }
    }
}

/// The voter's current selections. An unknown code has none.
pub async fn voter_selections(store: &dyn RecordStore, code: &str) -> Result<Vec<VoterSelection>> {
    let voter = match store.voter_by_code(code.trim()).await? {
        Some(voter) => voter,
        None => return Ok(Vec::new()),
    };
    let selections = store
        .votes_for_voter(voter.id)
        .await?
        .into_iter()
        .map(|vote| VoterSelection {
            category_id: vote.category_id,
            car_id: vote.car_id,
        })
        .collect();
    Ok(selections)
}

/// Register a bare voter on their first accepted vote.
async fn register_voter(store: &dyn RecordStore, code: &str) -> Result<Voter> {
    let voter = store.create_voter(code).await?;
    info!("Registered voter {} on first vote", voter.id);
    Ok(voter)
}
