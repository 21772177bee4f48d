use log::warn;

use crate::{
    error::Result,
    model::{
        api::{
            CategoryResult, CategoryWinner, CompetitionResults, EntrantSummary, FinalWinner,
            RankedEntrant, WinningEntrant,
        },
        common::CategoryId,
        db::Category,
    },
    store::RecordStore,
};

/// Standings for every active category, with overall statistics.
///
/// Categories nobody voted in are included with empty standings.
pub async fn compute_results(store: &dyn RecordStore) -> Result<CompetitionResults> {
    let mut categories = Vec::new();
    for category in store.categories().await? {
        if category.active {
            categories.push(category_result(store, &category).await?);
        }
    }
    let stats = store.voting_stats().await?;
    Ok(CompetitionResults { categories, stats })
}

/// Standings for a single active category, or `None` if there is no such category.
pub async fn compute_category_results(
    store: &dyn RecordStore,
    category_id: CategoryId,
) -> Result<Option<CategoryResult>> {
    match store.category(category_id).await? {
        Some(category) if category.active => Ok(Some(category_result(store, &category).await?)),
        _ => Ok(None),
    }
}

/// The top vote-getter of every category that received votes.
pub async fn compute_winners(store: &dyn RecordStore) -> Result<Vec<CategoryWinner>> {
    let results = compute_results(store).await?;
    let winners = results
        .categories
        .iter()
        .filter_map(|result| {
            result.leader().map(|leader| CategoryWinner {
                category_id: result.category_id,
                category_name: result.category_name.clone(),
                winner: leader.into(),
            })
        })
        .collect();
    Ok(winners)
}

/// The effective winner of every category: the manual winner where one is
/// set, otherwise the top vote-getter. Categories with neither are omitted.
pub async fn compute_final_winners(store: &dyn RecordStore) -> Result<Vec<FinalWinner>> {
    let results = compute_results(store).await?;
    let mut winners = Vec::new();
    for result in &results.categories {
        if let Some(winner) = effective_winner(store, result).await {
            winners.push(FinalWinner {
                category_id: result.category_id,
                category_name: result.category_name.clone(),
                is_override: winner.is_override,
                override_reason: winner
                    .is_override
                    .then(|| result.override_reason.clone())
                    .flatten(),
                winner: winner.winner,
            });
        }
    }
    Ok(winners)
}

/// Who actually wins a category.
pub(crate) struct EffectiveWinner {
    pub winner: WinningEntrant,
    pub is_override: bool,
}

/// Resolve the effective winner of a category.
///
/// A manual winner who received no votes in the category is looked up in
/// the store. If that lookup fails or finds nothing the category is skipped,
/// so that one bad override cannot hide the rest of the results.
pub(crate) async fn effective_winner(
    store: &dyn RecordStore,
    result: &CategoryResult,
) -> Option<EffectiveWinner> {
    let car_id = match result.override_car_id {
        Some(car_id) => car_id,
        None => {
            return result.leader().map(|leader| EffectiveWinner {
                winner: leader.into(),
                is_override: false,
            })
        }
    };

    if let Some(standing) = result.standing_of(car_id) {
        return Some(EffectiveWinner {
            winner: standing.into(),
            is_override: true,
        });
    }
    match store.entrant(car_id).await {
        Ok(Some(entrant)) => Some(EffectiveWinner {
            winner: WinningEntrant {
                entrant: EntrantSummary::from(entrant),
                vote_count: 0,
            },
            is_override: true,
        }),
        Ok(None) => {
            warn!(
                "Manual winner {car_id} of category {} does not exist; skipping category",
                result.category_id
            );
            None
        }
        Err(e) => {
            warn!(
                "Failed to look up manual winner {car_id} of category {}, skipping category: {e}",
                result.category_id
            );
            None
        }
    }
}

/// Rank a category's tallies. Ranks follow sorted position, so equal counts
/// still receive distinct ranks.
async fn category_result(store: &dyn RecordStore, category: &Category) -> Result<CategoryResult> {
    let mut tallies = store.tallies(category.id).await?;
    // Stable: equal counts keep the store's order.
    tallies.sort_by(|a, b| b.votes.cmp(&a.votes));

    let total_votes: u32 = tallies.iter().map(|tally| tally.votes).sum();
    let entrants = tallies
        .into_iter()
        .zip(1..)
        .map(|(tally, rank)| RankedEntrant {
            rank,
            entrant: tally.entrant,
            vote_count: tally.votes,
        })
        .collect();

    let manual_winner = category.manual_winner.as_ref();
    Ok(CategoryResult {
        category_id: category.id,
        category_name: category.name.clone(),
        group_id: category.group_id,
        total_votes,
        entrants,
        has_override: manual_winner.is_some(),
        override_car_id: manual_winner.map(|m| m.car_id),
        override_reason: manual_winner.map(|m| m.reason.clone()),
        overridden_at: manual_winner.map(|m| m.set_at),
    })
}
