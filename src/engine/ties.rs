use crate::{
    error::Result,
    model::api::{CategoryResult, TieConflict},
    store::RecordStore,
};

use super::results::compute_results;

/// Categories where two or more entrants share the top vote count.
///
/// A manual winner settles a tie, so overridden categories are never reported.
pub async fn detect_ties(store: &dyn RecordStore) -> Result<Vec<TieConflict>> {
    let results = compute_results(store).await?;
    Ok(find_ties(&results.categories))
}

/// Find unresolved first-place ties in already computed results.
pub fn find_ties(results: &[CategoryResult]) -> Vec<TieConflict> {
    results
        .iter()
        .filter(|result| !result.has_override && result.entrants.len() >= 2)
        .filter_map(|result| {
            let top = result.leader()?.vote_count;
            // Standings are sorted, so the tied entrants form a prefix.
            let tied = result
                .entrants
                .iter()
                .take_while(|entrant| entrant.vote_count == top)
                .cloned()
                .collect::<Vec<_>>();
            (tied.len() > 1).then(|| TieConflict {
                category_id: result.category_id,
                category_name: result.category_name.clone(),
                vote_count: top,
                entrants: tied,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::overrides::{clear_manual_winner, set_manual_winner},
        store::{examples::*, MemoryStore},
    };

    #[rocket::async_test]
    async fn clear_winner_is_not_a_tie() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(BEST_DESIGN, JAGUAR, 2);
        assert!(detect_ties(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn shared_top_count_is_a_tie() {
        let store = MemoryStore::example();
        store.cast(BEST_PAINT, SHELBY, 2);
        store.cast(BEST_PAINT, JAGUAR, 2);
        store.cast(BEST_PAINT, PORSCHE, 1);

        let ties = detect_ties(&store).await.unwrap();
        assert_eq!(ties.len(), 1);
        assert_eq!(ties[0].category_name, "Best Paint");
        assert_eq!(ties[0].vote_count, 2);
        let tied = ties[0]
            .entrants
            .iter()
            .map(|e| e.entrant.car_id)
            .collect::<Vec<_>>();
        assert_eq!(tied, vec![SHELBY, JAGUAR]);
    }

    #[rocket::async_test]
    async fn three_way_tie_lists_everyone() {
        let store = MemoryStore::example();
        for car_id in [SHELBY, JAGUAR, PORSCHE] {
            store.cast(MOST_CREATIVE, car_id, 1);
        }
        let ties = detect_ties(&store).await.unwrap();
        assert_eq!(ties.len(), 1);
        assert_eq!(ties[0].entrants.len(), 3);
    }

    #[rocket::async_test]
    async fn single_entrant_is_not_a_tie() {
        let store = MemoryStore::example();
        store.cast(BEST_PAINT, SHELBY, 4);
        assert!(detect_ties(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn override_resolves_a_tie() {
        let store = MemoryStore::example();
        store.cast(BEST_PAINT, SHELBY, 2);
        store.cast(BEST_PAINT, JAGUAR, 2);
        set_manual_winner(&store, BEST_PAINT, JAGUAR, "Judges' decision")
            .await
            .unwrap();
        assert!(detect_ties(&store).await.unwrap().is_empty());

        clear_manual_winner(&store, BEST_PAINT).await.unwrap();
        assert_eq!(detect_ties(&store).await.unwrap().len(), 1);
    }
}
