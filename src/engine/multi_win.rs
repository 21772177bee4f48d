use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::{
    error::Result,
    model::{
        api::{EntrantSummary, MultiWinConflict, WonCategory},
        common::{CarId, GroupId},
    },
    store::RecordStore,
};

use super::results::{compute_results, effective_winner};

/// A group's win cap and display name.
struct Cap {
    max_wins: u32,
    name: String,
}

/// Entrants that effectively win more categories of a capped group than
/// the group allows. Reaching the cap exactly is fine.
pub async fn detect_multiple_wins(store: &dyn RecordStore) -> Result<Vec<MultiWinConflict>> {
    let caps = store
        .category_groups()
        .await?
        .into_iter()
        .filter_map(|group| {
            group.win_cap().map(|max_wins| {
                (
                    group.id,
                    Cap {
                        max_wins,
                        name: group.name,
                    },
                )
            })
        })
        .collect::<HashMap<GroupId, Cap>>();
    if caps.is_empty() {
        return Ok(Vec::new());
    }

    let results = compute_results(store).await?;
    let mut wins = BTreeMap::<(CarId, GroupId), (EntrantSummary, Vec<WonCategory>)>::new();
    for result in &results.categories {
        let group_id = match result.group_id {
            Some(group_id) if caps.contains_key(&group_id) => group_id,
            _ => continue,
        };
        let winner = match effective_winner(store, result).await {
            Some(winner) => winner.winner,
            None => continue,
        };
        wins.entry((winner.entrant.car_id, group_id))
            .or_insert_with(|| (winner.entrant, Vec::new()))
            .1
            .push(WonCategory {
                category_id: result.category_id,
                category_name: result.category_name.clone(),
            });
    }

    let conflicts = wins
        .into_iter()
        .filter_map(|((_, group_id), (entrant, categories))| {
            let cap = caps.get(&group_id)?;
            (categories.len() > cap.max_wins as usize).then(|| MultiWinConflict {
                entrant,
                categories,
                group_id,
                group_name: cap.name.clone(),
                max_wins_per_car: cap.max_wins,
            })
        })
        .collect::<Vec<_>>();
    debug!("Found {} multi-win conflicts", conflicts.len());
    Ok(conflicts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::overrides::set_manual_winner,
        model::db::{Category, CategoryGroup},
        store::{examples::*, MemoryStore},
    };

    #[rocket::async_test]
    async fn winning_both_capped_categories_is_reported() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(MOST_CREATIVE, SHELBY, 2);
        store.cast(MOST_CREATIVE, JAGUAR, 1);

        let conflicts = detect_multiple_wins(&store).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        let conflict = &conflicts[0];
        assert_eq!(conflict.entrant.car_id, SHELBY);
        assert_eq!(conflict.group_id, DESIGN_AWARDS);
        assert_eq!(conflict.group_name, "Design Awards");
        assert_eq!(conflict.max_wins_per_car, 1);
        let names = conflict
            .categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Best Design", "Most Creative"]);
    }

    #[rocket::async_test]
    async fn winning_up_to_the_cap_is_fine() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(MOST_CREATIVE, JAGUAR, 2);
        assert!(detect_multiple_wins(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn uncapped_groups_never_conflict() {
        let store = MemoryStore::example();
        store.cast(FASTEST_LOOKING, SHELBY, 3);
        store.cast(MOST_AERODYNAMIC, SHELBY, 3);
        store.cast(BEST_PAINT, SHELBY, 3);
        assert!(detect_multiple_wins(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn override_counts_as_a_win() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(MOST_CREATIVE, JAGUAR, 3);
        set_manual_winner(&store, MOST_CREATIVE, SHELBY, "Judges' decision")
            .await
            .unwrap();

        let conflicts = detect_multiple_wins(&store).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].entrant.car_id, SHELBY);
        assert_eq!(conflicts[0].categories.len(), 2);
    }

    #[rocket::async_test]
    async fn override_can_remove_a_conflict() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(MOST_CREATIVE, SHELBY, 3);
        set_manual_winner(&store, MOST_CREATIVE, PORSCHE, "Spread the awards")
            .await
            .unwrap();
        assert!(detect_multiple_wins(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn unresolvable_override_is_skipped() {
        let store = MemoryStore::example();
        store.cast(BEST_DESIGN, SHELBY, 3);
        store.cast(MOST_CREATIVE, SHELBY, 3);
        set_manual_winner(&store, MOST_CREATIVE, PORSCHE, "Judges' decision")
            .await
            .unwrap();
        store.delete_entrant(PORSCHE);

        // Most Creative is skipped rather than failing the scan, leaving
        // the Shelby with a single counted win.
        assert!(detect_multiple_wins(&store).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn cap_above_one_allows_that_many_wins() {
        let store = MemoryStore::example();
        let mut classics = CategoryGroup::example(3, "Classics");
        classics.max_wins_per_car = Some(2);
        store.add_group(classics);
        for id in 10..13 {
            store.add_category(Category::example(id, &format!("Classic {id}"), Some(3)));
        }
        store.cast(10, JAGUAR, 1);
        store.cast(11, JAGUAR, 1);
        assert!(detect_multiple_wins(&store).await.unwrap().is_empty());

        store.cast(12, JAGUAR, 1);
        let conflicts = detect_multiple_wins(&store).await.unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].categories.len(), 3);
        assert_eq!(conflicts[0].max_wins_per_car, 2);
    }
}
