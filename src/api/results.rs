use rocket::{serde::json::Json, Route, State};

use crate::{
    engine,
    error::Result,
    model::{
        api::{
            CategoryResult, CategoryWinner, CompetitionResults, FinalWinner, MultiWinConflict,
            TieConflict,
        },
        common::CategoryId,
    },
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![
        results,
        category_results,
        winners,
        final_winners,
        ties,
        multi_wins,
    ]
}

#[get("/results")]
async fn results(store: &State<SharedStore>) -> Result<Json<CompetitionResults>> {
    Ok(Json(engine::compute_results(store.inner().as_ref()).await?))
}

/// `None` becomes a 404.
#[get("/results/<category_id>")]
async fn category_results(
    category_id: CategoryId,
    store: &State<SharedStore>,
) -> Result<Option<Json<CategoryResult>>> {
    let result = engine::compute_category_results(store.inner().as_ref(), category_id).await?;
    Ok(result.map(Json))
}

#[get("/results/winners")]
async fn winners(store: &State<SharedStore>) -> Result<Json<Vec<CategoryWinner>>> {
    Ok(Json(engine::compute_winners(store.inner().as_ref()).await?))
}

#[get("/results/final")]
async fn final_winners(store: &State<SharedStore>) -> Result<Json<Vec<FinalWinner>>> {
    Ok(Json(engine::compute_final_winners(store.inner().as_ref()).await?))
}

#[get("/conflicts/ties")]
async fn ties(store: &State<SharedStore>) -> Result<Json<Vec<TieConflict>>> {
    Ok(Json(engine::detect_ties(store.inner().as_ref()).await?))
}

#[get("/conflicts/multi-wins")]
async fn multi_wins(store: &State<SharedStore>) -> Result<Json<Vec<MultiWinConflict>>> {
    Ok(Json(engine::detect_multiple_wins(store.inner().as_ref()).await?))
}
