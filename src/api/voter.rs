use log::debug;
use rocket::{serde::json::Json, Route, State};

use crate::{
    engine,
    error::Result,
    logging::RequestId,
    model::api::{VoteOutcome, VoteRequest, VoterSelection},
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![vote, selections]
}

#[post("/votes", data = "<request>", format = "json")]
async fn vote(
    request: Json<VoteRequest>,
    store: &State<SharedStore>,
    id: &RequestId,
) -> Result<Json<VoteOutcome>> {
    debug!(
        "{id} vote for car {} in category {}",
        request.car_id, request.category_id
    );
    let outcome = engine::submit_vote(store.inner().as_ref(), &request).await?;
    if outcome.conflict_cleared {
        debug!("{id} {}", outcome.message);
    }
    Ok(Json(outcome))
}

#[get("/voters/<code>/votes")]
async fn selections(code: &str, store: &State<SharedStore>) -> Result<Json<Vec<VoterSelection>>> {
    let selections = engine::voter_selections(store.inner().as_ref(), code).await?;
    Ok(Json(selections))
}
