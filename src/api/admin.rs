use rocket::{serde::json::Json, Route, State};

use crate::{
    engine,
    error::Result,
    model::{api::ManualWinnerRequest, common::CategoryId},
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![set_override, clear_override, open_voting, close_voting]
}

#[put("/categories/<category_id>/override", data = "<request>", format = "json")]
async fn set_override(
    category_id: CategoryId,
    request: Json<ManualWinnerRequest>,
    store: &State<SharedStore>,
) -> Result<()> {
    engine::set_manual_winner(
        store.inner().as_ref(),
        category_id,
        request.car_id,
        &request.reason,
    )
    .await
}

#[delete("/categories/<category_id>/override")]
async fn clear_override(category_id: CategoryId, store: &State<SharedStore>) -> Result<()> {
    engine::clear_manual_winner(store.inner().as_ref(), category_id).await
}

#[post("/voting/open")]
async fn open_voting(store: &State<SharedStore>) -> Result<()> {
    engine::set_voting_open(store.inner().as_ref(), true).await
}

#[post("/voting/close")]
async fn close_voting(store: &State<SharedStore>) -> Result<()> {
    engine::set_voting_open(store.inner().as_ref(), false).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json,
    };

    use super::*;
    use crate::{
        model::{api::VoteRequest, common::CarId},
        store::{examples::*, MemoryStore, RecordStore},
    };

    #[backend_test]
    async fn set_and_clear_override(client: Client, store: Arc<MemoryStore>) {
        let response = put_override(&client, BEST_PAINT, JAGUAR, "  Best in show  ").await;
        assert_eq!(Status::Ok, response.status());

        let category = store.category(BEST_PAINT).await.unwrap().unwrap();
        let manual_winner = category.manual_winner.unwrap();
        assert_eq!(manual_winner.car_id, JAGUAR);
        assert_eq!(manual_winner.reason, "Best in show");

        let response = client
            .delete(uri!(clear_override(BEST_PAINT)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let category = store.category(BEST_PAINT).await.unwrap().unwrap();
        assert_eq!(category.manual_winner, None);

        // Clearing again is harmless.
        let response = client
            .delete(uri!(clear_override(BEST_PAINT)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test]
    async fn bad_overrides_are_rejected(client: Client, store: Arc<MemoryStore>) {
        let response = put_override(&client, BEST_PAINT, JAGUAR, "   ").await;
        assert_eq!(Status::BadRequest, response.status());
        let response = put_override(&client, 99, JAGUAR, "Judges' decision").await;
        assert_eq!(Status::NotFound, response.status());
        let response = put_override(&client, BEST_PAINT, 99, "Judges' decision").await;
        assert_eq!(Status::NotFound, response.status());

        let category = store.category(BEST_PAINT).await.unwrap().unwrap();
        assert_eq!(category.manual_winner, None);
    }

    #[backend_test(closed)]
    async fn open_and_close_voting(client: Client, store: Arc<MemoryStore>) {
        let response = client.post(uri!(open_voting)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(store.settings().await.unwrap().voting_open);

        let vote = VoteRequest::example("ABC", BEST_PAINT, SHELBY);
        let response = client
            .post("/votes")
            .header(ContentType::JSON)
            .body(serde_json::to_string(&vote).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client.post(uri!(close_voting)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(!store.settings().await.unwrap().voting_open);
        // Existing votes survive closing.
        assert_eq!(store.votes().len(), 1);
    }

    async fn put_override<'c>(
        client: &'c Client,
        category_id: CategoryId,
        car_id: CarId,
        reason: &str,
    ) -> LocalResponse<'c> {
        let request = ManualWinnerRequest {
            car_id,
            reason: reason.to_string(),
        };
        client
            .put(uri!(set_override(category_id)))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&request).unwrap())
            .dispatch()
            .await
    }
}
