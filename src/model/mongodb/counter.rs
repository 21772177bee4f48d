use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::Coll;

/// ID of the counter that allocates voter IDs.
pub const VOTER_ID_COUNTER_ID: &str = "voter_id";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    /// The most recently allocated value.
    pub last: u32,
}

impl Counter {
    /// Atomically allocate the next value of the counter with the given ID,
    /// creating the counter if it does not exist yet. The first value is 1.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "last": 1 }
        };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?;
        // An upsert returning the updated document always yields one.
        Ok(counter.map_or(1, |counter| counter.last))
    }
}
