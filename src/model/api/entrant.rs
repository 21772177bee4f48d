use serde::{Deserialize, Serialize};

use crate::model::{common::CarId, db::Entrant};

/// The display fields of an entrant, as shown alongside tallies and winners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrantSummary {
    pub car_id: CarId,
    pub number: String,
    pub name: String,
    pub owner: String,
    pub photo_url: Option<String>,
}

impl From<&Entrant> for EntrantSummary {
    fn from(entrant: &Entrant) -> Self {
        Self {
            car_id: entrant.id,
            number: entrant.number.clone(),
            name: entrant.name.clone(),
            owner: entrant.owner.clone(),
            photo_url: entrant.photo_url.clone(),
        }
    }
}

impl From<Entrant> for EntrantSummary {
    fn from(entrant: Entrant) -> Self {
        Self {
            car_id: entrant.id,
            number: entrant.number,
            name: entrant.name,
            owner: entrant.owner,
            photo_url: entrant.photo_url,
        }
    }
}

/// How many votes an entrant received in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    #[serde(flatten)]
    pub entrant: EntrantSummary,
    pub votes: u32,
}
