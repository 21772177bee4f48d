use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::common::{CarId, VoterId};

/// Core voter data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterCore {
    /// Unique registration code, printed on the voter's card.
    pub code: String,
    /// The car this voter entered, if they are also an entrant.
    pub car_id: Option<CarId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Free-form type, matched against category voter-type restrictions.
    pub voter_type: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl VoterCore {
    /// A bare voter created on first vote under open registration.
    pub fn new(code: String) -> Self {
        Self {
            code,
            car_id: None,
            name: String::new(),
            email: String::new(),
            voter_type: None,
            notes: String::new(),
        }
    }
}

/// A voter from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: VoterId,
    #[serde(flatten)]
    pub voter: VoterCore,
}

impl Deref for Voter {
    type Target = VoterCore;

    fn deref(&self) -> &Self::Target {
        &self.voter
    }
}

impl DerefMut for Voter {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.voter
    }
}
