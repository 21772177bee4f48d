use serde::{Deserialize, Serialize};

use crate::model::common::{CarId, CategoryId, VoterId};

/// A single vote. At most one exists per (voter, category) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: VoterId,
    pub category_id: CategoryId,
    pub car_id: CarId,
}
