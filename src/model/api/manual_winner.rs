use serde::{Deserialize, Serialize};

use crate::model::common::CarId;

/// Request body for forcing a category's winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualWinnerRequest {
    pub car_id: CarId,
    pub reason: String,
}
