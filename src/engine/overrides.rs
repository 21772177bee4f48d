use chrono::Utc;
use log::info;

use crate::{
    error::{Error, Result},
    model::common::{CarId, CategoryId},
    store::RecordStore,
};

/// Force a category's winner, regardless of how the votes fall.
///
/// The entrant need not be eligible or have received votes in the category.
pub async fn set_manual_winner(
    store: &dyn RecordStore,
    category_id: CategoryId,
    car_id: CarId,
    reason: &str,
) -> Result<()> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::Validation(
            "A reason is required to override a winner".to_string(),
        ));
    }
    if store.category(category_id).await?.is_none() {
        return Err(Error::CategoryNotFound(category_id));
    }
    if store.entrant(car_id).await?.is_none() {
        return Err(Error::EntrantNotFound(car_id));
    }

    // The category may have been removed since the check above.
    if !store
        .set_manual_winner(category_id, car_id, reason, Utc::now())
        .await?
    {
        return Err(Error::CategoryNotFound(category_id));
    }
    info!("Category {category_id} manually awarded to car {car_id}: {reason}");
    Ok(())
}

/// Remove a category's manual winner. Idempotent.
pub async fn clear_manual_winner(store: &dyn RecordStore, category_id: CategoryId) -> Result<()> {
    store.clear_manual_winner(category_id).await?;
    info!("Cleared manual winner of category {category_id}");
    Ok(())
}
