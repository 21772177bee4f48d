use log::info;

use crate::{error::Result, store::RecordStore};

/// Open or close the voting window.
pub async fn set_voting_open(store: &dyn RecordStore, open: bool) -> Result<()> {
    store.set_voting_open(open).await?;
    info!("Voting {}", if open { "opened" } else { "closed" });
    Ok(())
}
