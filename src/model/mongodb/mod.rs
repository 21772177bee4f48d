mod collection;
mod counter;
mod errors;

pub use collection::{ensure_indexes_exist, Coll, MongoCollection, ENTRANTS};
pub use counter::{Counter, VOTER_ID_COUNTER_ID};
pub use errors::is_duplicate_key_error;
