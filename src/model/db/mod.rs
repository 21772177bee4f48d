//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are stored as the document `_id`.
//! - Datetimes are serialised in MongoDB's own format.

pub mod category;
pub mod entrant;
pub mod group;
pub mod settings;
pub mod vote;
pub mod voter;

pub use category::{Category, ManualWinner};
pub use entrant::Entrant;
pub use group::CategoryGroup;
pub use settings::Settings;
pub use vote::Vote;
pub use voter::{Voter, VoterCore};

/// A new voter ready for DB insertion is just [`Voter`] without an ID.
pub type NewVoter = VoterCore;
