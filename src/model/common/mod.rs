//! Types shared between the DB, API and engine layers.

/// Entrant IDs are integers. Zero is never assigned; a vote for car zero
/// is a deselection.
pub type CarId = u32;
/// Category IDs are integers.
pub type CategoryId = u32;
/// Category group IDs are integers.
pub type GroupId = u32;
/// Voter IDs are integers, allocated from an auto-increment counter.
pub type VoterId = u32;
/// Exclusivity pool IDs are integers shared between category groups.
pub type PoolId = u32;

/// The car ID that means "remove my vote in this category".
pub const NO_CAR: CarId = 0;
