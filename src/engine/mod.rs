//! The voting engine: vote submission with exclusivity resolution, result
//! tabulation, conflict detection and manual overrides.
//!
//! Every operation is a stateless unit of work against a [`RecordStore`].
//!
//! [`RecordStore`]: crate::store::RecordStore

pub mod multi_win;
pub mod overrides;
pub mod results;
pub mod submission;
pub mod ties;
pub mod window;

pub use multi_win::detect_multiple_wins;
pub use overrides::{clear_manual_winner, set_manual_winner};
pub use results::{
    compute_category_results, compute_final_winners, compute_results, compute_winners,
};
pub use submission::{submit_vote, voter_selections};
pub use ties::{detect_ties, find_ties};
pub use window::set_voting_open;
