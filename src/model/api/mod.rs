//! API-friendly request and response types.

pub mod conflicts;
pub mod entrant;
pub mod manual_winner;
pub mod results;
pub mod vote;

pub use conflicts::{MultiWinConflict, TieConflict, WonCategory};
pub use entrant::{EntrantSummary, Tally};
pub use manual_winner::ManualWinnerRequest;
pub use results::{
    CategoryResult, CategoryWinner, CompetitionResults, FinalWinner, RankedEntrant, VotingStats,
    WinningEntrant,
};
pub use vote::{VoteOutcome, VoteRequest, VoterSelection};
