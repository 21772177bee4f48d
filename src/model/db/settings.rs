use serde::{Deserialize, Serialize};

/// Global competition settings. There is exactly one of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the voting window is open.
    pub voting_open: bool,
    /// If set, only pre-registered voter codes may vote.
    pub require_registration: bool,
}
