pub mod bracket;
pub mod scoring;
pub mod standings;

use bolao_store::MatchRef;
use std::collections::HashMap;
use std::fmt;

/// A bettor's selections, keyed by the match (or placeholder slot) they
/// apply to. Values are team ids.
pub type Picks = HashMap<MatchRef, String>;

/// Contract violations in reference data or bet input. Incomplete data
/// (missing picks, unresolved slots) is never an error — only these are.
#[derive(Debug, PartialEq, Eq)]
pub enum EngineError {
    /// A standings computation was asked for a group with no teams.
    EmptyGroup(String),
    /// A bet selects a team that is not in the referenced match.
    ForeignTeam { match_id: String, team_id: String },
    /// A ticket was assembled without a pick for every required match.
    IncompleteTicket { missing: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyGroup(group) => write!(f, "group {group} has no teams"),
            EngineError::ForeignTeam { match_id, team_id } => {
                write!(f, "team {team_id} does not play in match {match_id}")
            }
            EngineError::IncompleteTicket { missing } => {
                write!(f, "ticket is missing {missing} pick(s)")
            }
        }
    }
}

impl std::error::Error for EngineError {}
