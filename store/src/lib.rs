pub mod client;
pub mod postgrest;

pub use client::{PoolStore, StoreError, StoreResult};

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the PostgREST wire format
// ---------------------------------------------------------------------------

/// Reference data for one competing team. `group` is the group label
/// ("A" or "B") assigned by the admin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Group,
    Semi,
    Final,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Group => "GROUP",
            Phase::Semi => "SEMI",
            Phase::Final => "FINAL",
        }
    }

    pub fn parse(s: &str) -> Phase {
        match s {
            "SEMI" => Phase::Semi,
            "FINAL" => Phase::Final,
            _ => Phase::Group,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::Live => "LIVE",
            MatchStatus::Finished => "FINISHED",
        }
    }

    pub fn parse(s: &str) -> MatchStatus {
        match s {
            "LIVE" => MatchStatus::Live,
            "FINISHED" => MatchStatus::Finished,
            _ => MatchStatus::Scheduled,
        }
    }
}

/// Authoritative record of one match. Team slots are `None` for bracket rows
/// whose participants are not known yet.
#[derive(Debug, Clone, Default)]
pub struct Match {
    pub id: String,
    pub phase: Phase,
    pub group: Option<String>, // GROUP phase only
    pub round: Option<u8>,     // 1..=3, GROUP phase only
    pub team_a: Option<Team>,
    pub team_b: Option<Team>,
    /// Set once the result is known. Always references one of the two slots.
    pub winner_id: Option<String>,
    pub status: MatchStatus,
    /// Kick-off as stored by the backend: a plain "HH:MM" string.
    pub start_time: String,
    pub score_a: Option<u16>,
    pub score_b: Option<u16>,
    pub stream_url: Option<String>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    /// The winning team, when `winner_id` matches one of the two slots.
    /// A winner id referencing neither slot yields `None` rather than guessing.
    pub fn winner(&self) -> Option<&Team> {
        let winner_id = self.winner_id.as_deref()?;
        if self.team_a.as_ref().map(|t| t.id.as_str()) == Some(winner_id) {
            self.team_a.as_ref()
        } else if self.team_b.as_ref().map(|t| t.id.as_str()) == Some(winner_id) {
            self.team_b.as_ref()
        } else {
            None
        }
    }

    /// Whether the given team occupies one of this match's two slots.
    pub fn involves(&self, team_id: &str) -> bool {
        self.team_a.as_ref().map(|t| t.id.as_str()) == Some(team_id)
            || self.team_b.as_ref().map(|t| t.id.as_str()) == Some(team_id)
    }
}

// ---------------------------------------------------------------------------
// Match references — concrete rows vs pre-bracket placeholders
// ---------------------------------------------------------------------------

/// Bracket slot whose real match row does not exist at pick time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Semi1,
    Semi2,
    Final,
}

impl Slot {
    /// Stable wire identifier used in persisted bet rows before the real
    /// SEMI/FINAL rows are generated.
    pub fn wire_id(&self) -> &'static str {
        match self {
            Slot::Semi1 => "derived_s1",
            Slot::Semi2 => "derived_s2",
            Slot::Final => "derived_f1",
        }
    }
}

/// Reference to the match a bet is placed on. Placeholders get their own
/// variant so a pending ref can never accidentally be looked up as a row id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchRef {
    /// A persisted match row id.
    Concrete(String),
    /// A bracket slot to be resolved against real rows once they exist.
    Pending(Slot),
}

impl MatchRef {
    /// The id this reference serializes to in a bet row.
    pub fn wire_id(&self) -> &str {
        match self {
            MatchRef::Concrete(id) => id,
            MatchRef::Pending(slot) => slot.wire_id(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MatchRef::Pending(_))
    }
}

impl FromStr for MatchRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "derived_s1" => MatchRef::Pending(Slot::Semi1),
            "derived_s2" => MatchRef::Pending(Slot::Semi2),
            "derived_f1" => MatchRef::Pending(Slot::Final),
            id => MatchRef::Concrete(id.to_owned()),
        })
    }
}

impl fmt::Display for MatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_id())
    }
}

/// One pick on a ticket: which team wins the referenced match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bet {
    pub match_id: MatchRef,
    pub selected_team_id: String,
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TicketStatus {
    /// Created at checkout, not yet paid.
    #[default]
    Pending,
    /// Payment confirmed by the provider callback.
    Active,
    /// Payment returned to the bettor by an admin.
    Refunded,
    /// Unrecognised wire value, preserved verbatim. Such tickets are
    /// treated as not scoreable rather than rejected.
    Other(String),
}

impl TicketStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Pending => "PENDING",
            TicketStatus::Active => "ACTIVE",
            TicketStatus::Refunded => "REFUNDED",
            TicketStatus::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> TicketStatus {
        match s {
            "PENDING" => TicketStatus::Pending,
            "ACTIVE" => TicketStatus::Active,
            "REFUNDED" => TicketStatus::Refunded,
            other => TicketStatus::Other(other.to_owned()),
        }
    }
}

/// A persisted set of picks for one bettor, identified by CPF.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: String,
    pub cpf: String,
    pub status: TicketStatus,
    pub bets: Vec<Bet>,
    pub total_price: f64,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a new ticket — the backend assigns id and created_at.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub cpf: String,
    pub status: TicketStatus,
    pub total_price: f64,
}
