/// PostgREST raw wire types — serde shapes for the backend's REST rows.
/// These map to our clean domain types via the mapping fns in client.rs.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reference data  (teams, matches)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TeamRow {
    pub id: String,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub team_group: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct MatchRow {
    pub id: String,
    pub phase: Option<String>, // "GROUP" | "SEMI" | "FINAL"
    pub team_group: Option<String>,
    pub round: Option<u8>,
    /// Embedded via `teamA:team_a_id(*)` in the select clause.
    #[serde(rename = "teamA")]
    pub team_a: Option<TeamRow>,
    #[serde(rename = "teamB")]
    pub team_b: Option<TeamRow>,
    pub winner_id: Option<String>,
    pub status: Option<String>, // "SCHEDULED" | "LIVE" | "FINISHED"
    pub start_time: Option<String>, // "HH:MM"
    pub score_a: Option<u16>,
    pub score_b: Option<u16>,
    pub stream_url: Option<String>,
}

/// Insert shape for admin-generated bracket rows.
#[derive(Debug, Serialize, Clone)]
pub struct NewMatchRow {
    pub phase: String,
    pub status: String,
    pub start_time: String,
    pub team_a_id: Option<String>,
    pub team_b_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u8>,
}

// ---------------------------------------------------------------------------
// Tickets and bets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TicketRow {
    pub id: String,
    pub cpf: Option<String>,
    pub status: Option<String>, // "PENDING" | "ACTIVE" | "REFUNDED"
    pub total_price: Option<f64>,
    pub payment_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded via `bets(match_id,selected_team_id)` in the select clause.
    pub bets: Option<Vec<BetRow>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewTicketRow {
    pub cpf: String,
    pub status: String,
    pub total_price: f64,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct BetRow {
    pub match_id: Option<String>,
    pub selected_team_id: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewBetRow {
    pub ticket_id: String,
    pub match_id: String,
    pub selected_team_id: String,
}

// ---------------------------------------------------------------------------
// Settings  (key/value flags)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SettingRow {
    pub key: String,
    pub value: Option<serde_json::Value>,
}
