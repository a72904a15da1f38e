use crate::postgrest::{
    BetRow, MatchRow, NewBetRow, NewMatchRow, NewTicketRow, SettingRow, TeamRow, TicketRow,
};
use crate::{Bet, Match, MatchStatus, NewTicket, Phase, Team, Ticket, TicketStatus};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Select clause embedding both team rows into each match row.
const MATCH_SELECT: &str = "*,teamA:team_a_id(*),teamB:team_b_id(*)";
/// Select clause embedding the bet rows into each ticket row.
const TICKET_SELECT: &str = "*,bets(match_id,selected_team_id)";

#[derive(Debug)]
pub enum StoreError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            StoreError::Api(e, url) => write!(f, "Store error for {url}: {e}"),
            StoreError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            StoreError::NotFound(msg) => write!(f, "Not found: {msg}"),
            StoreError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Pool backend client speaking PostgREST conventions (the hosted backend is
/// Supabase, but nothing here depends on more than its REST dialect).
#[derive(Debug, Clone)]
pub struct PoolStore {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl PoolStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("bolao/0.1 (pool engine)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(10),
        }
    }

    // -- reference data -----------------------------------------------------

    pub async fn teams(&self) -> StoreResult<Vec<Team>> {
        let url = format!("{}/teams?select=*&order=name.asc", self.base_url);
        let rows: Vec<TeamRow> = self.get(&url).await?;
        Ok(rows.into_iter().map(map_team).collect())
    }

    /// All matches with embedded team rows, in creation order so group rounds
    /// come before generated bracket rows.
    pub async fn matches(&self) -> StoreResult<Vec<Match>> {
        let url = format!(
            "{}/matches?select={MATCH_SELECT}&order=created_at.asc",
            self.base_url
        );
        let rows: Vec<MatchRow> = self.get(&url).await?;
        Ok(rows.into_iter().map(map_match).collect())
    }

    // -- tickets ------------------------------------------------------------

    /// Insert a ticket row, then its bet rows. Returns the stored ticket with
    /// the backend-assigned id.
    pub async fn save_ticket(&self, new_ticket: &NewTicket, bets: &[Bet]) -> StoreResult<Ticket> {
        let url = format!("{}/tickets", self.base_url);
        let row = NewTicketRow {
            cpf: new_ticket.cpf.clone(),
            status: new_ticket.status.as_str().to_owned(),
            total_price: new_ticket.total_price,
        };
        let mut inserted: Vec<TicketRow> = self.post_returning(&url, &[row]).await?;
        let ticket_row = inserted
            .pop()
            .ok_or_else(|| StoreError::Other("ticket insert returned no row".into()))?;

        let bet_rows: Vec<NewBetRow> = bets
            .iter()
            .map(|b| NewBetRow {
                ticket_id: ticket_row.id.clone(),
                match_id: b.match_id.wire_id().to_owned(),
                selected_team_id: b.selected_team_id.clone(),
            })
            .collect();
        let bets_url = format!("{}/bets", self.base_url);
        self.post(&bets_url, &bet_rows).await?;

        let mut ticket = map_ticket(ticket_row);
        ticket.bets = bets.to_vec();
        Ok(ticket)
    }

    pub async fn get_ticket_by_id(&self, id: &str) -> StoreResult<Option<Ticket>> {
        let url = format!(
            "{}/tickets?id=eq.{id}&select={TICKET_SELECT}",
            self.base_url
        );
        let rows: Vec<TicketRow> = self.get(&url).await?;
        Ok(rows.into_iter().next().map(map_ticket))
    }

    /// Delete-then-insert of a ticket's bets, used when placeholder picks are
    /// re-expressed against real match ids.
    pub async fn replace_ticket_bets(&self, ticket_id: &str, bets: &[Bet]) -> StoreResult<()> {
        let del_url = format!("{}/bets?ticket_id=eq.{ticket_id}", self.base_url);
        self.delete(&del_url).await?;

        let rows: Vec<NewBetRow> = bets
            .iter()
            .map(|b| NewBetRow {
                ticket_id: ticket_id.to_owned(),
                match_id: b.match_id.wire_id().to_owned(),
                selected_team_id: b.selected_team_id.clone(),
            })
            .collect();
        let url = format!("{}/bets", self.base_url);
        self.post(&url, &rows).await
    }

    pub async fn set_ticket_status(&self, id: &str, status: &TicketStatus) -> StoreResult<()> {
        let url = format!("{}/tickets?id=eq.{id}", self.base_url);
        self.patch(&url, &serde_json::json!({ "status": status.as_str() }))
            .await
    }

    pub async fn set_payment_ref(&self, id: &str, payment_id: &str) -> StoreResult<()> {
        let url = format!("{}/tickets?id=eq.{id}", self.base_url);
        self.patch(&url, &serde_json::json!({ "payment_id": payment_id }))
            .await
    }

    /// The ticket carrying a given payment reference, if any.
    pub async fn ticket_by_payment_ref(&self, payment_id: &str) -> StoreResult<Option<Ticket>> {
        let url = format!(
            "{}/tickets?payment_id=eq.{payment_id}&select={TICKET_SELECT}",
            self.base_url
        );
        let rows: Vec<TicketRow> = self.get(&url).await?;
        Ok(rows.into_iter().next().map(map_ticket))
    }

    pub async fn active_ticket_for(&self, cpf: &str) -> StoreResult<Option<Ticket>> {
        let url = format!(
            "{}/tickets?cpf=eq.{cpf}&status=eq.ACTIVE&select={TICKET_SELECT}",
            self.base_url
        );
        let rows: Vec<TicketRow> = self.get(&url).await?;
        Ok(rows.into_iter().next().map(map_ticket))
    }

    /// All ACTIVE tickets with their bets — the leaderboard input.
    pub async fn active_tickets(&self) -> StoreResult<Vec<Ticket>> {
        let url = format!(
            "{}/tickets?status=eq.ACTIVE&select={TICKET_SELECT}&order=created_at.asc",
            self.base_url
        );
        let rows: Vec<TicketRow> = self.get(&url).await?;
        Ok(rows.into_iter().map(map_ticket).collect())
    }

    // -- admin --------------------------------------------------------------

    pub async fn insert_matches(&self, rows: &[NewMatchRow]) -> StoreResult<Vec<Match>> {
        let url = format!("{}/matches", self.base_url);
        let inserted: Vec<MatchRow> = self.post_returning(&url, rows).await?;
        Ok(inserted.into_iter().map(map_match).collect())
    }

    pub async fn set_match_status(
        &self,
        id: &str,
        status: MatchStatus,
        winner_id: Option<&str>,
    ) -> StoreResult<()> {
        let url = format!("{}/matches?id=eq.{id}", self.base_url);
        self.patch(
            &url,
            &serde_json::json!({ "status": status.as_str(), "winner_id": winner_id }),
        )
        .await
    }

    pub async fn set_score(&self, id: &str, score_a: u16, score_b: u16) -> StoreResult<()> {
        let url = format!("{}/matches?id=eq.{id}", self.base_url);
        self.patch(
            &url,
            &serde_json::json!({ "score_a": score_a, "score_b": score_b }),
        )
        .await
    }

    // -- settings -----------------------------------------------------------

    /// The checkout lock flag. A missing row reads as unlocked.
    pub async fn guesses_locked(&self) -> StoreResult<bool> {
        let url = format!("{}/settings?key=eq.guesses_locked&select=*", self.base_url);
        let rows: Vec<SettingRow> = self.get(&url).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|r| r.value)
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    // -- http plumbing ------------------------------------------------------

    async fn get<T: Default + serde::de::DeserializeOwned>(&self, url: &str) -> StoreResult<T> {
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?;

        match response.error_for_status() {
            Ok(res) => res
                .json::<T>()
                .await
                .map_err(|e| StoreError::Parsing(e, url.to_owned())),
            Err(e) => {
                // A 4xx on a read means "nothing there" for our queries.
                if e.status().map(|s| s.is_client_error()).unwrap_or(false) {
                    Ok(T::default())
                } else {
                    Err(StoreError::Api(e, url.to_owned()))
                }
            }
        }
    }

    async fn post<B: serde::Serialize + ?Sized>(&self, url: &str, body: &B) -> StoreResult<()> {
        self.client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.to_owned()))?;
        Ok(())
    }

    async fn post_returning<B, T>(&self, url: &str, body: &B) -> StoreResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.to_owned()))?;
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Parsing(e, url.to_owned()))
    }

    async fn patch(&self, url: &str, body: &serde_json::Value) -> StoreResult<()> {
        self.client
            .patch(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.to_owned()))?;
        Ok(())
    }

    async fn delete(&self, url: &str) -> StoreResult<()> {
        self.client
            .delete(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| StoreError::Network(e, url.to_owned()))?
            .error_for_status()
            .map_err(|e| StoreError::Api(e, url.to_owned()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mapping: PostgREST wire rows → clean domain types
// ---------------------------------------------------------------------------

fn map_team(row: TeamRow) -> Team {
    Team {
        id: row.id,
        name: row.name.unwrap_or_default(),
        logo_url: row.logo_url,
        group: row.team_group,
    }
}

fn map_match(row: MatchRow) -> Match {
    Match {
        id: row.id,
        phase: Phase::parse(row.phase.as_deref().unwrap_or_default()),
        group: row.team_group,
        round: row.round,
        team_a: row.team_a.map(map_team),
        team_b: row.team_b.map(map_team),
        winner_id: row.winner_id,
        status: MatchStatus::parse(row.status.as_deref().unwrap_or_default()),
        start_time: row.start_time.unwrap_or_default(),
        score_a: row.score_a,
        score_b: row.score_b,
        stream_url: row.stream_url,
    }
}

fn map_bet(row: BetRow) -> Option<Bet> {
    let match_id = row.match_id?.parse().ok()?;
    Some(Bet {
        match_id,
        selected_team_id: row.selected_team_id?,
    })
}

fn map_ticket(row: TicketRow) -> Ticket {
    Ticket {
        id: row.id,
        cpf: row.cpf.unwrap_or_default(),
        status: TicketStatus::parse(row.status.as_deref().unwrap_or_default()),
        bets: row
            .bets
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_bet)
            .collect(),
        total_price: row.total_price.unwrap_or_default(),
        payment_id: row.payment_id,
        created_at: row.created_at.unwrap_or_default(),
    }
}
