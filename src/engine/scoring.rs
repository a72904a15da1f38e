use crate::engine::{EngineError, Picks};
use bolao_store::{Bet, Match, MatchRef, Phase, Slot, Ticket, TicketStatus};
use std::collections::HashMap;

/// A ticket's score against the authoritative match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketScore {
    pub hits: u32,
    pub max: u32,
}

/// Leaderboard row: one bettor's best ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub cpf: String,
    pub ticket_id: String,
    pub hits: u32,
    pub max: u32,
}

/// How ties on hit count are broken in the leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The earlier ticket wins.
    #[default]
    EarliestSubmission,
    /// Alphabetical by CPF, for a stable ordering without timestamps.
    BettorId,
}

/// Whether a round of picks can be submitted: there must be matches, and
/// every one of them must carry a pick.
pub fn can_advance(round_matches: &[Match], picks: &Picks) -> bool {
    !round_matches.is_empty()
        && round_matches
            .iter()
            .all(|m| picks.contains_key(&MatchRef::Concrete(m.id.clone())))
}

/// The selection must be one of the match's two teams.
pub fn validate_bet(bet: &Bet, m: &Match) -> Result<(), EngineError> {
    if m.involves(&bet.selected_team_id) {
        Ok(())
    } else {
        Err(EngineError::ForeignTeam {
            match_id: m.id.clone(),
            team_id: bet.selected_team_id.clone(),
        })
    }
}

/// Real SEMI rows in bracket order: kick-off time first, id as the tie key.
fn semi_rows(matches: &[Match]) -> Vec<&Match> {
    let mut semis: Vec<&Match> = matches.iter().filter(|m| m.phase == Phase::Semi).collect();
    semis.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    semis
}

/// Re-express placeholder slot references against real SEMI/FINAL rows once
/// the admin has generated them. The first semi row (by kick-off) is slot 1,
/// the second slot 2. Slots with no real row yet stay pending.
pub fn reconcile_bets(bets: &[Bet], matches: &[Match]) -> Vec<Bet> {
    let semis = semi_rows(matches);
    let final_row = matches.iter().find(|m| m.phase == Phase::Final);

    bets.iter()
        .map(|bet| {
            let real_id = match &bet.match_id {
                MatchRef::Pending(Slot::Semi1) => semis.first().map(|m| m.id.clone()),
                MatchRef::Pending(Slot::Semi2) => semis.get(1).map(|m| m.id.clone()),
                MatchRef::Pending(Slot::Final) => final_row.map(|m| m.id.clone()),
                MatchRef::Concrete(_) => None,
            };
            match real_id {
                Some(id) => Bet {
                    match_id: MatchRef::Concrete(id),
                    selected_team_id: bet.selected_team_id.clone(),
                },
                None => bet.clone(),
            }
        })
        .collect()
}

/// Hits = bets whose match has a winner equal to the selection. `max` is the
/// full match list, so it grows as the admin generates bracket rows.
pub fn score_ticket(bets: &[Bet], matches: &[Match]) -> TicketScore {
    let by_id: HashMap<&str, &Match> = matches.iter().map(|m| (m.id.as_str(), m)).collect();
    let hits = bets
        .iter()
        .filter(|bet| {
            let MatchRef::Concrete(id) = &bet.match_id else {
                return false;
            };
            by_id
                .get(id.as_str())
                .and_then(|m| m.winner_id.as_deref())
                .is_some_and(|w| w == bet.selected_team_id)
        })
        .count() as u32;
    TicketScore {
        hits,
        max: matches.len() as u32,
    }
}

/// Rank ACTIVE tickets, keeping each bettor's best one. Ties on hits fall to
/// the chosen tie-break.
pub fn leaderboard(tickets: &[Ticket], matches: &[Match], tie_break: TieBreak) -> Vec<RankEntry> {
    let mut best: HashMap<&str, (&Ticket, TicketScore)> = HashMap::new();
    for ticket in tickets {
        if ticket.status != TicketStatus::Active {
            continue;
        }
        let bets = reconcile_bets(&ticket.bets, matches);
        let score = score_ticket(&bets, matches);
        // A bettor's best ticket: more hits wins, equal hits goes to the
        // earlier submission.
        let replaces = match best.get(ticket.cpf.as_str()) {
            Some((held, held_score)) => {
                score.hits > held_score.hits
                    || (score.hits == held_score.hits && ticket.created_at < held.created_at)
            }
            None => true,
        };
        if replaces {
            best.insert(ticket.cpf.as_str(), (ticket, score));
        }
    }

    let mut entries: Vec<(&Ticket, TicketScore)> = best.into_values().collect();
    entries.sort_by(|(ta, sa), (tb, sb)| {
        sb.hits.cmp(&sa.hits).then_with(|| match tie_break {
            TieBreak::EarliestSubmission => ta.created_at.cmp(&tb.created_at),
            TieBreak::BettorId => ta.cpf.cmp(&tb.cpf),
        })
    });
    entries
        .into_iter()
        .map(|(t, s)| RankEntry {
            cpf: t.cpf.clone(),
            ticket_id: t.id.clone(),
            hits: s.hits,
            max: s.max,
        })
        .collect()
}
