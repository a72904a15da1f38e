use crate::engine::bracket::{derive_final, derive_semifinals};
use crate::engine::scoring::can_advance;
use crate::engine::standings::simulated_standings;
use crate::engine::{EngineError, Picks};
use bolao_store::{Bet, Match, MatchRef, Phase, Slot, Team};

/// Steps of the pick wizard, in play order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowStep {
    #[default]
    Group1,
    Group2,
    Group3,
    Semis,
    Final,
    Complete,
}

impl FlowStep {
    /// Group round number this step covers, when it is a group step.
    fn round(&self) -> Option<u8> {
        match self {
            FlowStep::Group1 => Some(1),
            FlowStep::Group2 => Some(2),
            FlowStep::Group3 => Some(3),
            _ => None,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            FlowStep::Group1 => Some(FlowStep::Group2),
            FlowStep::Group2 => Some(FlowStep::Group3),
            FlowStep::Group3 => Some(FlowStep::Semis),
            FlowStep::Semis => Some(FlowStep::Final),
            FlowStep::Final => Some(FlowStep::Complete),
            FlowStep::Complete => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            FlowStep::Group1 => None,
            FlowStep::Group2 => Some(FlowStep::Group1),
            FlowStep::Group3 => Some(FlowStep::Group2),
            FlowStep::Semis => Some(FlowStep::Group3),
            FlowStep::Final => Some(FlowStep::Semis),
            FlowStep::Complete => Some(FlowStep::Final),
        }
    }
}

/// One bettor's in-progress picks. Purely session-local: nothing here is
/// persisted until the full ticket is assembled with [`PickSession::into_bets`].
#[derive(Debug, Default, Clone)]
pub struct PickSession {
    pub step: FlowStep,
    picks: Picks,
}

impl PickSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a session from a saved ticket's bets, landing on the first
    /// step that still needs input.
    pub fn from_bets(bets: &[Bet], matches: &[Match]) -> Self {
        let picks: Picks = bets
            .iter()
            .map(|b| (b.match_id.clone(), b.selected_team_id.clone()))
            .collect();
        let mut session = Self {
            step: FlowStep::Group1,
            picks,
        };
        while session.step != FlowStep::Complete && session.can_advance(matches) {
            if let Some(next) = session.step.next() {
                session.step = next;
            }
        }
        session
    }

    pub fn picks(&self) -> &Picks {
        &self.picks
    }

    pub fn pick_for(&self, match_ref: &MatchRef) -> Option<&str> {
        self.picks.get(match_ref).map(String::as_str)
    }

    /// Record a pick. Changing a group pick can reshuffle the simulated
    /// standings, so the three derived picks are dropped; changing a semi
    /// pick drops the final pick.
    pub fn select(&mut self, match_ref: MatchRef, team_id: impl Into<String>) {
        match &match_ref {
            MatchRef::Concrete(_) => {
                self.picks.remove(&MatchRef::Pending(Slot::Semi1));
                self.picks.remove(&MatchRef::Pending(Slot::Semi2));
                self.picks.remove(&MatchRef::Pending(Slot::Final));
            }
            MatchRef::Pending(Slot::Semi1 | Slot::Semi2) => {
                self.picks.remove(&MatchRef::Pending(Slot::Final));
            }
            MatchRef::Pending(Slot::Final) => {}
        }
        self.picks.insert(match_ref, team_id.into());
    }

    /// Matches shown on the current step. Group steps list that round's
    /// matches; Semis and Final derive placeholder pairings from the picks
    /// made so far.
    pub fn step_matches(&self, teams: &[Team], matches: &[Match]) -> Vec<Match> {
        match self.step {
            FlowStep::Group1 | FlowStep::Group2 | FlowStep::Group3 => {
                round_matches(matches, self.step.round())
                    .into_iter()
                    .cloned()
                    .collect()
            }
            FlowStep::Semis => self.derived_semis(teams, matches).into(),
            FlowStep::Final => {
                let [s1, s2] = self.derived_semis(teams, matches);
                vec![derive_final(&s1, &s2, &self.picks)]
            }
            FlowStep::Complete => Vec::new(),
        }
    }

    fn derived_semis(&self, teams: &[Team], matches: &[Match]) -> [Match; 2] {
        let standings_a =
            simulated_standings("A", teams, matches, &self.picks).unwrap_or_default();
        let standings_b =
            simulated_standings("B", teams, matches, &self.picks).unwrap_or_default();
        derive_semifinals(&standings_a, &standings_b)
    }

    pub fn can_advance(&self, matches: &[Match]) -> bool {
        match self.step {
            FlowStep::Group1 | FlowStep::Group2 | FlowStep::Group3 => {
                let round: Vec<Match> = round_matches(matches, self.step.round())
                    .into_iter()
                    .cloned()
                    .collect();
                can_advance(&round, &self.picks)
            }
            FlowStep::Semis => {
                self.picks.contains_key(&MatchRef::Pending(Slot::Semi1))
                    && self.picks.contains_key(&MatchRef::Pending(Slot::Semi2))
            }
            FlowStep::Final => self.picks.contains_key(&MatchRef::Pending(Slot::Final)),
            FlowStep::Complete => false,
        }
    }

    /// Move to the next step when the current one is fully picked.
    pub fn advance(&mut self, matches: &[Match]) -> bool {
        if !self.can_advance(matches) {
            return false;
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        match self.step.prev() {
            Some(prev) => {
                self.step = prev;
                true
            }
            None => false,
        }
    }

    /// Assemble the full bet list: one bet per group match plus the three
    /// placeholder slots. Partial sessions are rejected, never persisted.
    pub fn into_bets(self, group_matches: &[Match]) -> Result<Vec<Bet>, EngineError> {
        let mut bets = Vec::with_capacity(group_matches.len() + 3);
        let mut missing = 0usize;

        for m in group_matches.iter().filter(|m| m.phase == Phase::Group) {
            let key = MatchRef::Concrete(m.id.clone());
            match self.picks.get(&key) {
                Some(team_id) => bets.push(Bet {
                    match_id: key,
                    selected_team_id: team_id.clone(),
                }),
                None => missing += 1,
            }
        }
        for slot in [Slot::Semi1, Slot::Semi2, Slot::Final] {
            let key = MatchRef::Pending(slot);
            match self.picks.get(&key) {
                Some(team_id) => bets.push(Bet {
                    match_id: key,
                    selected_team_id: team_id.clone(),
                }),
                None => missing += 1,
            }
        }

        if missing > 0 {
            return Err(EngineError::IncompleteTicket { missing });
        }
        Ok(bets)
    }
}

fn round_matches(matches: &[Match], round: Option<u8>) -> Vec<&Match> {
    matches
        .iter()
        .filter(|m| m.phase == Phase::Group && m.round == round)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, group: &str) -> Team {
        Team {
            id: id.into(),
            name: id.to_uppercase(),
            logo_url: None,
            group: Some(group.into()),
        }
    }

    fn group_match(id: &str, group: &str, round: u8, a: &str, b: &str) -> Match {
        Match {
            id: id.into(),
            phase: Phase::Group,
            group: Some(group.into()),
            round: Some(round),
            team_a: Some(team(a, group)),
            team_b: Some(team(b, group)),
            ..Default::default()
        }
    }

    /// Two groups of two teams, one match per round per group.
    fn fixture() -> (Vec<Team>, Vec<Match>) {
        let teams = vec![
            team("a1", "A"),
            team("a2", "A"),
            team("b1", "B"),
            team("b2", "B"),
        ];
        let matches = vec![
            group_match("g1a", "A", 1, "a1", "a2"),
            group_match("g1b", "B", 1, "b1", "b2"),
            group_match("g2a", "A", 2, "a1", "a2"),
            group_match("g2b", "B", 2, "b1", "b2"),
            group_match("g3a", "A", 3, "a1", "a2"),
            group_match("g3b", "B", 3, "b1", "b2"),
        ];
        (teams, matches)
    }

    fn pick_round(session: &mut PickSession, matches: &[Match], round: u8) {
        let ids: Vec<String> = matches
            .iter()
            .filter(|m| m.round == Some(round))
            .map(|m| m.id.clone())
            .collect();
        for id in ids {
            let winner = matches
                .iter()
                .find(|m| m.id == id)
                .and_then(|m| m.team_a.as_ref())
                .map(|t| t.id.clone())
                .unwrap_or_default();
            session.select(MatchRef::Concrete(id), winner);
        }
    }

    #[test]
    fn advance_is_gated_on_a_full_round() {
        let (_, matches) = fixture();
        let mut session = PickSession::new();
        session.select(MatchRef::Concrete("g1a".into()), "a1");
        assert!(!session.advance(&matches));
        assert_eq!(session.step, FlowStep::Group1);

        session.select(MatchRef::Concrete("g1b".into()), "b1");
        assert!(session.advance(&matches));
        assert_eq!(session.step, FlowStep::Group2);
    }

    #[test]
    fn full_walk_reaches_complete_and_yields_nine_bets() {
        let (_, matches) = fixture();
        let mut session = PickSession::new();
        for round in 1..=3 {
            pick_round(&mut session, &matches, round);
            assert!(session.advance(&matches));
        }
        assert_eq!(session.step, FlowStep::Semis);
        session.select(MatchRef::Pending(Slot::Semi1), "a1");
        session.select(MatchRef::Pending(Slot::Semi2), "b1");
        assert!(session.advance(&matches));
        session.select(MatchRef::Pending(Slot::Final), "a1");
        assert!(session.advance(&matches));
        assert_eq!(session.step, FlowStep::Complete);

        let bets = session.into_bets(&matches).unwrap();
        assert_eq!(bets.len(), 9);
    }

    #[test]
    fn group_pick_change_clears_all_derived_picks() {
        let (_, matches) = fixture();
        let mut session = PickSession::new();
        for round in 1..=3 {
            pick_round(&mut session, &matches, round);
        }
        session.select(MatchRef::Pending(Slot::Semi1), "a1");
        session.select(MatchRef::Pending(Slot::Semi2), "b1");
        session.select(MatchRef::Pending(Slot::Final), "a1");

        // Rethinking one group match invalidates the whole derived bracket.
        session.select(MatchRef::Concrete("g1a".into()), "a2");
        assert!(session.pick_for(&MatchRef::Pending(Slot::Semi1)).is_none());
        assert!(session.pick_for(&MatchRef::Pending(Slot::Semi2)).is_none());
        assert!(session.pick_for(&MatchRef::Pending(Slot::Final)).is_none());
    }

    #[test]
    fn semi_pick_change_clears_only_the_final() {
        let mut session = PickSession::new();
        session.select(MatchRef::Pending(Slot::Semi1), "a1");
        session.select(MatchRef::Pending(Slot::Semi2), "b1");
        session.select(MatchRef::Pending(Slot::Final), "a1");

        session.select(MatchRef::Pending(Slot::Semi1), "b2");
        assert!(session.pick_for(&MatchRef::Pending(Slot::Final)).is_none());
        assert_eq!(
            session.pick_for(&MatchRef::Pending(Slot::Semi2)),
            Some("b1")
        );
    }

    #[test]
    fn into_bets_rejects_partial_sessions() {
        let (_, matches) = fixture();
        let mut session = PickSession::new();
        pick_round(&mut session, &matches, 1);
        let err = session.into_bets(&matches).unwrap_err();
        assert_eq!(err, EngineError::IncompleteTicket { missing: 7 });
    }

    #[test]
    fn step_matches_derives_placeholder_semis() {
        let (teams, matches) = fixture();
        let mut session = PickSession::new();
        for round in 1..=3 {
            pick_round(&mut session, &matches, round);
            session.advance(&matches);
        }
        let semis = session.step_matches(&teams, &matches);
        assert_eq!(semis.len(), 2);
        assert_eq!(semis[0].id, "derived_s1");
        // a1 swept group A, b1 swept group B: cross-pairing applies.
        assert_eq!(semis[0].team_a.as_ref().unwrap().id, "a1");
        assert_eq!(semis[0].team_b.as_ref().unwrap().id, "b2");
    }

    #[test]
    fn from_bets_resumes_at_the_first_incomplete_step() {
        let (_, matches) = fixture();
        let bets = vec![
            Bet {
                match_id: MatchRef::Concrete("g1a".into()),
                selected_team_id: "a1".into(),
            },
            Bet {
                match_id: MatchRef::Concrete("g1b".into()),
                selected_team_id: "b1".into(),
            },
        ];
        let session = PickSession::from_bets(&bets, &matches);
        assert_eq!(session.step, FlowStep::Group2);
    }
}
