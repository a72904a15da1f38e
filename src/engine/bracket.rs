use crate::engine::standings::{simulated_standings, Standing};
use crate::engine::Picks;
use bolao_store::{Match, MatchRef, MatchStatus, Phase, Slot, Team};

const SEMI1_KICKOFF: &str = "14:00";
const SEMI2_KICKOFF: &str = "15:00";
const FINAL_KICKOFF: &str = "16:00";

/// How far a bettor's picks have carried them through the bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketProgress {
    GroupsIncomplete,
    GroupsComplete,
    SemisPaired,
    SemisPicked,
    FinalPaired,
    FinalPicked,
}

/// Pair the semifinals from two group tables. The pairing is fixed: the
/// winner of one group meets the runner-up of the other, never two teams
/// from the same group. A table with fewer than two rows leaves the
/// corresponding slots empty.
pub fn derive_semifinals(standings_a: &[Standing], standings_b: &[Standing]) -> [Match; 2] {
    let slot = |s: Option<&Standing>| s.map(|s| s.team.clone());
    let semi = |id: Slot, kickoff: &str, team_a, team_b| Match {
        id: id.wire_id().to_owned(),
        phase: Phase::Semi,
        status: MatchStatus::Scheduled,
        start_time: kickoff.to_owned(),
        team_a,
        team_b,
        ..Default::default()
    };
    [
        semi(
            Slot::Semi1,
            SEMI1_KICKOFF,
            slot(standings_a.first()),
            slot(standings_b.get(1)),
        ),
        semi(
            Slot::Semi2,
            SEMI2_KICKOFF,
            slot(standings_b.first()),
            slot(standings_a.get(1)),
        ),
    ]
}

/// Who advances from a semifinal. A real result on a match that has started
/// takes precedence over anything the bettor picked; otherwise the pick
/// decides. A pick naming a team that is in neither slot (stale after a
/// group-pick change) resolves to nothing.
pub fn semifinal_winner<'a>(semi: &'a Match, picks: &Picks) -> Option<&'a Team> {
    if semi.status != MatchStatus::Scheduled
        && let Some(winner) = semi.winner()
    {
        return Some(winner);
    }
    let key: MatchRef = semi.id.parse().ok()?;
    let picked = picks.get(&key)?;
    if semi.team_a.as_ref().is_some_and(|t| t.id == *picked) {
        semi.team_a.as_ref()
    } else if semi.team_b.as_ref().is_some_and(|t| t.id == *picked) {
        semi.team_b.as_ref()
    } else {
        None
    }
}

/// Pair the final from the two semifinals and the bettor's semi picks.
/// Unresolvable semis leave their finalist slot empty.
pub fn derive_final(semi1: &Match, semi2: &Match, picks: &Picks) -> Match {
    Match {
        id: Slot::Final.wire_id().to_owned(),
        phase: Phase::Final,
        status: MatchStatus::Scheduled,
        start_time: FINAL_KICKOFF.to_owned(),
        team_a: semifinal_winner(semi1, picks).cloned(),
        team_b: semifinal_winner(semi2, picks).cloned(),
        ..Default::default()
    }
}

/// Where a set of picks stands in the bracket, derived from scratch each
/// time — progress is never stored.
pub fn bracket_progress(teams: &[Team], matches: &[Match], picks: &Picks) -> BracketProgress {
    let group_matches: Vec<&Match> = matches
        .iter()
        .filter(|m| m.phase == Phase::Group)
        .collect();
    let groups_done = !group_matches.is_empty()
        && group_matches
            .iter()
            .all(|m| picks.contains_key(&MatchRef::Concrete(m.id.clone())));
    if !groups_done {
        return BracketProgress::GroupsIncomplete;
    }

    let (Ok(standings_a), Ok(standings_b)) = (
        simulated_standings("A", teams, matches, picks),
        simulated_standings("B", teams, matches, picks),
    ) else {
        return BracketProgress::GroupsComplete;
    };
    if standings_a.len() < 2 || standings_b.len() < 2 {
        return BracketProgress::GroupsComplete;
    }
    let [semi1, semi2] = derive_semifinals(&standings_a, &standings_b);

    let semis_picked = picks.contains_key(&MatchRef::Pending(Slot::Semi1))
        && picks.contains_key(&MatchRef::Pending(Slot::Semi2));
    if !semis_picked {
        return BracketProgress::SemisPaired;
    }

    let final_match = derive_final(&semi1, &semi2, picks);
    if final_match.team_a.is_none() || final_match.team_b.is_none() {
        return BracketProgress::SemisPicked;
    }

    match picks.get(&MatchRef::Pending(Slot::Final)) {
        Some(team_id) if final_match.involves(team_id) => BracketProgress::FinalPicked,
        _ => BracketProgress::FinalPaired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str, name: &str, group: &str) -> Team {
        Team {
            id: id.into(),
            name: name.into(),
            logo_url: None,
            group: Some(group.into()),
        }
    }

    fn standing(team: Team, points: u32) -> Standing {
        Standing { team, points, wins: points / 3 }
    }

    fn table(group: &str, first: &str, second: &str) -> Vec<Standing> {
        vec![
            standing(team(first, first, group), 9),
            standing(team(second, second, group), 6),
        ]
    }

    #[test]
    fn semifinals_cross_group_winners_and_runners_up() {
        let a = table("A", "a1", "a2");
        let b = table("B", "b1", "b2");
        let [s1, s2] = derive_semifinals(&a, &b);

        assert_eq!(s1.id, "derived_s1");
        assert_eq!(s1.team_a.as_ref().unwrap().id, "a1");
        assert_eq!(s1.team_b.as_ref().unwrap().id, "b2");
        assert_eq!(s1.start_time, "14:00");

        assert_eq!(s2.id, "derived_s2");
        assert_eq!(s2.team_a.as_ref().unwrap().id, "b1");
        assert_eq!(s2.team_b.as_ref().unwrap().id, "a2");
        assert_eq!(s2.start_time, "15:00");

        // No semifinal pairs two teams from the same group.
        for semi in [&s1, &s2] {
            let ga = semi.team_a.as_ref().unwrap().group.clone();
            let gb = semi.team_b.as_ref().unwrap().group.clone();
            assert_ne!(ga, gb);
        }
    }

    #[test]
    fn short_standings_leave_slots_empty() {
        let a = vec![standing(team("a1", "a1", "A"), 9)];
        let [s1, s2] = derive_semifinals(&a, &[]);
        assert_eq!(s1.team_a.as_ref().unwrap().id, "a1");
        assert!(s1.team_b.is_none());
        // Group B is empty and group A has no runner-up: both slots stay open.
        assert!(s2.team_a.is_none());
        assert!(s2.team_b.is_none());
    }

    #[test]
    fn semifinal_winner_follows_the_pick() {
        let [s1, _] = derive_semifinals(&table("A", "a1", "a2"), &table("B", "b1", "b2"));
        let picks: Picks = [(MatchRef::Pending(Slot::Semi1), "b2".to_owned())]
            .into_iter()
            .collect();
        assert_eq!(semifinal_winner(&s1, &picks).unwrap().id, "b2");
    }

    #[test]
    fn stale_semi_pick_resolves_to_nothing() {
        // The pick references a team no longer in this semifinal.
        let [s1, s2] = derive_semifinals(&table("A", "a1", "a2"), &table("B", "b1", "b2"));
        let picks: Picks = [(MatchRef::Pending(Slot::Semi1), "ghost".to_owned())]
            .into_iter()
            .collect();
        assert!(semifinal_winner(&s1, &picks).is_none());

        let final_match = derive_final(&s1, &s2, &picks);
        assert!(final_match.team_a.is_none());
    }

    #[test]
    fn real_result_beats_simulated_pick() {
        let [mut s1, _] = derive_semifinals(&table("A", "a1", "a2"), &table("B", "b1", "b2"));
        s1.status = MatchStatus::Finished;
        s1.winner_id = Some("a1".into());
        let picks: Picks = [(MatchRef::Pending(Slot::Semi1), "b2".to_owned())]
            .into_iter()
            .collect();
        assert_eq!(semifinal_winner(&s1, &picks).unwrap().id, "a1");
    }

    #[test]
    fn scheduled_match_ignores_its_winner_id() {
        // A winner id on a SCHEDULED row is admin noise; the pick still rules.
        let [mut s1, _] = derive_semifinals(&table("A", "a1", "a2"), &table("B", "b1", "b2"));
        s1.winner_id = Some("a1".into());
        let picks: Picks = [(MatchRef::Pending(Slot::Semi1), "b2".to_owned())]
            .into_iter()
            .collect();
        assert_eq!(semifinal_winner(&s1, &picks).unwrap().id, "b2");
    }

    #[test]
    fn derive_final_pairs_both_semi_winners() {
        let [s1, s2] = derive_semifinals(&table("A", "a1", "a2"), &table("B", "b1", "b2"));
        let picks: Picks = [
            (MatchRef::Pending(Slot::Semi1), "a1".to_owned()),
            (MatchRef::Pending(Slot::Semi2), "b1".to_owned()),
        ]
        .into_iter()
        .collect();
        let f = derive_final(&s1, &s2, &picks);
        assert_eq!(f.id, "derived_f1");
        assert_eq!(f.start_time, "16:00");
        assert_eq!(f.team_a.as_ref().unwrap().id, "a1");
        assert_eq!(f.team_b.as_ref().unwrap().id, "b1");
    }

    // -----------------------------------------------------------------------
    // Progress machine
    // -----------------------------------------------------------------------

    fn group_match(id: &str, group: &str, a: &Team, b: &Team) -> Match {
        Match {
            id: id.into(),
            phase: Phase::Group,
            group: Some(group.into()),
            round: Some(1),
            team_a: Some(a.clone()),
            team_b: Some(b.clone()),
            ..Default::default()
        }
    }

    fn fixture() -> (Vec<Team>, Vec<Match>) {
        let a1 = team("a1", "Alfa", "A");
        let a2 = team("a2", "Beta", "A");
        let b1 = team("b1", "Gama", "B");
        let b2 = team("b2", "Delta", "B");
        let matches = vec![
            group_match("m1", "A", &a1, &a2),
            group_match("m2", "B", &b1, &b2),
        ];
        (vec![a1, a2, b1, b2], matches)
    }

    #[test]
    fn progress_walks_the_whole_machine() {
        let (teams, matches) = fixture();
        let mut picks = Picks::new();
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::GroupsIncomplete
        );

        picks.insert(MatchRef::Concrete("m1".into()), "a1".into());
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::GroupsIncomplete
        );

        picks.insert(MatchRef::Concrete("m2".into()), "b1".into());
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::SemisPaired
        );

        picks.insert(MatchRef::Pending(Slot::Semi1), "a1".into());
        picks.insert(MatchRef::Pending(Slot::Semi2), "b1".into());
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::FinalPaired
        );

        picks.insert(MatchRef::Pending(Slot::Final), "a1".into());
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::FinalPicked
        );
    }

    #[test]
    fn progress_stalls_at_semis_picked_on_a_stale_pick() {
        let (teams, matches) = fixture();
        let picks: Picks = [
            (MatchRef::Concrete("m1".into()), "a1".to_owned()),
            (MatchRef::Concrete("m2".into()), "b1".to_owned()),
            (MatchRef::Pending(Slot::Semi1), "ghost".to_owned()),
            (MatchRef::Pending(Slot::Semi2), "b1".to_owned()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::SemisPicked
        );
    }

    #[test]
    fn stale_final_pick_does_not_count_as_picked() {
        let (teams, matches) = fixture();
        let picks: Picks = [
            (MatchRef::Concrete("m1".into()), "a1".to_owned()),
            (MatchRef::Concrete("m2".into()), "b1".to_owned()),
            (MatchRef::Pending(Slot::Semi1), "a1".to_owned()),
            (MatchRef::Pending(Slot::Semi2), "b1".to_owned()),
            (MatchRef::Pending(Slot::Final), "a2".to_owned()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            bracket_progress(&teams, &matches, &picks),
            BracketProgress::FinalPaired
        );
    }
}
