use crate::engine::standings::{live_standings, qualifiers, LiveStanding};
use anyhow::{bail, Context};
use bolao_store::postgrest::NewMatchRow;
use bolao_store::{Match, MatchStatus, Phase, PoolStore};
use log::info;

const SEMI_KICKOFFS: [&str; 2] = ["14:00", "15:00"];
const FINAL_KICKOFF: &str = "17:00";

fn semi_row(kickoff: &str, team_a: &LiveStanding, team_b: &LiveStanding) -> NewMatchRow {
    NewMatchRow {
        phase: Phase::Semi.as_str().to_owned(),
        status: MatchStatus::Scheduled.as_str().to_owned(),
        start_time: kickoff.to_owned(),
        team_a_id: Some(team_a.team.id.clone()),
        team_b_id: Some(team_b.team.id.clone()),
        team_group: None,
        round: None,
    }
}

/// The two semifinal inserts implied by finished group tables: group A's
/// winner hosts group B's runner-up, then the mirror pairing.
pub fn semifinal_rows(
    standings_a: &[LiveStanding],
    standings_b: &[LiveStanding],
) -> anyhow::Result<[NewMatchRow; 2]> {
    let (a1, a2) = qualifiers(standings_a).context("group A needs at least two teams")?;
    let (b1, b2) = qualifiers(standings_b).context("group B needs at least two teams")?;
    Ok([
        semi_row(SEMI_KICKOFFS[0], a1, b2),
        semi_row(SEMI_KICKOFFS[1], b1, a2),
    ])
}

/// The final insert pairing the two semifinal winners.
pub fn final_row(semi1: &Match, semi2: &Match) -> anyhow::Result<NewMatchRow> {
    let w1 = semi1
        .winner()
        .with_context(|| format!("semifinal {} has no resolvable winner", semi1.id))?;
    let w2 = semi2
        .winner()
        .with_context(|| format!("semifinal {} has no resolvable winner", semi2.id))?;
    Ok(NewMatchRow {
        phase: Phase::Final.as_str().to_owned(),
        status: MatchStatus::Scheduled.as_str().to_owned(),
        start_time: FINAL_KICKOFF.to_owned(),
        team_a_id: Some(w1.id.clone()),
        team_b_id: Some(w2.id.clone()),
        team_group: None,
        round: None,
    })
}

/// Generate the real SEMI rows once every group match is finished. Gated so
/// an early or repeated click cannot produce a half-built bracket.
pub async fn generate_semifinals(store: &PoolStore) -> anyhow::Result<Vec<Match>> {
    let matches = store.matches().await?;
    let group: Vec<&Match> = matches
        .iter()
        .filter(|m| m.phase == Phase::Group)
        .collect();
    if group.is_empty() {
        bail!("no group matches to derive semifinals from");
    }
    if !group.iter().all(|m| m.is_finished()) {
        bail!("all group matches must be finished before generating semifinals");
    }
    if matches.iter().any(|m| m.phase == Phase::Semi) {
        bail!("semifinals already generated");
    }

    let teams = store.teams().await?;
    let standings_a = live_standings("A", &teams, &matches)?;
    let standings_b = live_standings("B", &teams, &matches)?;
    let rows = semifinal_rows(&standings_a, &standings_b)?;

    let inserted = store.insert_matches(&rows).await?;
    info!("generated {} semifinal matches", inserted.len());
    Ok(inserted)
}

/// Generate the real FINAL row once both semifinals are finished.
pub async fn generate_final(store: &PoolStore) -> anyhow::Result<Vec<Match>> {
    let matches = store.matches().await?;
    if matches.iter().any(|m| m.phase == Phase::Final) {
        bail!("final already generated");
    }
    let mut semis: Vec<&Match> = matches.iter().filter(|m| m.phase == Phase::Semi).collect();
    semis.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    let &[semi1, semi2] = semis.as_slice() else {
        bail!("expected exactly two semifinal matches");
    };
    if !semi1.is_finished() || !semi2.is_finished() {
        bail!("both semifinals must be finished before generating the final");
    }

    let row = final_row(semi1, semi2)?;
    let inserted = store.insert_matches(&[row]).await?;
    info!("generated the final");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolao_store::Team;

    fn standing(id: &str, group: &str, points: u32) -> LiveStanding {
        LiveStanding {
            team: Team {
                id: id.into(),
                name: id.to_uppercase(),
                logo_url: None,
                group: Some(group.into()),
            },
            points,
            goal_diff: 0,
            goals_for: 0,
        }
    }

    #[test]
    fn semifinal_rows_cross_pair_and_schedule_kickoffs() {
        let a = [standing("a1", "A", 9), standing("a2", "A", 6)];
        let b = [standing("b1", "B", 7), standing("b2", "B", 4)];
        let [s1, s2] = semifinal_rows(&a, &b).unwrap();

        assert_eq!(s1.team_a_id.as_deref(), Some("a1"));
        assert_eq!(s1.team_b_id.as_deref(), Some("b2"));
        assert_eq!(s1.start_time, "14:00");
        assert_eq!(s1.phase, "SEMI");

        assert_eq!(s2.team_a_id.as_deref(), Some("b1"));
        assert_eq!(s2.team_b_id.as_deref(), Some("a2"));
        assert_eq!(s2.start_time, "15:00");
    }

    #[test]
    fn semifinal_rows_require_two_qualifiers_per_group() {
        let a = [standing("a1", "A", 9)];
        let b = [standing("b1", "B", 7), standing("b2", "B", 4)];
        assert!(semifinal_rows(&a, &b).is_err());
    }

    fn finished_semi(id: &str, kickoff: &str, a: &str, b: &str, winner: &str) -> Match {
        Match {
            id: id.into(),
            phase: Phase::Semi,
            status: MatchStatus::Finished,
            start_time: kickoff.into(),
            team_a: Some(Team {
                id: a.into(),
                name: a.to_uppercase(),
                ..Default::default()
            }),
            team_b: Some(Team {
                id: b.into(),
                name: b.to_uppercase(),
                ..Default::default()
            }),
            winner_id: Some(winner.into()),
            ..Default::default()
        }
    }

    #[test]
    fn final_row_pairs_the_two_winners_at_five_pm() {
        let s1 = finished_semi("s1", "14:00", "a1", "b2", "a1");
        let s2 = finished_semi("s2", "15:00", "b1", "a2", "b1");
        let row = final_row(&s1, &s2).unwrap();
        assert_eq!(row.phase, "FINAL");
        assert_eq!(row.start_time, "17:00");
        assert_eq!(row.team_a_id.as_deref(), Some("a1"));
        assert_eq!(row.team_b_id.as_deref(), Some("b1"));
    }

    #[test]
    fn final_row_refuses_an_unresolved_semi() {
        let s1 = finished_semi("s1", "14:00", "a1", "b2", "a1");
        let mut s2 = finished_semi("s2", "15:00", "b1", "a2", "b1");
        s2.winner_id = Some("ghost".into());
        assert!(final_row(&s1, &s2).is_err());
    }
}
