use crate::engine::{EngineError, Picks};
use bolao_store::{Match, MatchRef, Phase, Team};

/// Hypothetical group table implied by one bettor's picks. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub team: Team,
    pub points: u32,
    pub wins: u32,
}

/// Real group table built from finished results. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStanding {
    pub team: Team,
    pub points: u32,
    pub goal_diff: i32,
    pub goals_for: u32,
}

fn group_teams<'a>(group: &str, teams: &'a [Team]) -> Result<Vec<&'a Team>, EngineError> {
    let selected: Vec<&Team> = teams
        .iter()
        .filter(|t| t.group.as_deref() == Some(group))
        .collect();
    if selected.is_empty() {
        return Err(EngineError::EmptyGroup(group.to_owned()));
    }
    Ok(selected)
}

fn group_matches<'a>(group: &str, matches: &'a [Match]) -> impl Iterator<Item = &'a Match> {
    let group = group.to_owned();
    matches
        .iter()
        .filter(move |m| m.phase == Phase::Group && m.group.as_deref() == Some(group.as_str()))
}

/// Table a bettor's picks would produce if every picked team won. Each pick
/// is worth 3 points and 1 win; matches without a pick contribute nothing.
pub fn simulated_standings(
    group: &str,
    teams: &[Team],
    matches: &[Match],
    picks: &Picks,
) -> Result<Vec<Standing>, EngineError> {
    let mut table: Vec<Standing> = group_teams(group, teams)?
        .into_iter()
        .map(|team| {
            let mut points = 0;
            let mut wins = 0;
            for m in group_matches(group, matches) {
                if !m.involves(&team.id) {
                    continue;
                }
                let picked = picks.get(&MatchRef::Concrete(m.id.clone()));
                if picked.map(String::as_str) == Some(team.id.as_str()) {
                    points += 3;
                    wins += 1;
                }
            }
            Standing { team: team.clone(), points, wins }
        })
        .collect();

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.team.name.cmp(&b.team.name))
    });
    Ok(table)
}

/// Table built from FINISHED results: 3 points for a win, 1 for a finished
/// match with no winner. Ordered by points, goal difference, goals scored,
/// then name so equal records still rank deterministically.
pub fn live_standings(
    group: &str,
    teams: &[Team],
    matches: &[Match],
) -> Result<Vec<LiveStanding>, EngineError> {
    let mut table: Vec<LiveStanding> = group_teams(group, teams)?
        .into_iter()
        .map(|team| {
            let mut points = 0u32;
            let mut scored = 0i32;
            let mut conceded = 0i32;
            for m in group_matches(group, matches) {
                if !m.is_finished() || !m.involves(&team.id) {
                    continue;
                }
                match m.winner_id.as_deref() {
                    Some(w) if w == team.id => points += 3,
                    Some(_) => {}
                    None => points += 1,
                }
                let is_team_a = m.team_a.as_ref().map(|t| t.id.as_str()) == Some(team.id.as_str());
                let (own, other) = if is_team_a {
                    (m.score_a, m.score_b)
                } else {
                    (m.score_b, m.score_a)
                };
                scored += i32::from(own.unwrap_or(0));
                conceded += i32::from(other.unwrap_or(0));
            }
            LiveStanding {
                team: team.clone(),
                points,
                goal_diff: scored - conceded,
                goals_for: scored.max(0) as u32,
            }
        })
        .collect();

    table.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.goal_diff.cmp(&a.goal_diff))
            .then_with(|| b.goals_for.cmp(&a.goals_for))
            .then_with(|| a.team.name.cmp(&b.team.name))
    });
    Ok(table)
}

/// The two teams advancing to the semifinals, once the table has them.
pub fn qualifiers(table: &[LiveStanding]) -> Option<(&LiveStanding, &LiveStanding)> {
    match (table.first(), table.get(1)) {
        (Some(first), Some(second)) => Some((first, second)),
        _ => None,
    }
}
