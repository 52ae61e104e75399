use super::types::Fixture;
use crate::data::{MatchResult, ResultClient, TeamResultRequest};
use crate::domain::{ResultFilter, ResultType};
use crate::error::Error;
use std::sync::Arc;

/// Classifies a fixture against a single result filter: every match in the
/// team's recent window must satisfy the filter's result criteria.
pub struct ResultFilterClassifier {
    results: Arc<dyn ResultClient>,
}

impl ResultFilterClassifier {
    pub fn new(results: Arc<dyn ResultClient>) -> Self {
        Self { results }
    }

    pub async fn matches_filter(
        &self,
        fixture: &Fixture,
        filter: &ResultFilter,
    ) -> Result<bool, Error> {
        let team_id = fixture.team_id(filter.team);

        let req = TeamResultRequest {
            team_id,
            limit: filter.games,
            date_before: fixture.date,
            season_ids: vec![fixture.season_id],
            venue: filter.venue,
        };

        let results = self.results.by_team(&req).await?;

        for result in &results {
            if !meets_result_criteria(result, team_id, filter.result)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Final score of a completed match, erroring when the result service has no
/// settled stats for it.
pub(super) fn match_score(result: &MatchResult) -> Result<(u32, u32), Error> {
    let stats = result.stats.ok_or_else(|| {
        Error::ResultUnavailable(format!("unable to parse match stats for fixture {}", result.id))
    })?;

    let home = stats.home_score.ok_or_else(|| {
        Error::ResultUnavailable(format!(
            "unable to parse home team goals for fixture {}",
            result.id
        ))
    })?;

    let away = stats.away_score.ok_or_else(|| {
        Error::ResultUnavailable(format!(
            "unable to parse away team goals for fixture {}",
            result.id
        ))
    })?;

    Ok((home, away))
}

fn meets_result_criteria(
    result: &MatchResult,
    team_id: u64,
    criteria: ResultType,
) -> Result<bool, Error> {
    let (home, away) = match_score(result)?;

    let (team, opponent) = if result.home_team.id == team_id {
        (home, away)
    } else {
        (away, home)
    };

    let met = match criteria {
        ResultType::Win => team > opponent,
        ResultType::Lose => team < opponent,
        ResultType::Draw => team == opponent,
        ResultType::WinDraw => team >= opponent,
        ResultType::LoseDraw => team <= opponent,
        ResultType::WinLose => team != opponent,
    };

    Ok(met)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MatchScore, TeamSummary};

    fn result(home_id: u64, away_id: u64, home: u32, away: u32) -> MatchResult {
        MatchResult {
            id: 1,
            home_team: TeamSummary {
                id: home_id,
                name: "Home".to_string(),
            },
            away_team: TeamSummary {
                id: away_id,
                name: "Away".to_string(),
            },
            stats: Some(MatchScore {
                home_score: Some(home),
                away_score: Some(away),
            }),
            home_team_stats: None,
            away_team_stats: None,
        }
    }

    #[test]
    fn win_requires_a_strict_winning_score() {
        let res = result(1, 50, 4, 1);

        assert!(meets_result_criteria(&res, 1, ResultType::Win).unwrap());
        assert!(!meets_result_criteria(&res, 50, ResultType::Win).unwrap());

        let draw = result(1, 50, 2, 2);
        assert!(!meets_result_criteria(&draw, 1, ResultType::Win).unwrap());
    }

    #[test]
    fn win_applies_to_the_away_side_of_the_score() {
        let res = result(10, 1, 1, 4);

        assert!(meets_result_criteria(&res, 1, ResultType::Win).unwrap());
        assert!(meets_result_criteria(&res, 10, ResultType::Lose).unwrap());
    }

    #[test]
    fn lose_requires_a_strict_losing_score() {
        let res = result(1, 50, 0, 3);

        assert!(meets_result_criteria(&res, 1, ResultType::Lose).unwrap());
        assert!(!meets_result_criteria(&res, 50, ResultType::Lose).unwrap());
    }

    #[test]
    fn draw_matches_level_scores_only() {
        assert!(meets_result_criteria(&result(1, 50, 2, 2), 1, ResultType::Draw).unwrap());
        assert!(!meets_result_criteria(&result(1, 50, 2, 1), 1, ResultType::Draw).unwrap());
    }

    #[test]
    fn win_draw_excludes_losses_only() {
        assert!(meets_result_criteria(&result(1, 50, 2, 1), 1, ResultType::WinDraw).unwrap());
        assert!(meets_result_criteria(&result(1, 50, 1, 1), 1, ResultType::WinDraw).unwrap());
        assert!(!meets_result_criteria(&result(1, 50, 0, 1), 1, ResultType::WinDraw).unwrap());
    }

    #[test]
    fn lose_draw_excludes_wins_only() {
        assert!(meets_result_criteria(&result(1, 50, 1, 2), 1, ResultType::LoseDraw).unwrap());
        assert!(meets_result_criteria(&result(1, 50, 1, 1), 1, ResultType::LoseDraw).unwrap());
        assert!(!meets_result_criteria(&result(1, 50, 2, 1), 1, ResultType::LoseDraw).unwrap());
    }

    #[test]
    fn win_lose_excludes_draws_only() {
        assert!(meets_result_criteria(&result(1, 50, 2, 1), 1, ResultType::WinLose).unwrap());
        assert!(meets_result_criteria(&result(1, 50, 0, 1), 1, ResultType::WinLose).unwrap());
        assert!(!meets_result_criteria(&result(1, 50, 1, 1), 1, ResultType::WinLose).unwrap());
    }

    #[test]
    fn missing_score_is_a_result_unavailable_error() {
        let mut res = result(1, 50, 0, 0);
        res.stats = None;

        let err = meets_result_criteria(&res, 1, ResultType::Win).unwrap_err();
        assert!(matches!(err, Error::ResultUnavailable(_)));
    }
}
